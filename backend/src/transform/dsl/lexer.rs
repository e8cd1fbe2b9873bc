//! Tokenizer for derived-column expressions.
//!
//! Supported tokens:
//! - Operators: `+ - * /` and parentheses
//! - Numbers: `12` (integer), `1.5`, `.5`, `2e3` (float)
//! - Strings: `'text'` or `"text"` with backslash escapes
//! - Identifiers: Unicode letters, digits and `_`, not starting with a digit
//! - Quoted identifiers: `` `unit price` `` for column names with spaces

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Eof,
    /// Unterminated literal or malformed number.
    Invalid(String),
    Illegal(char),
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Star,
            Some('/') => Token::Slash,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some(q @ ('\'' | '"')) => self.read_string(q),
            Some('`') => self.read_backtick(),
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch),
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_identifier(ch),
            None => Token::Eof,
            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    fn read_string(&mut self, quote: char) -> Token {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            match ch {
                c if c == quote => return Token::Str(result),
                '\\' => match self.input.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some(other) => result.push(other),
                    None => break,
                },
                c => result.push(c),
            }
        }
        Token::Invalid(format!("unterminated string {}{}", quote, result))
    }

    fn read_backtick(&mut self) -> Token {
        let mut result = String::new();
        for ch in self.input.by_ref() {
            if ch == '`' {
                return Token::Ident(result);
            }
            result.push(ch);
        }
        Token::Invalid(format!("unterminated identifier `{}", result))
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut text = String::from(first);
        let mut is_float = first == '.';

        while let Some(&ch) = self.input.peek() {
            match ch {
                '0'..='9' => text.push(ch),
                '.' if !is_float => {
                    is_float = true;
                    text.push(ch);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(ch);
                    self.input.next();
                    if let Some(&sign @ ('+' | '-')) = self.input.peek() {
                        text.push(sign);
                    } else {
                        continue;
                    }
                }
                _ => break,
            }
            self.input.next();
        }

        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Token::Int(i);
            }
        }
        match text.parse::<f64>() {
            Ok(f) => Token::Float(f),
            Err(_) => Token::Invalid(format!("malformed number '{}'", text)),
        }
    }

    fn read_identifier(&mut self, first: char) -> Token {
        let mut ident = String::from(first);
        while let Some(&ch) = self.input.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.input.next();
            } else {
                break;
            }
        }
        Token::Ident(ident)
    }
}
