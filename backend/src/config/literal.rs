//! Python literal parser for positional arguments.
//!
//! Callers of the positional protocol pass structured options as Python
//! literals (`{'precio': 'sum'}`, `['a', 'b']`, `{'x', 'y'}`, `None`). This
//! module reads that syntax into `serde_json::Value` so the rest of the
//! configuration layer only deals with JSON.
//!
//! ```text
//! value  --> dict | set | list | tuple | STRING | NUMBER | True | False | None
//! dict   --> "{" (value ":" value ("," value ":" value)* ","?)? "}"
//! set    --> "{" value ("," value)* ","? "}"
//! list   --> "[" (value ("," value)* ","?)? "]"
//! tuple  --> "(" (value ("," value)* ","?)? ")"
//! ```
//!
//! Sets and tuples become JSON arrays. Dict keys must be strings or numbers;
//! numbers are stored under their textual form. JSON spellings
//! (`true`, `false`, `null`) are accepted as well.

use std::iter::Peekable;
use std::str::Chars;

use serde_json::{Map, Number, Value};

use crate::error::{ConfigError, ConfigResult};

/// Parse one literal, naming `option` in any error.
pub fn parse_literal(option: &str, text: &str) -> ConfigResult<Value> {
    let mut parser = LiteralParser::new(text);
    let value = parser
        .parse_value()
        .and_then(|v| parser.finish().map(|_| v))
        .map_err(|message| ConfigError::InvalidLiteral {
            option: option.to_string(),
            message,
        })?;
    Ok(value)
}

struct LiteralParser<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            input: text.chars().peekable(),
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

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.input.peek().copied()
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.input.next();
                Ok(())
            }
            Some(ch) => Err(format!("expected '{}', found '{}'", expected, ch)),
            None => Err(format!("expected '{}', found end of input", expected)),
        }
    }

    fn finish(&mut self) -> Result<(), String> {
        match self.peek() {
            None => Ok(()),
            Some(ch) => Err(format!("unexpected '{}' after value", ch)),
        }
    }

    fn parse_value(&mut self) -> Result<Value, String> {
        match self.peek() {
            Some('{') => self.parse_braced(),
            Some('[') => {
                self.input.next();
                self.parse_sequence(']').map(Value::Array)
            }
            Some('(') => {
                self.input.next();
                self.parse_sequence(')').map(Value::Array)
            }
            Some(q @ ('\'' | '"')) => {
                self.input.next();
                self.read_string(q).map(Value::String)
            }
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '+' || ch == '.' => {
                self.read_number()
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_keyword(),
            Some(ch) => Err(format!("unexpected '{}'", ch)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    /// Dict or set; `{}` is an empty dict as in Python.
    fn parse_braced(&mut self) -> Result<Value, String> {
        self.expect('{')?;
        if self.peek() == Some('}') {
            self.input.next();
            return Ok(Value::Object(Map::new()));
        }

        let first = self.parse_value()?;
        if self.peek() == Some(':') {
            self.input.next();
            let mut map = Map::new();
            let value = self.parse_value()?;
            map.insert(key_text(first)?, value);
            loop {
                match self.peek() {
                    Some(',') => {
                        self.input.next();
                        if self.peek() == Some('}') {
                            self.input.next();
                            return Ok(Value::Object(map));
                        }
                        let key = self.parse_value()?;
                        self.expect(':')?;
                        let value = self.parse_value()?;
                        map.insert(key_text(key)?, value);
                    }
                    _ => {
                        self.expect('}')?;
                        return Ok(Value::Object(map));
                    }
                }
            }
        }

        let mut items = vec![first];
        loop {
            match self.peek() {
                Some(',') => {
                    self.input.next();
                    if self.peek() == Some('}') {
                        break;
                    }
                    let item = self.parse_value()?;
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                _ => break,
            }
        }
        self.expect('}')?;
        Ok(Value::Array(items))
    }

    fn parse_sequence(&mut self, close: char) -> Result<Vec<Value>, String> {
        let mut items = Vec::new();
        if self.peek() == Some(close) {
            self.input.next();
            return Ok(items);
        }
        loop {
            items.push(self.parse_value()?);
            match self.peek() {
                Some(',') => {
                    self.input.next();
                    if self.peek() == Some(close) {
                        self.input.next();
                        return Ok(items);
                    }
                }
                _ => {
                    self.expect(close)?;
                    return Ok(items);
                }
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, String> {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            match ch {
                c if c == quote => return Ok(result),
                '\\' => match self.input.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some('0') => result.push('\0'),
                    Some(other) => result.push(other),
                    None => break,
                },
                c => result.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    fn read_number(&mut self) -> Result<Value, String> {
        let mut text = String::new();
        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '+' | '_') {
                text.push(ch);
                self.input.next();
            } else {
                break;
            }
        }
        let cleaned = text.replace('_', "");
        if let Ok(i) = cleaned.parse::<i64>() {
            return Ok(Value::from(i));
        }
        match cleaned.parse::<f64>() {
            Ok(f) if f.is_finite() => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| format!("invalid number '{}'", text)),
            _ => Err(format!("invalid number '{}'", text)),
        }
    }

    fn read_keyword(&mut self) -> Result<Value, String> {
        let mut word = String::new();
        while let Some(&ch) = self.input.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.input.next();
            } else {
                break;
            }
        }
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => Err(format!("unknown name '{}'", word)),
        }
    }
}

fn key_text(key: Value) -> Result<String, String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if b { "True".into() } else { "False".into() }),
        other => Err(format!("unsupported dict key {}", other)),
    }
}
