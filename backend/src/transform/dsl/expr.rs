//! Derived-column expressions: parser and evaluator.
//!
//! ```text
//! expr    --> term (("+" | "-") term)*
//! term    --> unary (("*" | "/") unary)*
//! unary   --> "-" unary | primary
//! primary --> NUMBER | STRING | IDENT | "(" expr ")"
//! ```
//!
//! An expression is parsed once into an [`Expr`] tree and then evaluated
//! against each row through a [`RowContext`].

use std::fmt;

use super::lexer::{Lexer, Token};
use crate::error::{TransformError, TransformResult};
use crate::models::{RowContext, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Scalar),
    Field(String),
    Negate(Box<Expr>),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Parse expression text.
    pub fn parse(text: &str) -> TransformResult<Expr> {
        let mut parser = Parser::new(text);
        parser.parse().map_err(|message| TransformError::InvalidExpression {
            expression: text.to_string(),
            message,
        })
    }

    /// Column names referenced by this expression, in first-use order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Field(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Negate(inner) => inner.collect_fields(out),
            Expr::Binary { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }

    /// Evaluate against one row.
    pub fn eval(&self, row: &impl RowContext) -> TransformResult<Scalar> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Field(name) => row
                .field(name)
                .cloned()
                .ok_or_else(|| TransformError::UnknownField(name.clone())),
            Expr::Negate(inner) => negate(inner.eval(row)?),
            Expr::Binary { left, op, right } => {
                let l = left.eval(row)?;
                let r = right.eval(row)?;
                apply(*op, l, r)
            }
        }
    }
}

/// Parse and evaluate `expression` against a single row context.
pub fn evaluate(expression: &str, row: &impl RowContext) -> TransformResult<Scalar> {
    Expr::parse(expression)?.eval(row)
}

fn negate(value: Scalar) -> TransformResult<Scalar> {
    match value {
        Scalar::Null => Ok(Scalar::Null),
        Scalar::Int(i) => Ok(i
            .checked_neg()
            .map(Scalar::Int)
            .unwrap_or_else(|| Scalar::float(-(i as f64)))),
        Scalar::Float(f) => Ok(Scalar::float(-f)),
        other => Err(TransformError::type_mismatch("-", other.kind(), other.kind())),
    }
}

fn apply(op: BinaryOp, left: Scalar, right: Scalar) -> TransformResult<Scalar> {
    if left.is_null() || right.is_null() {
        return Ok(Scalar::Null);
    }

    match (op, &left, &right) {
        (BinaryOp::Add, Scalar::Text(a), Scalar::Text(b)) => Ok(Scalar::Text(format!("{}{}", a, b))),
        (BinaryOp::Div, l, r) if l.is_numeric() && r.is_numeric() => {
            let (a, b) = (to_f64(l), to_f64(r));
            if b == 0.0 {
                Ok(Scalar::Null)
            } else {
                Ok(Scalar::float(a / b))
            }
        }
        (_, Scalar::Int(a), Scalar::Int(b)) => {
            let exact = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                BinaryOp::Div => None,
            };
            Ok(exact
                .map(Scalar::Int)
                .unwrap_or_else(|| float_op(op, *a as f64, *b as f64)))
        }
        (_, l, r) if l.is_numeric() && r.is_numeric() => Ok(float_op(op, to_f64(l), to_f64(r))),
        _ => Err(TransformError::type_mismatch(
            op.to_string(),
            left.kind(),
            right.kind(),
        )),
    }
}

fn to_f64(value: &Scalar) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Scalar {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
    };
    Scalar::float(result)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser { lexer, current }
    }

    fn parse(&mut self) -> Result<Expr, String> {
        if self.current == Token::Eof {
            return Err("empty expression".to_string());
        }
        let expr = self.parse_additive()?;
        if self.current != Token::Eof {
            return Err(format!("unexpected {:?} after expression", self.current));
        }
        Ok(expr)
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.current == Token::Minus {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let token = std::mem::replace(&mut self.current, Token::Eof);
        self.advance();
        match token {
            Token::Int(i) => Ok(Expr::Literal(Scalar::Int(i))),
            Token::Float(f) => Ok(Expr::Literal(Scalar::float(f))),
            Token::Str(s) => Ok(Expr::Literal(Scalar::Text(s))),
            Token::Ident(name) => Ok(Expr::Field(name)),
            Token::LParen => {
                let inner = self.parse_additive()?;
                if self.current != Token::RParen {
                    return Err(format!("expected ')', found {:?}", self.current));
                }
                self.advance();
                Ok(inner)
            }
            Token::Eof => Err("unexpected end of expression".to_string()),
            Token::Invalid(message) => Err(message),
            Token::Illegal(ch) => Err(format!("illegal character '{}'", ch)),
            other => Err(format!("unexpected {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScalarKind;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, Scalar)]) -> HashMap<String, Scalar> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_precedence_and_parentheses() {
        let ctx = row(&[("a", Scalar::Int(2)), ("b", Scalar::Int(3))]);
        assert_eq!(evaluate("a + b * 2", &ctx).unwrap(), Scalar::Int(8));
        assert_eq!(evaluate("(a + b) * 2", &ctx).unwrap(), Scalar::Int(10));
        assert_eq!(evaluate("a - b - 1", &ctx).unwrap(), Scalar::Int(-2));
        assert_eq!(evaluate("-a * b", &ctx).unwrap(), Scalar::Int(-6));
    }

    #[test]
    fn test_numeric_kinds() {
        let ctx = row(&[("qty", Scalar::Int(2)), ("price", Scalar::Float(1.5))]);
        assert_eq!(evaluate("qty * price", &ctx).unwrap(), Scalar::Float(3.0));
        assert_eq!(evaluate("qty / 4", &ctx).unwrap(), Scalar::Float(0.5));
        assert_eq!(
            evaluate("9223372036854775807 + 1", &ctx).unwrap(),
            Scalar::Float(9223372036854775808.0)
        );
    }

    #[test]
    fn test_division_by_zero_is_null() {
        let ctx = row(&[("a", Scalar::Int(1)), ("z", Scalar::Float(0.0))]);
        assert_eq!(evaluate("a / z", &ctx).unwrap(), Scalar::Null);
        assert_eq!(evaluate("a / 0 + 1", &ctx).unwrap(), Scalar::Null);
    }

    #[test]
    fn test_null_propagates() {
        let ctx = row(&[("a", Scalar::Null), ("b", Scalar::Int(1))]);
        assert_eq!(evaluate("a + b", &ctx).unwrap(), Scalar::Null);
        assert_eq!(evaluate("-a", &ctx).unwrap(), Scalar::Null);
    }

    #[test]
    fn test_text_rules() {
        let ctx = row(&[("first", Scalar::from("REMERA")), ("last", Scalar::from(" JUAN"))]);
        assert_eq!(evaluate("first + last", &ctx).unwrap(), Scalar::from("REMERA JUAN"));
        assert_eq!(evaluate("first + '!'", &ctx).unwrap(), Scalar::from("REMERA!"));

        let err = evaluate("first * last", &ctx).unwrap_err();
        assert_eq!(err, TransformError::type_mismatch("*", ScalarKind::Text, ScalarKind::Text));

        let err = evaluate("first + 1", &ctx).unwrap_err();
        assert!(matches!(err, TransformError::TypeMismatch { .. }));
    }

    #[test]
    fn test_unknown_field() {
        let ctx = row(&[("a", Scalar::Int(1))]);
        assert_eq!(
            evaluate("a + missing", &ctx).unwrap_err(),
            TransformError::UnknownField("missing".into())
        );
    }

    #[test]
    fn test_fields_in_first_use_order() {
        let expr = Expr::parse("b * (a + b) / `unit price`").unwrap();
        assert_eq!(expr.fields(), vec!["b", "a", "unit price"]);
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "a +", "(a + b", "a b", "a % b", "'open"] {
            let err = Expr::parse(bad).unwrap_err();
            assert!(matches!(err, TransformError::InvalidExpression { .. }), "{}", bad);
        }
    }
}
