//! Tokenizer for layout expressions.

use crate::error::{JumperError, Result};

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl Op {
    /// Binding power; higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }

    /// Apply the operator.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        }
    }
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal.
    Number(f64),
    /// Unit suffix attached to the preceding number or group, e.g. `%`.
    Unit(String),
    /// Arithmetic operator.
    Op(Op),
    /// `(`
    LParen,
    /// `)`
    RParen,
}

fn is_unit_char(c: char) -> bool {
    c == '%' || c.is_ascii_alphabetic() || c == '_'
}

/// Split `source` into tokens.
///
/// Units are only legal directly after a number or a closing parenthesis.
/// Anything else alphabetic (a function name, a leftover `{id}`) is
/// rejected.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| {
                    JumperError::expression(source, format!("malformed number \"{literal}\""))
                })?;
                tokens.push(Token::Number(value));
            }
            c if is_unit_char(c) => {
                let start = i;
                while i < chars.len() && is_unit_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let attached = start > 0
                    && matches!(tokens.last(), Some(Token::Number(_) | Token::RParen))
                    && !chars[start - 1].is_whitespace();
                if !attached {
                    let reason = if chars.get(i) == Some(&'(') {
                        format!("function \"{word}\" is not supported")
                    } else {
                        format!("unexpected identifier \"{word}\"")
                    };
                    return Err(JumperError::expression(source, reason));
                }
                tokens.push(Token::Unit(word));
            }
            '+' => {
                tokens.push(Token::Op(Op::Add));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Op(Op::Sub));
                i += 1;
            }
            '*' => {
                tokens.push(Token::Op(Op::Mul));
                i += 1;
            }
            '/' => {
                tokens.push(Token::Op(Op::Div));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '{' | '}' => {
                return Err(JumperError::expression(
                    source,
                    "division reference was not substituted before evaluation",
                ));
            }
            other => {
                return Err(JumperError::expression(
                    source,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    Ok(tokens)
}
