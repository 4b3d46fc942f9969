//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := '-' unary | '+' unary | postfix
//! postfix := primary UNIT?
//! primary := NUMBER | '(' sum ')'
//! ```
//!
//! Operators of equal precedence associate left to right.

use super::lexer::{tokenize, Op, Token};
use super::units::UnitResolver;
use crate::error::{JumperError, Result};

/// A parsed layout expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare number.
    Number(f64),
    /// A number or group carrying a unit, e.g. `50%` or `(10 + 5)%`.
    WithUnit {
        /// The value the unit applies to.
        value: Box<Self>,
        /// The unit token.
        unit: String,
    },
    /// Unary minus.
    Neg(Box<Self>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: Op,
        /// Left operand.
        lhs: Box<Self>,
        /// Right operand.
        rhs: Box<Self>,
    },
}

impl Expr {
    /// Evaluate the tree, resolving units through `units`.
    ///
    /// `source` is only used for error messages.
    pub fn eval(&self, units: &UnitResolver<'_>, source: &str) -> Result<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::WithUnit { value, unit } => {
                let value = value.eval(units, source)?;
                units.resolve(value, unit, source)
            }
            Self::Neg(inner) => Ok(-inner.eval(units, source)?),
            Self::Binary { op, lhs, rhs } => {
                Ok(op.apply(lhs.eval(units, source)?, rhs.eval(units, source)?))
            }
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, reason: impl Into<String>) -> JumperError {
        JumperError::expression(self.source, reason)
    }

    fn binary(&mut self, precedence: u8) -> Result<Expr> {
        let mut lhs = if precedence == 1 {
            self.binary(2)?
        } else {
            self.unary()?
        };

        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if op.precedence() != precedence {
                break;
            }
            self.pos += 1;
            let rhs = if precedence == 1 {
                self.binary(2)?
            } else {
                self.unary()?
            };
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Op(Op::Sub)) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Op(Op::Add)) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr> {
        let value = self.primary()?;
        if let Some(Token::Unit(unit)) = self.peek() {
            let unit = unit.clone();
            self.pos += 1;
            return Ok(Expr::WithUnit {
                value: Box::new(value),
                unit,
            });
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.binary(1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("could not find matching parenthesis")),
                }
            }
            Some(Token::RParen) => Err(self.error("could not find matching parenthesis")),
            Some(token) => Err(self.error(format!("unexpected token {token:?}"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// Parse `source` into an expression tree.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };

    let expr = parser.binary(1)?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::RParen) => Err(parser.error("could not find matching parenthesis")),
        Some(token) => {
            let reason = format!("unexpected trailing token {token:?}");
            Err(parser.error(reason))
        }
    }
}
