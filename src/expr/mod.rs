//! Expression module: arithmetic over numbers with units.
//!
//! Expressions like `"50% - 2"` or `"(100% - {sidebar}) / 2"` describe
//! division geometry. Evaluation happens in two stages owned by different
//! layers:
//!
//! 1. The division substitutes `{id}` references with numbers
//!    ([`substitute_references`]).
//! 2. The evaluator parses the flat arithmetic ([`parse`]) and folds it,
//!    resolving units through a [`UnitResolver`].
//!
//! `*` and `/` bind tighter than `+` and `-`; equal precedence folds left to
//! right; parentheses group and may carry a unit (`(24 / 2)%`).

mod lexer;
mod parser;
mod reference;
mod units;

pub use lexer::Op;
pub use parser::{parse, Expr};
pub use reference::{references, substitute_references, Reference};
pub use units::{UnitMap, UnitResolver};

use crate::error::Result;

/// Parse and evaluate `expr` in one step.
pub fn evaluate(expr: &str, units: &UnitResolver<'_>) -> Result<f64> {
    parse(expr)?.eval(units, expr)
}
