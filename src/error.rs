//! Error type shared by every layer of the engine.
//!
//! All errors are programmer errors (bad configuration or bad API usage)
//! and propagate to the caller. Only terminal I/O can fail transiently.

use thiserror::Error;

/// Errors raised by the layout engine.
#[derive(Debug, Error)]
pub enum JumperError {
    /// A division spec is incomplete or contradictory.
    #[error("invalid configuration for division \"{id}\": {reason}")]
    Configuration {
        /// Id of the offending division (empty if the id itself is missing).
        id: String,
        /// What is wrong with the spec.
        reason: String,
    },

    /// A division id that is not registered with the engine.
    #[error("unrecognized division \"{0}\"")]
    UnknownDivision(String),

    /// A block id that does not exist in the given division.
    #[error("could not find block \"{block}\" in division \"{division}\"")]
    UnknownBlock {
        /// Division that was searched.
        division: String,
        /// Missing block id (or index).
        block: String,
    },

    /// A malformed arithmetic or bracket expression.
    #[error("invalid expression \"{expr}\": {reason}")]
    InvalidExpression {
        /// The original expression string.
        expr: String,
        /// What the parser tripped on.
        reason: String,
    },

    /// A unit with no handler in the supplied resolver.
    #[error("do not know how to calculate unit \"{unit}\" in expression \"{expr}\"")]
    UnresolvedUnit {
        /// The unit token, e.g. `%` or `vh`.
        unit: String,
        /// The expression the unit appeared in.
        expr: String,
    },

    /// Divisions whose positions reference each other in a loop.
    #[error("cyclic division reference: {}", chain.join(" -> "))]
    CyclicReference {
        /// Division ids forming the cycle, first id repeated at the end.
        chain: Vec<String>,
    },

    /// Row or column addressing outside the current extent.
    #[error("index {index} is out of range for length {len}")]
    OutOfRange {
        /// The requested (possibly negative) index.
        index: isize,
        /// The number of addressable rows or columns.
        len: usize,
    },

    /// A geometry accessor was called before the division was recomputed.
    #[error("geometry of division \"{0}\" has not been computed")]
    NotComputed(String),

    /// Writing to or querying the terminal failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JumperError {
    /// Shorthand for a configuration error.
    pub fn config(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an invalid expression error.
    pub fn expression(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expr: expr.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JumperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = JumperError::expression("(1 + 2", "could not find matching parenthesis");
        assert!(err.to_string().contains("(1 + 2"));

        let err = JumperError::CyclicReference {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic division reference: a -> b -> a");
    }

    #[test]
    fn test_io_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: JumperError = io.into();
        assert!(matches!(err, JumperError::Io(_)));
    }
}
