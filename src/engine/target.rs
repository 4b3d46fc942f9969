//! Addressing a division or one of its blocks by path.

use crate::error::{JumperError, Result};
use std::fmt;

/// A parsed `"<division>"` or `"<division>.<block>"` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    /// Division id.
    pub division: &'a str,
    /// Block id, if the path names one.
    pub block: Option<&'a str>,
}

impl<'a> Target<'a> {
    /// Split a path at its first `.`.
    pub fn parse(path: &'a str) -> Result<Self> {
        let (division, block) = match path.split_once('.') {
            Some((division, block)) => (division, Some(block)),
            None => (path, None),
        };

        if division.is_empty() {
            return Err(JumperError::UnknownDivision(path.to_string()));
        }
        if block == Some("") {
            return Err(JumperError::UnknownBlock {
                division: division.to_string(),
                block: String::new(),
            });
        }

        Ok(Self { division, block })
    }

    /// The block id, required by block operations.
    pub fn block_id(&self) -> Result<&'a str> {
        self.block.ok_or_else(|| JumperError::UnknownBlock {
            division: self.division.to_string(),
            block: String::new(),
        })
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block {
            Some(block) => write!(f, "{}.{block}", self.division),
            None => f.write_str(self.division),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        let target = Target::parse("menu.item-3").unwrap();
        assert_eq!(target.division, "menu");
        assert_eq!(target.block, Some("item-3"));
        assert_eq!(target.to_string(), "menu.item-3");

        let target = Target::parse("menu").unwrap();
        assert_eq!(target.block, None);
        assert!(target.block_id().is_err());

        assert_eq!(Target::parse("a.b.c").unwrap().block, Some("b.c"));
    }

    #[test]
    fn test_reject_empty_parts() {
        assert!(matches!(Target::parse(""), Err(JumperError::UnknownDivision(_))));
        assert!(matches!(Target::parse(".x"), Err(JumperError::UnknownDivision(_))));
        assert!(matches!(Target::parse("a."), Err(JumperError::UnknownBlock { .. })));
    }
}
