//! Division references: `{division-id}` tokens inside geometry expressions,
//! optionally followed by a property suffix such as `{id}height`.
//!
//! References are substituted with numbers by the division before the
//! arithmetic evaluator ever sees the string.

use crate::error::{JumperError, Result};
use std::ops::Range;

/// A `{id}` token found in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    /// The referenced division id.
    pub id: &'a str,
    /// Bare-word property after the closing brace, if any.
    pub property: Option<&'a str>,
    /// Byte range of the whole token, suffix included.
    pub span: Range<usize>,
}

/// Every reference in `expr`, left to right.
pub fn references(expr: &str) -> Result<Vec<Reference<'_>>> {
    let mut found = Vec::new();
    let mut rest = 0;

    while let Some(offset) = expr[rest..].find('{') {
        let open = rest + offset;
        let close = expr[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| JumperError::expression(expr, "unterminated division reference"))?;

        let id = expr[open + 1..close].trim();
        if id.is_empty() || id.contains('{') {
            return Err(JumperError::expression(expr, "empty division reference"));
        }

        let suffix_len = expr[close + 1..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(expr.len() - close - 1);
        let end = close + 1 + suffix_len;
        let property = (suffix_len > 0).then(|| &expr[close + 1..end]);

        found.push(Reference {
            id,
            property,
            span: open..end,
        });
        rest = end;
    }

    Ok(found)
}

/// Replace every reference in `expr` with the number `resolve` returns.
///
/// Substituted values are parenthesized so negative results keep their
/// sign next to an operator.
pub fn substitute_references<F>(expr: &str, mut resolve: F) -> Result<String>
where
    F: FnMut(&Reference<'_>) -> Result<f64>,
{
    let refs = references(expr)?;
    if refs.is_empty() {
        return Ok(expr.to_string());
    }

    let mut out = String::with_capacity(expr.len() + 8);
    let mut last = 0;
    for reference in &refs {
        out.push_str(&expr[last..reference.span.start]);
        let value = resolve(reference)?;
        out.push('(');
        out.push_str(&value.to_string());
        out.push(')');
        last = reference.span.end;
    }
    out.push_str(&expr[last..]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_ids_and_suffixes() {
        let refs = references("{header} + {side}width - 2").unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "header");
        assert_eq!(refs[0].property, None);
        assert_eq!(refs[1].id, "side");
        assert_eq!(refs[1].property, Some("width"));
        assert_eq!(&"{header} + {side}width - 2"[refs[1].span.clone()], "{side}width");
    }

    #[test]
    fn test_unterminated_reference() {
        assert!(references("{oops + 1").is_err());
        assert!(references("{} + 1").is_err());
    }

    #[test]
    fn test_substitution_parenthesizes() {
        let out = substitute_references("10 - {a}", |_| Ok(-3.0)).unwrap();
        assert_eq!(out, "10 - (-3)");
        assert_eq!(substitute_references("50%", |_| Ok(0.0)).unwrap(), "50%");
    }

    #[test]
    fn test_resolver_errors_propagate() {
        let err = substitute_references("{ghost}", |r| {
            Err(JumperError::UnknownDivision(r.id.to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, JumperError::UnknownDivision(id) if id == "ghost"));
    }
}
