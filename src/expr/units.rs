//! Unit resolution for numbers such as `50%`.

use crate::error::{JumperError, Result};
use std::collections::BTreeMap;

/// Lookup table of unit bases. Only `%` has a built-in meaning:
/// `n%` evaluates to `n / 100 * map["%"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitMap {
    bases: BTreeMap<String, f64>,
}

impl UnitMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map where `%` is relative to `basis`.
    pub fn percent_of(basis: f64) -> Self {
        Self::new().with("%", basis)
    }

    /// Add a basis for `unit`.
    #[must_use]
    pub fn with(mut self, unit: impl Into<String>, basis: f64) -> Self {
        self.bases.insert(unit.into(), basis);
        self
    }

    /// The basis registered for `unit`.
    pub fn get(&self, unit: &str) -> Option<f64> {
        self.bases.get(unit).copied()
    }
}

/// How units in an expression are turned into numbers.
#[derive(Clone, Copy, Default)]
pub enum UnitResolver<'a> {
    /// Any unit is an error.
    #[default]
    None,
    /// Built-in `%` handling against a lookup table.
    Map(&'a UnitMap),
    /// A callback receiving `(number, unit)`; `None` means unknown unit.
    Callback(&'a dyn Fn(f64, &str) -> Option<f64>),
}

impl std::fmt::Debug for UnitResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("UnitResolver::None"),
            Self::Map(map) => f.debug_tuple("UnitResolver::Map").field(map).finish(),
            Self::Callback(_) => f.write_str("UnitResolver::Callback(..)"),
        }
    }
}

impl UnitResolver<'_> {
    /// Resolve `value` carrying `unit` to a plain number.
    pub fn resolve(&self, value: f64, unit: &str, source: &str) -> Result<f64> {
        let resolved = match self {
            Self::None => None,
            Self::Map(map) if unit == "%" => map.get("%").map(|basis| value / 100.0 * basis),
            Self::Map(_) => None,
            Self::Callback(callback) => callback(value, unit),
        };

        resolved.ok_or_else(|| JumperError::UnresolvedUnit {
            unit: unit.to_string(),
            expr: source.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_against_map() {
        let map = UnitMap::percent_of(200.0);
        assert_eq!(UnitResolver::Map(&map).resolve(10.0, "%", "10%").unwrap(), 20.0);
    }

    #[test]
    fn test_other_units_need_a_handler() {
        let map = UnitMap::percent_of(100.0).with("vh", 50.0);
        let err = UnitResolver::Map(&map).resolve(1.0, "vh", "1vh").unwrap_err();
        assert!(matches!(err, JumperError::UnresolvedUnit { unit, .. } if unit == "vh"));

        assert!(UnitResolver::None.resolve(1.0, "%", "1%").is_err());
        assert!(UnitResolver::Map(&UnitMap::new()).resolve(1.0, "%", "1%").is_err());
    }

    #[test]
    fn test_callback_handles_custom_units() {
        let cb = |n: f64, unit: &str| match unit {
            "%w" => Some(n / 100.0 * 75.0),
            "%h" => Some(n / 100.0 * 50.0),
            _ => None,
        };
        let resolver = UnitResolver::Callback(&cb);
        assert_eq!(resolver.resolve(20.0, "%w", "").unwrap(), 15.0);
        assert_eq!(resolver.resolve(50.0, "%h", "").unwrap(), 25.0);
        assert!(resolver.resolve(1.0, "em", "").is_err());
    }
}
