//! Division configuration: declarative geometry plus overflow settings.
//!
//! A [`DivisionSpec`] is built fluently and validated once, when the
//! division is registered with the engine. Validation fails fast on the
//! configuration errors a render pass could never recover from.

use super::scrollbar::Scrollbar;
use crate::error::{JumperError, Result};
use crate::expr::{parse, references, substitute_references};
use crate::text::Overflow;

/// A number of rows/columns or an expression producing one.
#[derive(Debug, Clone, PartialEq)]
pub enum Length {
    /// An absolute number of rows or columns.
    Cells(f64),
    /// An expression such as `"50% - 2"` or `"{header} + 1"`.
    Expr(String),
}

impl Length {
    /// The expression string, if this length is one.
    pub fn as_expr(&self) -> Option<&str> {
        match self {
            Self::Cells(_) => None,
            Self::Expr(expr) => Some(expr),
        }
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Self::Cells(value)
    }
}

impl From<i32> for Length {
    fn from(value: i32) -> Self {
        Self::Cells(f64::from(value))
    }
}

impl From<u16> for Length {
    fn from(value: u16) -> Self {
        Self::Cells(f64::from(value))
    }
}

impl From<&str> for Length {
    fn from(value: &str) -> Self {
        Self::Expr(value.to_string())
    }
}

impl From<String> for Length {
    fn from(value: String) -> Self {
        Self::Expr(value)
    }
}

/// Which edge of the viewport a position is measured from.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// Measured from the top (vertical) or left (horizontal) edge.
    Start(Length),
    /// Measured from the bottom (vertical) or right (horizontal) edge.
    End(Length),
}

impl Anchor {
    /// The length this anchor resolves.
    pub const fn length(&self) -> &Length {
        match self {
            Self::Start(length) | Self::End(length) => length,
        }
    }
}

/// Vertical size of a division.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Height {
    /// Shrink to content, up to the bottom of the viewport.
    #[default]
    Auto,
    /// An explicit height.
    Fixed(Length),
    /// Fill the viewport from the division's top to its bottom.
    Fill,
}

/// Vertical overflow behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverflowY {
    /// Grow with content until the viewport fills, then scroll.
    #[default]
    Auto,
    /// Fixed height; content scrolls. Requires an explicit height.
    Scroll,
}

/// Declarative description of a division.
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionSpec {
    /// Unique id within one engine.
    pub id: String,
    /// Distance from the top of the viewport.
    pub top: Option<Length>,
    /// Distance from the bottom of the viewport.
    pub bottom: Option<Length>,
    /// Distance from the left of the viewport.
    pub left: Option<Length>,
    /// Distance from the right of the viewport.
    pub right: Option<Length>,
    /// Width; required.
    pub width: Option<Length>,
    /// Height; content-driven when [`Height::Auto`].
    pub height: Height,
    /// Horizontal overflow.
    pub overflow_x: Overflow,
    /// Vertical overflow.
    pub overflow_y: OverflowY,
    /// Horizontal scrollbar glyphs; requires `overflow_x = Scroll`.
    pub scrollbar_x: Option<Scrollbar>,
    /// Vertical scrollbar glyphs; requires `overflow_y = Scroll`.
    pub scrollbar_y: Option<Scrollbar>,
    /// Break wrapped lines at word boundaries rather than every column.
    pub wrap_on_word: bool,
    /// Draw sequencing within a render pass; lower renders first.
    pub render_order: i32,
}

impl DivisionSpec {
    /// A spec with the given id and nothing else set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            top: None,
            bottom: None,
            left: None,
            right: None,
            width: None,
            height: Height::Auto,
            overflow_x: Overflow::Wrap,
            overflow_y: OverflowY::Auto,
            scrollbar_x: None,
            scrollbar_y: None,
            wrap_on_word: true,
            render_order: 0,
        }
    }

    /// Anchor to the top of the viewport (or `{id}` bottom edge).
    #[must_use]
    pub fn top(mut self, top: impl Into<Length>) -> Self {
        self.top = Some(top.into());
        self
    }

    /// Anchor to the bottom of the viewport.
    #[must_use]
    pub fn bottom(mut self, bottom: impl Into<Length>) -> Self {
        self.bottom = Some(bottom.into());
        self
    }

    /// Anchor to the left of the viewport (or `{id}` right edge).
    #[must_use]
    pub fn left(mut self, left: impl Into<Length>) -> Self {
        self.left = Some(left.into());
        self
    }

    /// Anchor to the right of the viewport.
    #[must_use]
    pub fn right(mut self, right: impl Into<Length>) -> Self {
        self.right = Some(right.into());
        self
    }

    /// Set the width.
    #[must_use]
    pub fn width(mut self, width: impl Into<Length>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Set an explicit height.
    #[must_use]
    pub fn height(mut self, height: impl Into<Length>) -> Self {
        self.height = Height::Fixed(height.into());
        self
    }

    /// Fill the remaining viewport height.
    #[must_use]
    pub fn fill_height(mut self) -> Self {
        self.height = Height::Fill;
        self
    }

    /// Set horizontal overflow.
    #[must_use]
    pub const fn overflow_x(mut self, overflow: Overflow) -> Self {
        self.overflow_x = overflow;
        self
    }

    /// Set vertical overflow.
    #[must_use]
    pub const fn overflow_y(mut self, overflow: OverflowY) -> Self {
        self.overflow_y = overflow;
        self
    }

    /// Show a horizontal scrollbar.
    #[must_use]
    pub fn scrollbar_x(mut self, scrollbar: Scrollbar) -> Self {
        self.scrollbar_x = Some(scrollbar);
        self
    }

    /// Show a vertical scrollbar.
    #[must_use]
    pub fn scrollbar_y(mut self, scrollbar: Scrollbar) -> Self {
        self.scrollbar_y = Some(scrollbar);
        self
    }

    /// Choose word (`true`) or hard (`false`) wrapping.
    #[must_use]
    pub const fn wrap_on_word(mut self, wrap_on_word: bool) -> Self {
        self.wrap_on_word = wrap_on_word;
        self
    }

    /// Set the render order.
    #[must_use]
    pub const fn render_order(mut self, order: i32) -> Self {
        self.render_order = order;
        self
    }

    /// Check the spec and resolve it into anchors.
    pub fn validate(&self) -> Result<ValidSpec> {
        let fail = |reason: &str| Err(JumperError::config(&self.id, reason));

        if self.id.is_empty() {
            return fail("property \"id\" must be present");
        }
        if self.id.contains(['{', '}']) {
            return fail("id may not contain braces");
        }

        let vertical = match (&self.top, &self.bottom) {
            (Some(top), None) => Anchor::Start(top.clone()),
            (None, Some(bottom)) => Anchor::End(bottom.clone()),
            (None, None) => return fail("must set a top or bottom position"),
            (Some(_), Some(_)) => return fail("top and bottom are mutually exclusive"),
        };
        let horizontal = match (&self.left, &self.right) {
            (Some(left), None) => Anchor::Start(left.clone()),
            (None, Some(right)) => Anchor::End(right.clone()),
            (None, None) => return fail("must set a left or right position"),
            (Some(_), Some(_)) => return fail("left and right are mutually exclusive"),
        };
        let Some(width) = self.width.clone() else {
            return fail("property \"width\" must be given");
        };

        if self.overflow_y == OverflowY::Scroll && self.height == Height::Auto {
            return fail("must set division height when overflow-y is \"scroll\"");
        }
        if self.scrollbar_x.is_some() && self.overflow_x != Overflow::Scroll {
            return fail("must set overflow-x to \"scroll\" if a horizontal scrollbar is present");
        }
        if self.scrollbar_y.is_some() && self.overflow_y != OverflowY::Scroll {
            return fail("must set overflow-y to \"scroll\" if a vertical scrollbar is present");
        }

        let valid = ValidSpec {
            vertical,
            horizontal,
            width,
        };
        for expr in valid.expressions(&self.height) {
            check_syntax(expr)?;
        }

        Ok(valid)
    }
}

/// The anchors of a spec that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSpec {
    /// Top or bottom.
    pub vertical: Anchor,
    /// Left or right.
    pub horizontal: Anchor,
    /// Width.
    pub width: Length,
}

impl ValidSpec {
    /// The expression strings among the four geometry fields.
    pub fn expressions<'a>(&'a self, height: &'a Height) -> impl Iterator<Item = &'a str> {
        let height = match height {
            Height::Fixed(length) => length.as_expr(),
            Height::Auto | Height::Fill => None,
        };
        [
            self.vertical.length().as_expr(),
            self.horizontal.length().as_expr(),
            self.width.as_expr(),
            height,
        ]
        .into_iter()
        .flatten()
    }
}

/// Reject expressions that could never evaluate, whatever they reference.
fn check_syntax(expr: &str) -> Result<()> {
    for reference in references(expr)? {
        if let Some(property) = reference.property {
            super::division::Property::parse(property, expr)?;
        }
    }
    let flat = substitute_references(expr, |_| Ok(0.0))?;
    parse(&flat).map(|_| ()).map_err(|err| match err {
        JumperError::InvalidExpression { reason, .. } => JumperError::expression(expr, reason),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DivisionSpec {
        DivisionSpec::new("a").top(0).left(0).width("100%")
    }

    fn reason(spec: &DivisionSpec) -> String {
        match spec.validate() {
            Err(JumperError::Configuration { reason, .. }) => reason,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_spec_resolves_anchors() {
        let valid = DivisionSpec::new("a").bottom(2).right("{b}").width(10).validate().unwrap();
        assert_eq!(valid.vertical, Anchor::End(Length::Cells(2.0)));
        assert_eq!(valid.horizontal, Anchor::End(Length::Expr("{b}".into())));
    }

    #[test]
    fn test_required_fields() {
        assert!(reason(&DivisionSpec::new("").top(0).left(0).width(1)).contains("id"));
        assert!(reason(&DivisionSpec::new("a").left(0).width(1)).contains("top or bottom"));
        assert!(reason(&DivisionSpec::new("a").top(0).width(1)).contains("left or right"));
        assert!(reason(&DivisionSpec::new("a").top(0).left(0)).contains("width"));
        assert!(reason(&base().bottom(1)).contains("mutually exclusive"));
    }

    #[test]
    fn test_scroll_rules() {
        let spec = base().overflow_y(OverflowY::Scroll);
        assert!(reason(&spec).contains("height"));
        assert!(spec.height(5).validate().is_ok());

        let spec = base().scrollbar_x(Scrollbar::horizontal());
        assert!(reason(&spec).contains("overflow-x"));
        assert!(spec.overflow_x(Overflow::Scroll).validate().is_ok());

        let spec = base().height(5).scrollbar_y(Scrollbar::vertical());
        assert!(reason(&spec).contains("overflow-y"));
    }

    #[test]
    fn test_bad_expressions_fail_at_registration() {
        let err = base().width("(50% - 2").validate().unwrap_err();
        assert!(matches!(err, JumperError::InvalidExpression { expr, .. } if expr == "(50% - 2"));

        let err = DivisionSpec::new("a").top("{b}middle").left(0).width(1).validate();
        assert!(err.is_err());
    }
}
