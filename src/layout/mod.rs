//! Layout module: divisions and how their geometry resolves.
//!
//! A division is declared with a [`DivisionSpec`], validated once, and
//! resolved into a [`Geometry`] whenever the dependency graph marks it dirty.
//! Geometry is relative to the engine's origin; render footprints are
//! absolute.

mod division;
mod rect;
mod scrollbar;
mod spec;

pub use division::{Division, Geometry, LayoutContext, Property};
pub use rect::Rect;
pub use scrollbar::{thumb, Scrollbar};
pub use spec::{Anchor, DivisionSpec, Height, Length, OverflowY, ValidSpec};
