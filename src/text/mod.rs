//! Text module: ANSI-aware measurement and wrapping of division content.
//!
//! This module contains:
//! - [`measure`]: split text into visual lines for a container width
//! - [`Block`]: a unit of content with a memoized measurement
//! - ANSI helpers for stripping, measuring, and column slicing

mod ansi;
mod block;
mod wrap;

pub use ansi::{display_width, grapheme_width, segments, slice_columns, strip_ansi, Segment};
pub use block::Block;
pub use wrap::{measure, Line, Measurement, Overflow, TAB_WIDTH};

pub(crate) use wrap::resolve_index;
