//! # Jumper
//!
//! A terminal layout and incremental-redraw engine.
//!
//! Callers declare rectangular regions ("divisions") positioned relative to
//! the viewport or to each other, fill them with text, and the engine
//! resolves row/column placement, wraps and measures styled text, tracks
//! which regions must be laid out again versus merely redrawn, and emits
//! the cursor-addressed output that keeps the screen correct across edits,
//! scrolling and resizes.
//!
//! ## Core Concepts
//!
//! - **Divisions**: declarative geometry (`"50%"`, `"{header} + 1"`) over
//!   ordered text blocks
//! - **Dependency graph**: dirtying a division dirties everything laid out
//!   relative to it
//! - **Two-phase layout**: provisional height, then anchor, then clamp
//! - **Incremental output**: only divisions due for render are redrawn
//!
//! ## Example
//!
//! ```rust,no_run
//! use jumper::{DivisionSpec, Engine};
//!
//! let mut engine = Engine::new(vec![
//!     DivisionSpec::new("header").top(0).left(0).width("100%"),
//!     DivisionSpec::new("body").top("{header}").left(0).width("100%"),
//! ])?;
//! engine.add_block("header", "Search:", None, None)?;
//! engine.add_block("body", "no results", Some("status"), None)?;
//! engine.render()?;
//!
//! engine.set_block_content("body.status", "3 results")?;
//! engine.render()?;
//! # Ok::<(), jumper::JumperError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod engine;
pub mod error;
pub mod expr;
pub mod graph;
pub mod layout;
pub mod terminal;
pub mod text;

// Re-exports for convenience
pub use engine::{Engine, EngineConfig, Inject, RenderInjects, ResizeActor, ResizeDebouncer, Target};
pub use error::{JumperError, Result};
pub use expr::{evaluate, UnitMap, UnitResolver};
pub use graph::{Graph, Status};
pub use layout::{Division, DivisionSpec, Geometry, Height, Length, OverflowY, Rect, Scrollbar};
pub use terminal::{Backend, CrosstermBackend, Origin, TestBackend};
pub use text::{display_width, measure, Block, Measurement, Overflow};
