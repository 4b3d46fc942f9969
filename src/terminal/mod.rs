//! Terminal module: output assembly and the surface it is written to.

mod backend;
mod output;

pub use backend::{Backend, CrosstermBackend, TestBackend};
pub use output::OutputBuffer;

/// Terminal cell where the engine's output region begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Origin {
    /// Zero-based column.
    pub col: u16,
    /// Zero-based row.
    pub row: u16,
}

impl Origin {
    /// Create an origin at `(col, row)`.
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}
