//! Engine module: the render orchestrator and its collaborators.
//!
//! The [`Engine`] owns every division, the dependency graph and the
//! terminal state (size and origin). A render pass runs in this order:
//!
//! 1. Flush `before:` injects (including erase output queued by edits).
//! 2. Mark fill-height divisions dirty when the viewport height changed.
//! 3. Recompute every dirty division, referenced divisions first.
//! 4. Scroll the terminal if the output would run past its last row.
//! 5. Render every division due for render, by render order.
//! 6. Flush `after:` injects and reset the graph.
//!
//! Mutations only mark the graph; nothing is drawn until the next pass.

mod config;
mod injects;
mod orchestrator;
mod resize;
mod target;

pub use config::EngineConfig;
pub use injects::{Inject, RenderInjects};
pub use orchestrator::Engine;
pub use resize::{ResizeActor, ResizeDebouncer};
pub use target::Target;
