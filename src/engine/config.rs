//! Engine configuration.

use std::time::Duration;

/// Configuration for the Engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Window in which raw resize events are coalesced.
    pub resize_debounce: Duration,
    /// How often the initial cursor-position query is attempted.
    pub cursor_query_attempts: u32,
    /// Pause between cursor-position query attempts.
    pub cursor_query_backoff: Duration,
    /// Id of the full-width division created when no specs are given.
    pub default_division_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resize_debounce: Duration::from_millis(100),
            cursor_query_attempts: 10,
            cursor_query_backoff: Duration::from_millis(10),
            default_division_id: "default-division".to_string(),
        }
    }
}
