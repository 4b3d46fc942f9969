//! Terminal backends: where output goes and where size and cursor come from.

use std::io::{self, Write};

/// The terminal surface the engine draws on.
pub trait Backend {
    /// Terminal size as `(columns, rows)`.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Current cursor cell as `(column, row)`, zero-based.
    fn cursor_position(&mut self) -> io::Result<(u16, u16)>;

    /// Write a complete render pass and flush it.
    fn write_all(&mut self, output: &str) -> io::Result<()>;
}

/// Backend for the real terminal on stdout.
#[derive(Debug, Default)]
pub struct CrosstermBackend {
    _private: (),
}

impl CrosstermBackend {
    /// Create a stdout backend.
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Backend for CrosstermBackend {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        crossterm::cursor::position()
    }

    fn write_all(&mut self, output: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()
    }
}

/// In-memory backend for tests and headless rendering.
///
/// Records everything written and answers cursor queries from a fixed
/// position, optionally failing the first few queries.
#[derive(Debug, Clone)]
pub struct TestBackend {
    width: u16,
    height: u16,
    cursor: (u16, u16),
    failing_queries: usize,
    queries: usize,
    output: String,
}

impl TestBackend {
    /// A `width` x `height` terminal with the cursor at the top-left.
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cursor: (0, 0),
            failing_queries: 0,
            queries: 0,
            output: String::new(),
        }
    }

    /// Place the cursor that position queries report.
    #[must_use]
    pub const fn with_cursor(mut self, col: u16, row: u16) -> Self {
        self.cursor = (col, row);
        self
    }

    /// Fail the next `count` cursor queries.
    #[must_use]
    pub const fn failing_queries(mut self, count: usize) -> Self {
        self.failing_queries = count;
        self
    }

    /// Change the reported size.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Number of cursor queries answered or failed so far.
    pub const fn queries(&self) -> usize {
        self.queries
    }

    /// Everything written so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Take everything written so far, leaving the record empty.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl Backend for TestBackend {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        self.queries += 1;
        if self.failing_queries > 0 {
            self.failing_queries -= 1;
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "cursor position query timed out",
            ));
        }
        Ok(self.cursor)
    }

    fn write_all(&mut self, output: &str) -> io::Result<()> {
        self.output.push_str(output);
        Ok(())
    }
}
