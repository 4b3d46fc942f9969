//! `OutputBuffer`: accumulates a render pass into one escape string.
//!
//! Every render or erase is built here first, then handed to the backend
//! in a single write to avoid flicker.

use std::fmt::Write;

/// Pre-allocated buffer for building ANSI escape sequences.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    data: String,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: String::with_capacity(capacity),
        }
    }

    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Take the accumulated string.
    #[inline]
    pub fn into_string(self) -> String {
        self.data
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a string.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.push_str(s);
    }

    /// Write `count` spaces.
    #[inline]
    pub fn spaces(&mut self, count: usize) {
        self.data.extend(std::iter::repeat(' ').take(count));
    }

    /// Move cursor to (x, y) position (1-indexed for ANSI).
    #[inline]
    pub fn cursor_move(&mut self, x: u16, y: u16) {
        // CSI row ; col H
        let _ = write!(
            self.data,
            "\x1b[{};{}H",
            u32::from(y) + 1,
            u32::from(x) + 1
        );
    }

    /// Reset all attributes.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.push_str("\x1b[0m");
    }

    /// Erase from the cursor to the end of the screen.
    #[inline]
    pub fn erase_down(&mut self) {
        self.data.push_str("\x1b[J");
    }

    /// Blank a rectangle by overwriting it with spaces.
    pub fn blank(&mut self, x: u16, y: u16, width: u16, height: u16) {
        for row in 0..height {
            self.cursor_move(x, y.saturating_add(row));
            self.spaces(usize::from(width));
        }
    }
}

impl From<OutputBuffer> for String {
    fn from(buffer: OutputBuffer) -> Self {
        buffer.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_move_is_one_indexed() {
        let mut out = OutputBuffer::new();
        out.cursor_move(0, 0);
        out.cursor_move(9, 4);
        assert_eq!(out.as_str(), "\x1b[1;1H\x1b[5;10H");
    }

    #[test]
    fn test_blank_rect() {
        let mut out = OutputBuffer::new();
        out.blank(2, 1, 3, 2);
        assert_eq!(out.into_string(), "\x1b[2;3H   \x1b[3;3H   ");
    }

    #[test]
    fn test_cursor_move_at_max_coordinates() {
        let mut out = OutputBuffer::with_capacity(16);
        out.cursor_move(u16::MAX, u16::MAX);
        assert_eq!(out.as_str(), "\x1b[65536;65536H");
    }
}
