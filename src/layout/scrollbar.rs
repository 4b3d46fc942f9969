//! Scrollbar glyphs and thumb placement.

use crossterm::style::{Color, Stylize};
use std::ops::Range;

const TRACK_GREY: Color = Color::Rgb {
    r: 102,
    g: 102,
    b: 102,
};

/// The two glyphs a scrollbar is drawn with. Each must be one column wide;
/// escape sequences are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scrollbar {
    /// Glyph for the thumb.
    pub foreground: String,
    /// Glyph for the track.
    pub background: String,
}

impl Scrollbar {
    /// A scrollbar with custom glyphs.
    pub fn new(foreground: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            foreground: foreground.into(),
            background: background.into(),
        }
    }

    /// Default vertical scrollbar: a bold white thin bar on a grey track.
    pub fn vertical() -> Self {
        Self::new(
            "⎹".white().bold().to_string(),
            "⎹".with(TRACK_GREY).to_string(),
        )
    }

    /// Default horizontal scrollbar.
    pub fn horizontal() -> Self {
        Self::new(
            "▁".white().bold().to_string(),
            "▁".with(TRACK_GREY).to_string(),
        )
    }

    /// Glyphs for a track `length` cells long showing `length` of `total`
    /// items scrolled to `position`.
    pub fn track(&self, length: usize, total: usize, position: usize) -> Vec<&str> {
        let thumb = thumb(length, total, position);
        (0..length)
            .map(|i| {
                if thumb.contains(&i) {
                    self.foreground.as_str()
                } else {
                    self.background.as_str()
                }
            })
            .collect()
    }
}

/// Cells of a `length`-cell track covered by the thumb.
///
/// The thumb is proportional to the visible fraction and at least one cell.
/// At the end of the content it sits flush with the end of the track.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn thumb(length: usize, total: usize, position: usize) -> Range<usize> {
    if length == 0 || total <= length {
        return 0..length;
    }

    let size = (length * length / total).clamp(1, length);
    let max_position = total - length;
    let start = if position >= max_position {
        length - size
    } else {
        ((position as f64 / total as f64) * length as f64).floor() as usize
    };
    let start = start.min(length - size);

    start..start + size
}
