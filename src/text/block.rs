//! Block: one unit of text content owned by a division.
//!
//! A block has no width of its own. It is measured against its owning
//! division's content width, and the last measurement is memoized keyed by
//! every parameter that affects the result.

use super::wrap::{measure, Measurement, Overflow};

/// Parameters a measurement depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MeasureKey {
    width: usize,
    overflow: Overflow,
    wrap_on_word: bool,
}

/// A unit of text content.
#[derive(Debug, Clone, Default)]
pub struct Block {
    text: String,
    cache: Option<(MeasureKey, Measurement)>,
}

impl Block {
    /// Create a block holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cache: None,
        }
    }

    /// Create a block from fragments, concatenated in order.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut block = Self::default();
        for fragment in fragments {
            block.text.push_str(fragment.as_ref());
        }
        block
    }

    /// The raw text, escape sequences included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cache = None;
    }

    /// Append to the text.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.text.push_str(text);
        self.cache = None;
    }

    /// Visual lines for a container of the given width and wrap settings.
    pub fn measure(&mut self, width: usize, overflow: Overflow, wrap_on_word: bool) -> &Measurement {
        let key = MeasureKey {
            width,
            overflow,
            wrap_on_word,
        };
        if !matches!(&self.cache, Some((cached, _)) if *cached == key) {
            self.cache = None;
        }
        let text = &self.text;
        &self
            .cache
            .get_or_insert_with(|| (key, measure(text, width, overflow, wrap_on_word)))
            .1
    }

    /// Rows the block occupies in a container of the given width.
    pub fn height(&mut self, width: usize, overflow: Overflow, wrap_on_word: bool) -> usize {
        self.measure(width, overflow, wrap_on_word).height()
    }

    /// Whether a measurement for these parameters is already cached.
    pub fn is_measured(&self, width: usize, overflow: Overflow, wrap_on_word: bool) -> bool {
        let key = MeasureKey {
            width,
            overflow,
            wrap_on_word,
        };
        matches!(&self.cache, Some((cached, _)) if *cached == key)
    }
}
