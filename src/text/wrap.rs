//! Text measurement: splits styled text into visual lines for a container.
//!
//! Two overflow modes:
//! - **Scroll**: explicit newlines only; long lines overflow and are cut at
//!   render time by the horizontal scroll offset.
//! - **Wrap**: explicit newlines, then each line is wrapped to the
//!   container width, either on word boundaries or hard every `width`
//!   columns.
//!
//! Widths are display columns: escape sequences count as zero and wide
//! characters as two. A styled run that is broken across lines is closed
//! with a reset on the first line and reopened on the next.

use super::ansi::{grapheme_width, is_sgr, is_sgr_reset, segments, Segment};
use crate::error::{JumperError, Result};
use unicode_segmentation::UnicodeSegmentation;

/// Columns a tab character expands to before measurement.
pub const TAB_WIDTH: usize = 8;

const SGR_RESET: &str = "\x1b[0m";

/// Horizontal overflow behavior of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overflow {
    /// Wrap lines to the container width.
    #[default]
    Wrap,
    /// Keep lines intact and scroll horizontally.
    Scroll,
}

/// A single visual line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    /// Line text, escape sequences included.
    pub text: String,
    /// Display width in columns.
    pub width: usize,
}

/// The visual lines produced by [`measure`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Measurement {
    lines: Vec<Line>,
}

impl Measurement {
    /// All visual lines, top to bottom.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of rows the text occupies.
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Width of the widest line.
    pub fn longest(&self) -> usize {
        self.lines.iter().map(|line| line.width).max().unwrap_or(0)
    }

    /// Line at `row`; negative rows count back from the last line.
    pub fn row(&self, row: isize) -> Result<&Line> {
        let index = resolve_index(row, self.lines.len())?;
        Ok(&self.lines[index])
    }

    /// Display width of the line at `row`; negative rows count from the end.
    pub fn width_on_row(&self, row: isize) -> Result<usize> {
        self.row(row).map(|line| line.width)
    }

    /// Take ownership of the lines.
    pub fn into_lines(self) -> Vec<Line> {
        self.lines
    }
}

/// Map a possibly negative index onto `0..len`.
pub(crate) fn resolve_index(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        usize::try_from(index).ok().filter(|&i| i < len)
    };
    resolved.ok_or(JumperError::OutOfRange { index, len })
}

/// Measure `text` for a container `width` columns wide.
///
/// Always yields at least one line; empty text is one empty line. A width
/// of zero disables wrapping.
pub fn measure(text: &str, width: usize, overflow: Overflow, wrap_on_word: bool) -> Measurement {
    let expanded;
    let text = if text.contains('\t') {
        expanded = text.replace('\t', &" ".repeat(TAB_WIDTH));
        expanded.as_str()
    } else {
        text
    };

    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if overflow == Overflow::Scroll || width == 0 {
            lines.push(Line {
                text: raw.to_string(),
                width: super::display_width(raw),
            });
        } else if wrap_on_word {
            wrap_words(raw, width, &mut lines);
        } else {
            wrap_hard(raw, width, &mut lines);
        }
    }

    Measurement { lines }
}

/// Accumulates one visual line and the styles active at its end.
struct LineBuilder<'a> {
    max_width: usize,
    text: String,
    width: usize,
    active: Vec<&'a str>,
    lines: &'a mut Vec<Line>,
}

impl<'a> LineBuilder<'a> {
    fn new(max_width: usize, lines: &'a mut Vec<Line>) -> Self {
        Self {
            max_width,
            text: String::new(),
            width: 0,
            active: Vec::new(),
            lines,
        }
    }

    const fn fits(&self, width: usize) -> bool {
        self.width + width <= self.max_width
    }

    fn push_escape(&mut self, escape: &'a str) {
        if is_sgr_reset(escape) {
            self.active.clear();
        } else if is_sgr(escape) {
            self.active.push(escape);
        }
        self.text.push_str(escape);
    }

    fn push_glyph(&mut self, glyph: &str, width: usize) {
        self.text.push_str(glyph);
        self.width += width;
    }

    /// Push a glyph, breaking first if it would overflow a non-empty line.
    fn push_glyph_breaking(&mut self, glyph: &str, width: usize) {
        if !self.fits(width) && self.width > 0 {
            self.break_line();
        }
        self.push_glyph(glyph, width);
    }

    fn trim_trailing_spaces(&mut self) {
        while self.width > 0 && self.text.ends_with(' ') {
            self.text.pop();
            self.width -= 1;
        }
    }

    fn break_line(&mut self) {
        let mut text = std::mem::take(&mut self.text);
        if !self.active.is_empty() {
            text.push_str(SGR_RESET);
            for escape in &self.active {
                self.text.push_str(escape);
            }
        }
        self.lines.push(Line {
            text,
            width: self.width,
        });
        self.width = 0;
    }

    fn finish(self) {
        self.lines.push(Line {
            text: self.text,
            width: self.width,
        });
    }
}

fn wrap_hard(raw: &str, max_width: usize, lines: &mut Vec<Line>) {
    let mut line = LineBuilder::new(max_width, lines);
    for segment in segments(raw) {
        match segment {
            Segment::Escape(escape) => line.push_escape(escape),
            Segment::Text(text) => {
                for glyph in text.graphemes(true) {
                    line.push_glyph_breaking(glyph, grapheme_width(glyph));
                }
            }
        }
    }
    line.finish();
}

/// A word-wrap unit: whitespace, an escape between words, or a word with
/// any escapes embedded in it.
enum Item<'a> {
    Escape(&'a str),
    Space(&'a str, usize),
    Word(Vec<Segment<'a>>, usize),
}

fn split_items(raw: &str) -> Vec<Item<'_>> {
    let mut items = Vec::new();
    let mut word: Vec<Segment<'_>> = Vec::new();
    let mut word_width = 0;

    for segment in segments(raw) {
        match segment {
            Segment::Escape(escape) => {
                if word.is_empty() {
                    items.push(Item::Escape(escape));
                } else {
                    word.push(segment);
                }
            }
            Segment::Text(text) => {
                for glyph in text.graphemes(true) {
                    if glyph.chars().all(char::is_whitespace) {
                        if !word.is_empty() {
                            items.push(Item::Word(std::mem::take(&mut word), word_width));
                            word_width = 0;
                        }
                        items.push(Item::Space(glyph, grapheme_width(glyph)));
                    } else {
                        word_width += grapheme_width(glyph);
                        word.push(Segment::Text(glyph));
                    }
                }
            }
        }
    }
    if !word.is_empty() {
        items.push(Item::Word(word, word_width));
    }

    items
}

fn wrap_words(raw: &str, max_width: usize, lines: &mut Vec<Line>) {
    let mut line = LineBuilder::new(max_width, lines);

    for item in split_items(raw) {
        match item {
            Item::Escape(escape) => line.push_escape(escape),
            Item::Space(glyph, width) => {
                if line.fits(width) {
                    line.push_glyph(glyph, width);
                } else if line.width > 0 {
                    // Whitespace at a break point is dropped.
                    line.break_line();
                }
            }
            Item::Word(pieces, width) => {
                if !line.fits(width) && line.width > 0 {
                    line.trim_trailing_spaces();
                    line.break_line();
                }
                let oversized = width > max_width;
                for piece in pieces {
                    match piece {
                        Segment::Escape(escape) => line.push_escape(escape),
                        Segment::Text(glyph) if oversized => {
                            line.push_glyph_breaking(glyph, grapheme_width(glyph));
                        }
                        Segment::Text(glyph) => line.push_glyph(glyph, grapheme_width(glyph)),
                    }
                }
            }
        }
    }

    line.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::display_width;

    fn texts(m: &Measurement) -> Vec<&str> {
        m.lines().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_scroll_splits_on_newlines_only() {
        let m = measure("a very long line\nb", 4, Overflow::Scroll, true);
        assert_eq!(texts(&m), vec!["a very long line", "b"]);
        assert_eq!(m.longest(), 16);
    }

    #[test]
    fn test_empty_text_is_one_row() {
        let m = measure("", 10, Overflow::Wrap, true);
        assert_eq!(m.height(), 1);
        assert_eq!(m.lines()[0].width, 0);
    }

    #[test]
    fn test_hard_wrap_cuts_every_width() {
        let m = measure("abcdefghij", 4, Overflow::Wrap, false);
        assert_eq!(texts(&m), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_word_wrap_breaks_between_words() {
        let m = measure("the quick brown fox", 10, Overflow::Wrap, true);
        assert_eq!(texts(&m), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_word_wrap_force_breaks_long_words() {
        let m = measure("ab abcdefghijkl", 5, Overflow::Wrap, true);
        assert_eq!(texts(&m), vec!["ab", "abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_wide_characters_wrap_on_columns() {
        let m = measure("日本語です", 5, Overflow::Wrap, false);
        assert_eq!(texts(&m), vec!["日本", "語で", "す"]);
        assert!(m.lines().iter().all(|l| l.width <= 5));
    }

    #[test]
    fn test_styled_run_reopens_after_break() {
        let m = measure("\x1b[31mabcdef\x1b[0m", 3, Overflow::Wrap, false);
        assert_eq!(m.height(), 2);
        assert_eq!(m.lines()[0].text, "\x1b[31mabc\x1b[0m");
        assert!(m.lines()[1].text.starts_with("\x1b[31mdef"));
        assert_eq!(m.lines()[1].width, 3);
    }

    #[test]
    fn test_tabs_expand_before_measuring() {
        let m = measure("\tx", 80, Overflow::Wrap, true);
        assert_eq!(m.lines()[0].width, TAB_WIDTH + 1);
    }

    #[test]
    fn test_negative_rows_count_from_end() {
        let m = measure("one\ntwo\nthree", 80, Overflow::Wrap, true);
        assert_eq!(m.row(-1).unwrap().text, "three");
        assert_eq!(m.width_on_row(-3).unwrap(), 3);
        assert!(matches!(m.row(3), Err(JumperError::OutOfRange { index: 3, len: 3 })));
        assert!(matches!(m.row(-4), Err(JumperError::OutOfRange { .. })));
    }

    #[test]
    fn test_measure_is_idempotent() {
        let text = "\x1b[1mhello\x1b[0m wide 日本 world\tand more";
        let a = measure(text, 7, Overflow::Wrap, true);
        let b = measure(text, 7, Overflow::Wrap, true);
        assert_eq!(a, b);
        assert!(a.lines().iter().all(|l| display_width(&l.text) == l.width));
    }
}
