//! ANSI-aware scanning: splits styled text into escape sequences and
//! visible graphemes so width is measured in terminal display columns.
//!
//! Handles:
//! - CSI sequences: `ESC [` ... final byte (0x40-0x7E)
//! - OSC sequences: `ESC ]` ... BEL or ST (`ESC \`)
//! - DCS/PM/APC sequences: `ESC P` / `ESC ^` / `ESC _` ... ST
//! - Two-character sequences: `ESC` + single byte

use std::borrow::Cow;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ESC: u8 = 0x1B;

/// A piece of styled text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// An escape sequence; occupies no columns.
    Escape(&'a str),
    /// A run of visible text with no escape sequences inside.
    Text(&'a str),
}

/// Iterator over the [`Segment`]s of a string.
pub struct Segments<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.source.as_bytes();
        let start = self.pos;
        if start >= bytes.len() {
            return None;
        }

        if bytes[start] == ESC {
            self.pos = skip_escape_sequence(bytes, start);
            return Some(Segment::Escape(&self.source[start..self.pos]));
        }

        // ESC is a single ASCII byte, so stopping on it never splits a
        // UTF-8 sequence.
        let mut end = start;
        while end < bytes.len() && bytes[end] != ESC {
            end += 1;
        }
        self.pos = end;
        Some(Segment::Text(&self.source[start..end]))
    }
}

/// Split `s` into escape sequences and plain text runs.
pub const fn segments(s: &str) -> Segments<'_> {
    Segments { source: s, pos: 0 }
}

/// Skip an escape sequence starting at `pos` (which points to ESC).
/// Returns the byte index after the complete sequence.
fn skip_escape_sequence(bytes: &[u8], pos: usize) -> usize {
    let next = pos + 1;
    if next >= bytes.len() {
        return bytes.len();
    }

    match bytes[next] {
        b'[' => skip_csi(bytes, next + 1),
        b']' | b'P' | b'^' | b'_' => skip_string_terminated(bytes, next + 1),
        b if b.is_ascii() => next + 1,
        // Never swallow half of a multi-byte character.
        _ => next,
    }
}

fn skip_csi(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        let b = bytes[i];
        if (0x40..=0x7E).contains(&b) {
            return i + 1;
        }
        if !(0x20..=0x3F).contains(&b) {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_string_terminated(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            0x07 => return i + 1,
            ESC if i + 1 < bytes.len() && bytes[i + 1] == b'\\' => return i + 2,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Display width of a single grapheme cluster.
///
/// Control characters take no columns; wide (CJK, emoji) clusters take two.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.chars().next().is_some_and(char::is_control) {
        return 0;
    }
    UnicodeWidthStr::width(grapheme).min(2)
}

/// Strip every escape sequence from `s`.
///
/// Returns `Cow::Borrowed` when there is nothing to strip.
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.as_bytes().contains(&ESC) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    for segment in segments(s) {
        if let Segment::Text(text) = segment {
            out.push_str(text);
        }
    }
    Cow::Owned(out)
}

/// Width of `s` in terminal columns, ignoring escape sequences.
pub fn display_width(s: &str) -> usize {
    segments(s)
        .map(|segment| match segment {
            Segment::Escape(_) => 0,
            Segment::Text(text) => text.graphemes(true).map(grapheme_width).sum(),
        })
        .sum()
}

/// Whether an escape sequence is an SGR (style) sequence.
pub fn is_sgr(escape: &str) -> bool {
    escape.starts_with("\x1b[") && escape.ends_with('m')
}

/// Whether an SGR sequence resets all attributes.
pub fn is_sgr_reset(escape: &str) -> bool {
    matches!(escape, "\x1b[m" | "\x1b[0m")
}

/// Slice `s` to the display columns `start..end`.
///
/// Escape sequences are always kept so styles opened before `start` stay
/// in effect and styles closed after `end` are still closed. A wide
/// grapheme cut by either boundary is replaced by spaces for the part that
/// falls inside the range, so the result never exceeds `end - start`
/// columns.
pub fn slice_columns(s: &str, start: usize, end: usize) -> String {
    let mut out = String::with_capacity(s.len());
    let mut col = 0usize;

    for segment in segments(s) {
        match segment {
            Segment::Escape(escape) => out.push_str(escape),
            Segment::Text(text) => {
                for grapheme in text.graphemes(true) {
                    let width = grapheme_width(grapheme);
                    let next = col + width;
                    if col >= start && next <= end {
                        if width > 0 || col < end {
                            out.push_str(grapheme);
                        }
                    } else if col < end && next > start {
                        let visible = next.min(end) - col.max(start);
                        out.extend(std::iter::repeat(' ').take(visible));
                    }
                    col = next;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_is_borrowed() {
        assert!(matches!(strip_ansi("hello"), Cow::Borrowed(_)));
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_ansi("\x1b[38;5;196mred\x1b[0m"), "red");
        assert_eq!(strip_ansi("\x1b]8;;http://x\x07link\x1b]8;;\x07"), "link");
    }

    #[test]
    fn test_display_width_ignores_styles() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("\x1b[1m\x1b[32mabc\x1b[0m"), 3);
        assert_eq!(display_width("日本"), 4);
        assert_eq!(display_width("e\u{301}"), 1);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn test_segments_split_escapes_from_text() {
        let parts: Vec<_> = segments("a\x1b[31mb").collect();
        assert_eq!(
            parts,
            vec![Segment::Text("a"), Segment::Escape("\x1b[31m"), Segment::Text("b")]
        );
    }

    #[test]
    fn test_unterminated_escape_consumes_rest() {
        assert_eq!(strip_ansi("ab\x1b[31"), "ab");
        assert_eq!(display_width("ab\x1b"), 2);
    }

    #[test]
    fn test_slice_keeps_styles() {
        let line = "\x1b[31mabcdef\x1b[0m";
        assert_eq!(slice_columns(line, 2, 4), "\x1b[31mcd\x1b[0m");
        assert_eq!(slice_columns("abcdef", 4, 10), "ef");
        assert_eq!(slice_columns("abc", 5, 8), "");
    }

    #[test]
    fn test_slice_replaces_cut_wide_graphemes() {
        // "日" spans columns 0-1, "本" spans 2-3
        assert_eq!(slice_columns("日本", 1, 4), " 本");
        assert_eq!(slice_columns("日本", 0, 3), "日 ");
        assert_eq!(display_width(&slice_columns("日本語", 1, 4)), 3);
    }

    #[test]
    fn test_sgr_classification() {
        assert!(is_sgr("\x1b[1;31m"));
        assert!(!is_sgr("\x1b[2K"));
        assert!(is_sgr_reset("\x1b[0m"));
        assert!(is_sgr_reset("\x1b[m"));
        assert!(!is_sgr_reset("\x1b[31m"));
    }
}
