//! Property-based invariant tests for measurement, layout and expressions.
//!
//! Verifies:
//! 1. Wrapped lines never exceed the container width
//! 2. A line's recorded width equals its display width
//! 3. Hard wrapping never needs more rows at a wider width
//! 4. Styling a whole text does not change its layout
//! 5. Block measurement caching is transparent
//! 6. Scroll offsets stay within `0..=max_scroll`
//! 7. Scrollbar thumbs stay inside the track
//! 8. Expressions fold `*` before `+`/`-`, left to right

use jumper::layout::{thumb, LayoutContext};
use jumper::text::strip_ansi;
use jumper::{
    display_width, evaluate, measure, Block, Division, DivisionSpec, Overflow, OverflowY, Rect,
    UnitResolver,
};
use proptest::prelude::*;
use std::collections::HashMap;

// ── Strategies ────────────────────────────────────────────────────────────

fn piece() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z]{1,10}",
        2 => Just(" ".to_string()),
        1 => Just("\n".to_string()),
        1 => Just("日本語".to_string()),
        1 => Just("é".to_string()),
    ]
}

fn plain_text() -> impl Strategy<Value = String> {
    prop::collection::vec(piece(), 0..30).prop_map(|pieces| pieces.concat())
}

fn styled_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => piece(),
            1 => Just("\x1b[31m".to_string()),
            1 => Just("\x1b[1m".to_string()),
            1 => Just("\x1b[0m".to_string()),
        ],
        0..30,
    )
    .prop_map(|pieces| pieces.concat())
}

fn width() -> impl Strategy<Value = usize> {
    2usize..40
}

fn scroll_op() -> impl Strategy<Value = (u8, usize)> {
    (0u8..5, 0usize..20)
}

fn measured_division(text: &str, height: u16) -> Division {
    let spec = DivisionSpec::new("log")
        .top(0)
        .left(0)
        .width(12)
        .height(height)
        .overflow_x(Overflow::Scroll)
        .overflow_y(OverflowY::Scroll);
    let mut division = Division::new(spec).unwrap();
    division.add_block(text, None, None).unwrap();
    let resolved: HashMap<String, Rect> = HashMap::new();
    let ctx = LayoutContext {
        terminal_width: 80,
        available_height: 24,
        resolved: &resolved,
    };
    division.recompute(true, &ctx).unwrap();
    division
}

/// Left-to-right fold with `*` binding tighter than `+` and `-`.
fn reference_fold(first: u8, rest: &[(char, u8)]) -> f64 {
    let mut sum = 0.0;
    let mut sign = 1.0;
    let mut term = f64::from(first);
    for &(op, value) in rest {
        let value = f64::from(value);
        match op {
            '*' => term *= value,
            '+' | '-' => {
                sum += sign * term;
                sign = if op == '+' { 1.0 } else { -1.0 };
                term = value;
            }
            _ => unreachable!(),
        }
    }
    sum + sign * term
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Wrapped line widths
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn wrapped_lines_fit_the_width(text in styled_text(), width in width(), on_word in any::<bool>()) {
        let m = measure(&text, width, Overflow::Wrap, on_word);
        prop_assert!(m.height() >= 1);
        for line in m.lines() {
            prop_assert!(
                line.width <= width,
                "line {:?} is {} wide in {}", line.text, line.width, width
            );
        }
    }

    #[test]
    fn recorded_width_matches_display_width(text in styled_text(), width in width(), on_word in any::<bool>()) {
        let m = measure(&text, width, Overflow::Wrap, on_word);
        for line in m.lines() {
            prop_assert_eq!(line.width, display_width(&line.text));
        }
    }

    #[test]
    fn scroll_mode_keeps_one_line_per_newline(text in plain_text(), width in width()) {
        let m = measure(&text, width, Overflow::Scroll, true);
        prop_assert_eq!(m.height(), text.split('\n').count());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Width monotonicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn hard_wrap_height_is_monotone(text in plain_text(), narrow in width(), extra in 0usize..20) {
        let tall = measure(&text, narrow, Overflow::Wrap, false).height();
        let short = measure(&text, narrow + extra, Overflow::Wrap, false).height();
        prop_assert!(short <= tall, "{} rows at {} but {} at {}", tall, narrow, short, narrow + extra);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Style neutrality
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn whole_text_style_does_not_change_layout(text in plain_text(), width in width(), on_word in any::<bool>()) {
        let styled = format!("\x1b[1;31m{text}\x1b[0m");
        let plain = measure(&text, width, Overflow::Wrap, on_word);
        let styled = measure(&styled, width, Overflow::Wrap, on_word);

        prop_assert_eq!(plain.height(), styled.height());
        for (a, b) in plain.lines().iter().zip(styled.lines()) {
            prop_assert_eq!(a.width, b.width);
            let stripped = strip_ansi(&b.text);
            prop_assert_eq!(a.text.as_str(), stripped.as_ref());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Measurement cache
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cached_measurement_matches_fresh(text in styled_text(), a in width(), b in width(), on_word in any::<bool>()) {
        let mut block = Block::new(text.clone());
        block.measure(a, Overflow::Wrap, on_word);
        block.measure(b, Overflow::Wrap, on_word);
        let cached = block.measure(a, Overflow::Wrap, on_word).clone();
        prop_assert_eq!(cached, measure(&text, a, Overflow::Wrap, on_word));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Scroll clamping
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn scroll_offsets_stay_in_bounds(
        lines in 1usize..40,
        height in 1u16..10,
        ops in prop::collection::vec(scroll_op(), 1..30),
    ) {
        let text = (0..lines).map(|i| "x".repeat(i % 30)).collect::<Vec<_>>().join("\n");
        let mut division = measured_division(&text, height);
        let geometry = *division.geometry().unwrap();
        prop_assert_eq!(geometry.max_scroll_y, lines.saturating_sub(usize::from(height)));

        for (op, amount) in ops {
            match op {
                0 => division.scroll_up(amount),
                1 => division.scroll_down(amount),
                2 => division.scroll_left(amount),
                3 => division.scroll_right(amount),
                _ => division.scroll_to(Some(amount * 3), Some(amount * 3)),
            };
            let (x, y) = division.scroll_position();
            prop_assert!(x <= geometry.max_scroll_x);
            prop_assert!(y <= geometry.max_scroll_y);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Scrollbar thumb
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn thumb_stays_inside_track(length in 0usize..50, total in 0usize..500, position in 0usize..600) {
        let range = thumb(length, total, position);
        prop_assert!(range.end <= length);
        if length > 0 {
            prop_assert!(!range.is_empty());
        }
        if total > length && position >= total - length {
            prop_assert_eq!(range.end, length, "thumb at the end of content is flush");
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Expression precedence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn evaluator_matches_precedence_fold(
        first in 0u8..50,
        rest in prop::collection::vec((prop::sample::select(vec!['+', '-', '*']), 0u8..50), 0..6),
    ) {
        let mut expr = first.to_string();
        for (op, value) in &rest {
            expr.push_str(&format!(" {op} {value}"));
        }
        let got = evaluate(&expr, &UnitResolver::None).unwrap();
        prop_assert_eq!(got, reference_fold(first, &rest), "{}", expr);
    }

    #[test]
    fn parentheses_group_before_precedence(a in 0u8..50, b in 0u8..50, c in 0u8..50) {
        let expr = format!("({a} + {b}) * {c}");
        let expected = (f64::from(a) + f64::from(b)) * f64::from(c);
        prop_assert_eq!(evaluate(&expr, &UnitResolver::None).unwrap(), expected);
    }
}
