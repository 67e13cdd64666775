// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use peniko::kurbo::Rect;

use crate::layout::{Affinity, MovementType, TextPosition};

use super::utils::{TestEnv, CHAR, SIZE};

fn nearly(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn grapheme_navigation() {
    let mut env = TestEnv::new();
    // e + combining acute, then a family emoji.
    let layout = env.layout("e\u{0301}x\u{1F468}\u{200D}\u{1F469}", 0.0);
    assert_eq!(layout.next_grapheme_offset(0), 2);
    assert_eq!(layout.next_grapheme_offset(2), 3);
    assert_eq!(layout.next_grapheme_offset(3), 6);
    assert_eq!(layout.prev_grapheme_offset(6), 3);
    assert_eq!(layout.prev_grapheme_offset(2), 0);
    assert_eq!(layout.align_grapheme_offset(1), 0);
    assert_eq!(layout.align_grapheme_offset(4), 3);
    assert_eq!(layout.align_grapheme_offset(99), 6);
}

#[test]
fn word_navigation() {
    let mut env = TestEnv::new();
    let layout = env.layout("one two  three", 0.0);
    assert_eq!(layout.word_start_at(5), 4);
    assert_eq!(layout.word_end_at(5), 7);
    assert_eq!(layout.next_word_offset(0), 4);
    assert_eq!(layout.next_word_offset(4), 9);
    assert_eq!(layout.prev_word_offset(9), 4);
    assert_eq!(layout.prev_word_offset(4), 0);
    assert_eq!(layout.next_word_offset(14), 14);
}

#[test]
fn caret_positions() {
    let mut env = TestEnv::new();
    let layout = env.layout("abc", 0.0);
    let caret = layout.caret_info(TextPosition::leading(1));
    assert!(nearly(caret.x, CHAR));
    assert!(nearly(caret.height, SIZE));
    let caret = layout.caret_info(TextPosition::trailing(1));
    assert!(nearly(caret.x, 2.0 * CHAR));
    // Past the end the caret sits after the last grapheme.
    let caret = layout.caret_info(TextPosition::leading(3));
    assert!(nearly(caret.x, 3.0 * CHAR));
}

#[test]
fn hit_test_ltr() {
    let mut env = TestEnv::new();
    let layout = env.layout("abc", 0.0);
    assert_eq!(
        layout.hit_test(MovementType::Caret, CHAR * 1.4, 4.0),
        TextPosition::leading(1)
    );
    assert_eq!(
        layout.hit_test(MovementType::Caret, CHAR * 1.6, 4.0),
        TextPosition::leading(2)
    );
    assert_eq!(
        layout.hit_test(MovementType::Caret, -10.0, 4.0),
        TextPosition::leading(0)
    );
    assert_eq!(
        layout.hit_test(MovementType::Caret, 100.0, 4.0),
        TextPosition::leading(3)
    );
}

#[test]
fn hit_test_picks_line_by_y() {
    let mut env = TestEnv::new();
    let layout = env.layout("ab\ncd", 0.0);
    let pos = layout.hit_test(MovementType::Caret, 0.0, SIZE + 2.0);
    assert_eq!(pos, TextPosition::leading(3));
    // Below the last line clamps to it.
    let pos = layout.hit_test(MovementType::Caret, 0.0, 10.0 * SIZE);
    assert_eq!(pos, TextPosition::leading(3));
}

#[test]
fn affinity_at_direction_change() {
    let mut env = TestEnv::new();
    // "ab" followed by two Hebrew letters, shown right to left after it.
    let layout = env.layout("ab\u{05D0}\u{05D1}", 0.0);
    let boundary = 2.0 * CHAR;
    let before = layout.hit_test(MovementType::Selection, boundary - 0.1, 4.0);
    let after = layout.hit_test(MovementType::Selection, boundary + 0.1, 4.0);
    assert_eq!(before, TextPosition::trailing(1));
    assert_eq!(after, TextPosition::trailing(3));
    assert_ne!(before, after, "both sides of the boundary are distinct positions");
    assert!(nearly(layout.caret_info(before).x, boundary));
    assert!(nearly(layout.caret_info(after).x, boundary));
    assert!(!layout.caret_info(before).is_rtl);
    assert!(layout.caret_info(after).is_rtl);
}

#[test]
fn line_start_and_end() {
    let mut env = TestEnv::new();
    let layout = env.layout("ab\ncd", 0.0);
    assert_eq!(
        layout.line_start_at(4),
        TextPosition::new(3, Affinity::StartOfLine)
    );
    assert_eq!(layout.line_end_at(1), TextPosition::leading(2));
    assert_eq!(layout.line_end_at(4), TextPosition::leading(5));
    let wrapped = env.layout_with(
        "aaaa bbbb",
        6.0 * CHAR,
        &[crate::attribute::Attribute::TextWrap(crate::attribute::TextWrap::Word)],
    );
    assert_eq!(wrapped.lines().len(), 2);
    assert_eq!(
        wrapped.line_end_at(0),
        TextPosition::new(4, Affinity::EndOfLine)
    );
}

#[test]
fn visual_movement() {
    let mut env = TestEnv::new();
    let layout = env.layout("ab", 0.0);
    let pos = layout.move_position_right(TextPosition::leading(0));
    assert_eq!(pos, TextPosition::leading(1));
    let pos = layout.move_position_right(pos);
    assert_eq!(layout.insert_offset(pos), 2);
    // Cannot move past the end.
    assert_eq!(layout.move_position_right(pos), pos);
    let pos = layout.move_position_left(TextPosition::leading(2));
    assert_eq!(pos, TextPosition::leading(1));
    assert_eq!(
        layout.move_position_left(TextPosition::leading(0)),
        TextPosition::leading(0)
    );
}

#[test]
fn selection_rectangles() {
    let mut env = TestEnv::new();
    let layout = env.layout("abcd", 0.0);
    let mut rects: Vec<Rect> = Vec::new();
    layout.selection_bounds(1..3, |r| rects.push(r));
    assert_eq!(rects.len(), 1);
    assert!((rects[0].x0 - f64::from(CHAR)).abs() < 0.01);
    assert!((rects[0].x1 - f64::from(3.0 * CHAR)).abs() < 0.01);
    assert!((rects[0].height() - f64::from(SIZE)).abs() < 0.01);
    rects.clear();
    layout.selection_bounds(2..2, |r| rects.push(r));
    assert!(rects.is_empty());
}
