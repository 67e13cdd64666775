// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::attribute::{
    Attribute, AttributeSet, Decoration, DecorationPosition, HorizontalAlign, ListMarker, TextWrap,
};
use crate::layout::LayoutParams;
use crate::Layout;

use super::utils::{TestEnv, CHAR, SIZE};

#[test]
fn empty_layout() {
    let mut env = TestEnv::new();
    let layout = env.layout("", 0.0);
    assert!(layout.glyphs().is_empty(), "no glyphs for empty text");
    assert_eq!(layout.lines().len(), 1, "an empty layout still has a line");
    assert_eq!(layout.lines()[0].height(), SIZE);
    assert_eq!(layout.bounds().width(), 0.0);
    assert_eq!(layout.height(), SIZE);
}

#[test]
fn single_line_geometry() {
    let mut env = TestEnv::new();
    let layout = env.layout("abc", 0.0);
    assert_eq!(layout.glyphs().len(), 3);
    assert_eq!(layout.lines().len(), 1);
    let gids: alloc::vec::Vec<u32> = layout.glyphs().iter().map(|g| g.gid).collect();
    assert_eq!(gids, ['a' as u32, 'b' as u32, 'c' as u32]);
    assert_eq!(layout.glyphs()[1].offset_x, CHAR);
    assert!((layout.bounds().width() - f64::from(3.0 * CHAR)).abs() < 0.01);
}

#[test]
fn builds_are_idempotent() {
    let mut env = TestEnv::new();
    let a = env.layout("Hello world, again", 60.0);
    let b = env.layout("Hello world, again", 60.0);
    assert_eq!(a, b);
}

#[test]
fn word_wrap_keeps_words_whole() {
    let mut env = TestEnv::new();
    let layout = env.layout_with(
        "aaaa bbbb cccc",
        100.0,
        &[Attribute::FontSize(20.0), Attribute::TextWrap(TextWrap::Word)],
    );
    let lines = layout.lines();
    assert_eq!(lines.len(), 2, "two words fit on the first line");
    assert_eq!(lines[0].text_range, 0..10);
    assert_eq!(lines[1].text_range, 10..14);
}

#[test]
fn no_wrap_without_wrap_attribute() {
    let mut env = TestEnv::new();
    let layout = env.layout("aaaa bbbb cccc", 40.0);
    assert_eq!(layout.lines().len(), 1);
}

#[test]
fn mandatory_breaks_start_lines() {
    let mut env = TestEnv::new();
    let layout = env.layout("ab\ncd\u{2028}ef", 0.0);
    assert_eq!(layout.lines().len(), 3);
    assert_eq!(layout.lines()[1].top(), SIZE);
    // A trailing break does not add an empty line.
    let layout = env.layout("ab\n", 0.0);
    assert_eq!(layout.lines().len(), 1);
}

#[test]
fn ignore_must_line_breaks() {
    let mut env = TestEnv::new();
    let items = [Attribute::FontSize(SIZE)];
    let mut params = LayoutParams::new(0.0, 0.0).with_attributes(AttributeSet::new(&items));
    params.ignore_must_line_breaks = true;
    let layout = Layout::build_utf8(
        &mut env.layout_cx,
        &mut env.font_cx,
        &params,
        "ab\ncd",
        &AttributeSet::default(),
    );
    assert_eq!(layout.lines().len(), 1);
}

#[test]
fn alignment_moves_lines() {
    let mut env = TestEnv::new();
    let layout = env.layout_with(
        "ab",
        100.0,
        &[Attribute::HorizontalAlign(HorizontalAlign::Right)],
    );
    let x0 = layout.lines()[0].bounds.x0;
    assert!((x0 - f64::from(100.0 - 2.0 * CHAR)).abs() < 0.01, "{x0}");
    let layout = env.layout_with(
        "ab",
        100.0,
        &[Attribute::HorizontalAlign(HorizontalAlign::Center)],
    );
    let x0 = layout.lines()[0].bounds.x0;
    assert!((x0 - f64::from(50.0 - CHAR)).abs() < 0.01, "{x0}");
}

#[test]
fn rtl_paragraph_is_detected() {
    let mut env = TestEnv::new();
    assert!(env.layout("\u{05D0}\u{05D1} ab", 0.0).is_rtl());
    assert!(!env.layout("ab \u{05D0}\u{05D1}", 0.0).is_rtl());
    assert!(!env.layout("", 0.0).is_rtl());
}

#[test]
fn decorations_follow_runs() {
    let mut env = TestEnv::new();
    let layout = env.layout_with("abcd", 0.0, &[Attribute::Decoration(Decoration::underline())]);
    let decorations = layout.decorations();
    assert_eq!(decorations.len(), 1);
    assert_eq!(decorations[0].position, DecorationPosition::Underline);
    assert!((decorations[0].length - 4.0 * CHAR).abs() < 0.01);
}

#[test]
fn list_marker_indents_text() {
    let mut env = TestEnv::new();
    let marker = ListMarker::bullet();
    let layout = env.layout_with("ab", 0.0, &[Attribute::ListMarker(marker)]);
    let first = layout.glyphs().iter().find(|g| g.gid == 'a' as u32);
    let x = first.map(|g| g.offset_x).unwrap_or_default();
    assert!((x - marker.indent).abs() < 0.01, "{x}");
}

#[test]
fn fixed_line_height() {
    let mut env = TestEnv::new();
    let layout = env.layout_with(
        "ab\ncd",
        0.0,
        &[Attribute::LineHeight(crate::attribute::LineHeight::Absolute(30.0))],
    );
    assert_eq!(layout.lines().len(), 2);
    assert!((layout.height() - 60.0).abs() < 0.01);
}
