// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use crate::attribute::{
    Attribute, AttributeCollection, AttributeKind, AttributeSet, Decoration, FontWeight,
    TextDirection, DEFAULT_FONT_SIZE,
};
use crate::layout::LayoutParams;
use crate::{Layout, RichText};

use super::utils::TestEnv;

#[test]
fn later_items_override_earlier() {
    let items = [Attribute::FontSize(12.0), Attribute::FontSize(20.0)];
    let set = AttributeSet::new(&items);
    assert_eq!(set.font_size(None), 20.0);
    assert_eq!(AttributeSet::EMPTY.font_size(None), DEFAULT_FONT_SIZE);
}

#[test]
fn children_override_parents() {
    let parent_items = [Attribute::FontSize(12.0), Attribute::bold()];
    let parent = AttributeSet::new(&parent_items);
    let child_items = [Attribute::FontSize(30.0)];
    let child = AttributeSet::with_parent(&child_items, &parent);
    assert_eq!(child.font_size(None), 30.0);
    assert_eq!(child.font_weight(None), FontWeight::BOLD);
    assert_eq!(parent.font_size(None), 12.0);
    assert_eq!(
        child.copy_flat(),
        [
            Attribute::FontSize(12.0),
            Attribute::bold(),
            Attribute::FontSize(30.0)
        ]
    );
}

#[test]
fn cumulative_kinds_collect_the_chain() {
    let parent_items = [Attribute::underline()];
    let parent = AttributeSet::new(&parent_items);
    let child_items = [Attribute::strikethrough()];
    let child = AttributeSet::with_parent(&child_items, &parent);
    let mut found = Vec::new();
    child.get_by_kind(AttributeKind::Decoration, None, &mut found);
    assert_eq!(found, [&Attribute::underline(), &Attribute::strikethrough()]);
}

#[test]
fn references_resolve_in_place() {
    let mut collection = AttributeCollection::new();
    let heading_items = [Attribute::FontSize(32.0), Attribute::bold()];
    let heading = collection.add("heading", &AttributeSet::new(&heading_items));
    assert_eq!(collection.find_by_name("heading"), Some(heading));
    assert_eq!(collection.name(heading), Some("heading"));

    // The reference is applied after the explicit size, so it wins.
    let items = [Attribute::FontSize(10.0), Attribute::Reference(heading)];
    let set = AttributeSet::new(&items);
    assert_eq!(set.font_size(Some(&collection)), 32.0);
    // Without a collection the reference is skipped.
    assert_eq!(set.font_size(None), 10.0);

    let items = [Attribute::Reference(heading), Attribute::FontSize(10.0)];
    let set = AttributeSet::new(&items);
    assert_eq!(set.font_size(Some(&collection)), 10.0);
    assert_eq!(set.font_weight(Some(&collection)), FontWeight::BOLD);
}

#[test]
fn reference_cycles_terminate() {
    let mut collection = AttributeCollection::new();
    let a = collection.add("a", &AttributeSet::EMPTY);
    let b_items = [Attribute::Reference(a)];
    let b = collection.add("b", &AttributeSet::new(&b_items));
    // Redefine `a` to point at `b`.
    let a_items = [Attribute::Reference(b)];
    assert_eq!(collection.add("a", &AttributeSet::new(&a_items)), a);
    let items = [Attribute::Reference(a)];
    let set = AttributeSet::new(&items);
    assert_eq!(set.font_size(Some(&collection)), DEFAULT_FONT_SIZE);
}

#[test]
fn groups() {
    let mut collection = AttributeCollection::new();
    let h1 = collection.add_to_group("h1", "heading", &AttributeSet::EMPTY);
    let h2 = collection.add_to_group("h2", "heading", &AttributeSet::EMPTY);
    let quote = collection.add("quote", &AttributeSet::EMPTY);
    assert!(collection.same_group(h1, h2));
    assert!(collection.same_group(quote, quote));
    assert!(!collection.same_group(h1, quote));
    assert_eq!(collection.group(h1), Some("heading"));
    assert_eq!(collection.len(), 3);
}

#[test]
fn defaults() {
    assert_eq!(
        Attribute::default_for(AttributeKind::TextDirection),
        Some(Attribute::TextDirection(TextDirection::Auto))
    );
    assert_eq!(Attribute::default_for(AttributeKind::Reference), None);
    assert!(AttributeKind::Decoration.is_cumulative());
    assert!(!AttributeKind::FontSize.is_cumulative());
}

#[test]
fn rich_text_spans_style_runs() {
    let mut env = TestEnv::new();
    let mut text = RichText::<Attribute>::from("plain bold");
    text.add_attribute(6..10, Attribute::bold()).unwrap();
    text.add_attribute(0..10, Attribute::Decoration(Decoration::underline()))
        .unwrap();
    let layout = Layout::build_rich_text(
        &mut env.layout_cx,
        &mut env.font_cx,
        &LayoutParams::default(),
        &text,
        &AttributeSet::EMPTY,
    );
    let weights: Vec<FontWeight> = layout
        .runs()
        .iter()
        .map(|run| layout.styles()[run.style_idx as usize].weight)
        .collect();
    assert_eq!(weights, [FontWeight::NORMAL, FontWeight::BOLD]);
    // Both runs are underlined, and the underline is merged across them.
    assert_eq!(layout.decorations().len(), 1);
}
