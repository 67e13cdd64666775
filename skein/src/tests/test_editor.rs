// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;

use peniko::kurbo::Rect;

use crate::attribute::{Attribute, AttributeCollection, AttributeSet, ListMarker, ParagraphPadding};
use crate::editor::{Editor, EditorParams, Key, Modifiers, TextSelection};
use crate::layout::TextPosition;

use super::utils::{TestEnv, CHAR, SIZE};

fn caret(offset: usize) -> TextSelection {
    TextSelection::caret(TextPosition::leading(offset))
}

fn range(start: usize, end: usize) -> TextSelection {
    TextSelection::new(TextPosition::leading(start), TextPosition::leading(end))
}

#[test]
fn new_editor_has_one_empty_paragraph() {
    let editor = Editor::new(EditorParams::default());
    assert_eq!(editor.paragraph_count(), 1);
    assert_eq!(editor.get_text_utf8(), "");
    assert_eq!(editor.text_len(), 0);
    assert!(!editor.can_undo());
}

#[test]
fn utf8_round_trip() {
    let mut env = TestEnv::new();
    let text = "Hello\nwörld \u{1F44B}\r\nend\u{2029}";
    let editor = env.editor(text);
    assert_eq!(editor.get_text_utf8(), text);
    assert_eq!(editor.paragraph_count(), 4);
    let chars: Vec<char> = text.chars().collect();
    assert_eq!(editor.get_text_utf32(), chars);
    let starts: Vec<usize> = editor.paragraphs().iter().map(|p| p.text_start()).collect();
    assert_eq!(starts, [0, 6, 15, 19]);
    assert_eq!(editor.selection(), caret(19));
}

#[test]
fn bold_toggle_over_selection() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let bold = Attribute::bold();
    let mut drv = env.driver(&mut editor);
    drv.insert_text_utf8("Hello");
    drv.select_all();
    drv.toggle_attribute(bold.clone());
    assert!(drv.editor.is_attribute_active(&bold));
    assert_eq!(drv.editor.get_attribute_count(&bold), 5);
    drv.toggle_attribute(bold.clone());
    assert!(!drv.editor.is_attribute_active(&bold));
    assert_eq!(drv.editor.get_attribute_count(&bold), 0);
    assert_eq!(editor.get_text_utf8(), "Hello");
}

#[test]
fn partial_selection_toggle_sets_all() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("abcd");
    let bold = Attribute::bold();
    let mut drv = env.driver(&mut editor);
    drv.set_selection(range(0, 2));
    drv.toggle_attribute(bold.clone());
    drv.set_selection(range(0, 4));
    assert_eq!(drv.editor.get_attribute_count(&bold), 2);
    assert!(!drv.editor.is_attribute_active(&bold));
    // Not all of the selection is bold, so toggling makes all of it bold.
    drv.toggle_attribute(bold.clone());
    assert!(drv.editor.is_attribute_active(&bold));
}

#[test]
fn inline_attributes_across_paragraphs() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\ncd");
    let bold = Attribute::bold();
    let is_bold = |a: &Attribute| *a == bold;
    let mut drv = env.driver(&mut editor);
    drv.set_selection(range(1, 4));
    drv.apply_attribute(bold.clone());
    let first = drv.editor.paragraphs()[0].text();
    let second = drv.editor.paragraphs()[1].text();
    assert!(first.attributes_at(0).next().is_none());
    assert!(first.covers(1..2, is_bold));
    assert!(second.covers(0..1, is_bold));
    assert!(second.attributes_at(1).next().is_none());
    drv.clear_attribute(&bold);
    assert!(!drv.editor.paragraphs()[0].text().covers(1..2, is_bold));
    assert!(drv.editor.paragraphs()[1].text().attributes_at(0).next().is_none());
}

#[test]
fn toggle_with_empty_selection_changes_typing_attributes() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab");
    let bold = Attribute::bold();
    let mut drv = env.driver(&mut editor);
    drv.toggle_attribute(bold.clone());
    assert!(drv.editor.is_attribute_active(&bold));
    assert!(drv.editor.active_attributes().contains(&bold));
    drv.insert_text_utf8("c");
    let text = editor.paragraphs()[0].text();
    assert!(text.attributes_at(2).any(|a| *a == bold));
    assert!(text.attributes_at(1).next().is_none());
}

#[test]
fn backspace_at_paragraph_start_merges() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("A\nB");
    assert_eq!(editor.paragraph_count(), 2);
    let mut drv = env.driver(&mut editor);
    drv.set_selection(caret(2));
    drv.process_key_pressed(Key::Backspace, Modifiers::NONE);
    assert_eq!(editor.paragraph_count(), 1);
    assert_eq!(editor.get_text_utf8(), "AB");
    assert_eq!(editor.selection_range(), 1..1);
}

#[test]
fn backspace_removes_emoji_sequences() {
    let mut env = TestEnv::new();
    let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}";
    let mut editor = env.editor(&alloc::format!("a{family}"));
    env.driver(&mut editor).backdelete();
    assert_eq!(editor.get_text_utf8(), "a");
    // Combining marks go one at a time.
    let mut editor = env.editor("e\u{0301}");
    env.driver(&mut editor).backdelete();
    assert_eq!(editor.get_text_utf8(), "e");
}

#[test]
fn delete_and_word_deletion() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("one two");
    let mut drv = env.driver(&mut editor);
    drv.process_key_pressed(Key::Backspace, Modifiers::CONTROL);
    assert_eq!(drv.editor.get_text_utf8(), "one ");
    drv.set_selection(caret(0));
    drv.process_key_pressed(Key::Delete, Modifiers::NONE);
    assert_eq!(drv.editor.get_text_utf8(), "ne ");
    drv.process_key_pressed(Key::Delete, Modifiers::CONTROL);
    assert_eq!(drv.editor.get_text_utf8(), "");
}

#[test]
fn transaction_undoes_atomically() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab");
    let bold = Attribute::bold();
    let before = editor.paragraphs()[0].text().clone();
    let mut drv = env.driver(&mut editor);
    drv.undo_transaction_begin();
    drv.insert_text_utf8("x");
    drv.set_selection(range(0, 3));
    drv.apply_attribute(bold.clone());
    drv.set_selection(caret(3));
    drv.insert_text_utf8("y");
    drv.undo_transaction_end();
    let after = drv.editor.paragraphs()[0].text().clone();
    assert_eq!(after.to_utf8(), "abxy");
    assert!(after.attributes_at(2).any(|a| *a == bold));

    assert!(drv.undo());
    assert_eq!(*drv.editor.paragraphs()[0].text(), before);
    assert_eq!(drv.editor.selection(), caret(2));
    assert!(!drv.editor.can_undo());
    assert!(!drv.undo());

    assert!(drv.redo());
    assert_eq!(*drv.editor.paragraphs()[0].text(), after);
    assert!(!drv.redo());
}

#[test]
fn each_edit_is_one_undo_step() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let mut drv = env.driver(&mut editor);
    drv.insert_text_utf8("a");
    drv.insert_text_utf8("b");
    assert!(drv.undo());
    assert_eq!(drv.editor.get_text_utf8(), "a");
    drv.process_key_pressed(Key::Character('z'), Modifiers::CONTROL);
    assert_eq!(drv.editor.get_text_utf8(), "");
    drv.process_key_pressed(Key::Character('z'), Modifiers::CONTROL | Modifiers::SHIFT);
    assert_eq!(drv.editor.get_text_utf8(), "a");
    drv.process_key_pressed(Key::Character('y'), Modifiers::CONTROL);
    assert_eq!(drv.editor.get_text_utf8(), "ab");
    // A new edit drops the redo history.
    drv.undo();
    drv.insert_text_utf8("c");
    assert!(!drv.editor.can_redo());
}

#[test]
fn set_text_clears_history() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let mut drv = env.driver(&mut editor);
    drv.insert_text_utf8("a");
    assert!(drv.editor.can_undo());
    drv.set_text_utf8("b");
    assert!(!drv.editor.can_undo());
}

#[test]
fn selection_snaps_to_graphemes() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("e\u{0301}x");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(range(1, 99));
    assert_eq!(drv.editor.selection(), range(0, 3));
}

#[test]
fn insert_before_combining_mark_moves_past_the_grapheme() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("\u{0301}");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(caret(0));
    drv.insert_text_utf8("e");
    assert_eq!(drv.editor.get_text_utf8(), "e\u{0301}");
    assert_eq!(drv.editor.selection(), caret(2));
    drv.undo();
    assert_eq!(drv.editor.selection(), caret(0));
    drv.redo();
    assert_eq!(drv.editor.selection(), caret(2));
}

#[test]
fn committed_composition_joining_a_grapheme_keeps_caret_on_boundary() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("\u{0301}x");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(caret(0));
    drv.set_composition_utf32(&['e'], 1);
    drv.commit_composition_utf32(None);
    assert_eq!(drv.editor.get_text_utf8(), "e\u{0301}x");
    assert_eq!(drv.editor.selection(), caret(2));
}

#[test]
fn delete_that_joins_jamo_snaps_caret_to_grapheme_start() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("\u{1100}a\u{1161}");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(range(1, 2));
    drv.delete();
    assert_eq!(drv.editor.get_text_utf8(), "\u{1100}\u{1161}");
    assert_eq!(drv.editor.selection(), caret(0));
    drv.insert_text_utf8("b");
    assert_eq!(drv.editor.get_text_utf8(), "b\u{1100}\u{1161}");
}

#[test]
fn enter_splits_paragraph_and_keeps_its_attributes() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("abcd");
    let bullet = Attribute::ListMarker(ListMarker::bullet());
    let mut drv = env.driver(&mut editor);
    drv.set_paragraph_attribute(bullet.clone());
    drv.set_selection(caret(2));
    drv.process_key_pressed(Key::Enter, Modifiers::NONE);
    assert_eq!(editor.paragraph_count(), 2);
    assert_eq!(editor.paragraphs()[0].text().to_utf8(), "ab\n");
    assert_eq!(editor.paragraphs()[1].text().to_utf8(), "cd");
    assert_eq!(editor.paragraphs()[1].attributes(), [bullet]);
    assert_eq!(editor.selection(), caret(3));
}

#[test]
fn shift_enter_breaks_line_within_paragraph() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("abcd");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(caret(2));
    drv.process_key_pressed(Key::Enter, Modifiers::SHIFT);
    assert_eq!(editor.paragraph_count(), 1);
    assert_eq!(editor.get_text_utf8(), "ab\u{2028}cd");
    assert_eq!(editor.paragraphs()[0].layout().lines().len(), 2);
}

#[test]
fn paragraphs_stack_vertically() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\ncd\nef");
    let ys: Vec<f32> = editor.paragraphs().iter().map(|p| p.y()).collect();
    assert_eq!(ys, [0.0, SIZE, 2.0 * SIZE]);
    let mut drv = env.driver(&mut editor);
    drv.set_selection(caret(0));
    drv.set_paragraph_attribute(Attribute::ParagraphPadding(ParagraphPadding {
        before: 4.0,
        after: 6.0,
    }));
    let first = &editor.paragraphs()[0];
    assert_eq!(first.y(), 4.0);
    assert_eq!(first.advance_y(), 4.0 + SIZE + 6.0);
    assert_eq!(editor.paragraphs()[1].y(), 10.0 + SIZE);
}

#[test]
fn paragraph_attributes_cover_touched_paragraphs() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\ncd\nef");
    let bullet = Attribute::ListMarker(ListMarker::bullet());
    let mut drv = env.driver(&mut editor);
    // Ends at the start of the last paragraph, which is not touched.
    drv.set_selection(range(1, 6));
    drv.set_paragraph_attribute(bullet.clone());
    let marked: Vec<bool> = editor
        .paragraphs()
        .iter()
        .map(|p| p.attributes().contains(&bullet))
        .collect();
    assert_eq!(marked, [true, true, false]);
    let mut drv = env.driver(&mut editor);
    drv.select_all();
    drv.clear_paragraph_attribute(&bullet);
    assert!(editor.paragraphs().iter().all(|p| p.attributes().is_empty()));
}

#[test]
fn grouped_paragraph_styles_replace_each_other() {
    let mut env = TestEnv::new();
    let mut collection = AttributeCollection::new();
    let h1_items = [Attribute::FontSize(32.0)];
    let h1 = collection.add_to_group("h1", "heading", &AttributeSet::new(&h1_items));
    let h2_items = [Attribute::FontSize(24.0)];
    let h2 = collection.add_to_group("h2", "heading", &AttributeSet::new(&h2_items));
    let mut params = TestEnv::params();
    params.attribute_collection = Some(Arc::new(collection));
    let mut editor = Editor::new(params);
    let mut drv = env.driver(&mut editor);
    drv.set_text_utf8("Title");
    drv.set_paragraph_attribute(Attribute::Reference(h1));
    assert_eq!(drv.editor.paragraphs()[0].layout().height(), 32.0);
    drv.set_paragraph_attribute(Attribute::Reference(h2));
    assert_eq!(
        drv.editor.paragraphs()[0].attributes(),
        [Attribute::Reference(h2)]
    );
    assert_eq!(drv.editor.paragraphs()[0].layout().height(), 24.0);
}

#[test]
fn document_keeps_one_paragraph() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\ncd\nef");
    let mut drv = env.driver(&mut editor);
    drv.select_all();
    drv.delete_selection();
    assert_eq!(editor.paragraph_count(), 1);
    assert_eq!(editor.get_text_utf8(), "");
}

#[test]
fn arrows_cross_paragraphs() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\ncd");
    let mut drv = env.driver(&mut editor);
    drv.process_key_pressed(Key::Home, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 3..3);
    drv.process_key_pressed(Key::Left, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 2..2);
    drv.process_key_pressed(Key::Right, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 3..3);
    drv.process_key_pressed(Key::End, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 5..5);
    drv.process_key_pressed(Key::Left, Modifiers::SHIFT);
    assert_eq!(drv.editor.get_selection_text_utf8(), "d");
    drv.process_key_pressed(Key::Home, Modifiers::CONTROL);
    assert_eq!(drv.editor.selection_range(), 0..0);
    drv.process_key_pressed(Key::End, Modifiers::CONTROL);
    assert_eq!(drv.editor.selection_range(), 5..5);
}

#[test]
fn arrows_collapse_selection() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("abc");
    let mut drv = env.driver(&mut editor);
    drv.select_all();
    drv.process_key_pressed(Key::Left, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 0..0);
    drv.select_all();
    drv.process_key_pressed(Key::Right, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 3..3);
    drv.process_key_pressed(Key::Character('a'), Modifiers::CONTROL);
    assert_eq!(drv.editor.selection_range(), 0..3);
    drv.process_key_pressed(Key::Escape, Modifiers::NONE);
    assert!(drv.editor.selection_range().is_empty());
}

#[test]
fn word_movement() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("one two");
    let mut drv = env.driver(&mut editor);
    drv.process_key_pressed(Key::Left, Modifiers::CONTROL);
    assert_eq!(drv.editor.selection_range(), 4..4);
    drv.process_key_pressed(Key::Left, Modifiers::CONTROL | Modifiers::SHIFT);
    assert_eq!(drv.editor.get_selection_text_utf8(), "one ");
    drv.process_key_pressed(Key::Right, Modifiers::CONTROL);
    assert_eq!(drv.editor.selection_range(), 4..4);
}

#[test]
fn vertical_movement_keeps_column() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("abcd\nxy\nabcd");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(caret(3));
    drv.process_key_pressed(Key::Down, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 7..7);
    drv.process_key_pressed(Key::Down, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 11..11);
    drv.process_key_pressed(Key::Up, Modifiers::NONE);
    drv.process_key_pressed(Key::Up, Modifiers::NONE);
    assert_eq!(drv.editor.selection_range(), 3..3);
}

#[test]
fn click_counts_select_words_and_lines() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("hello world");
    let mut drv = env.driver(&mut editor);
    let x = 2.2 * CHAR;
    drv.process_mouse_click(x, 4.0, Modifiers::NONE, 1000);
    assert_eq!(drv.editor.selection_range(), 2..2);
    drv.process_mouse_click(x, 4.0, Modifiers::NONE, 1100);
    assert_eq!(drv.editor.get_selection_text_utf8(), "hello");
    drv.process_mouse_click(x, 4.0, Modifiers::NONE, 1200);
    assert_eq!(drv.editor.get_selection_text_utf8(), "hello world");
    // Too late for a repeat.
    drv.process_mouse_click(x, 4.0, Modifiers::NONE, 5000);
    assert_eq!(drv.editor.selection_range(), 2..2);
}

#[test]
fn drag_extends_by_word_and_never_shrinks() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("hello world");
    let mut drv = env.driver(&mut editor);
    let x = 2.2 * CHAR;
    drv.process_mouse_click(x, 4.0, Modifiers::NONE, 1000);
    drv.process_mouse_click(x, 4.0, Modifiers::NONE, 1100);
    drv.process_mouse_drag(8.2 * CHAR, 4.0);
    assert_eq!(drv.editor.get_selection_text_utf8(), "hello world");
    drv.process_mouse_drag(1.0, 4.0);
    assert_eq!(drv.editor.get_selection_text_utf8(), "hello");
}

#[test]
fn shift_click_extends() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("hello world");
    let mut drv = env.driver(&mut editor);
    drv.process_mouse_click(2.2 * CHAR, 4.0, Modifiers::NONE, 1000);
    drv.process_mouse_click(8.2 * CHAR, 4.0, Modifiers::SHIFT, 1100);
    assert_eq!(drv.editor.get_selection_text_utf8(), "llo wo");
}

#[test]
fn click_below_text_hits_last_paragraph() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\ncd");
    let mut drv = env.driver(&mut editor);
    drv.process_mouse_click(0.5, 10.0 * SIZE, Modifiers::NONE, 1000);
    assert_eq!(drv.editor.selection_range(), 3..3);
}

#[test]
fn ime_composition() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab");
    let mut drv = env.driver(&mut editor);
    drv.set_composition_utf32(&['x', 'y'], 1);
    assert!(drv.editor.is_composing());
    assert_eq!(drv.editor.get_text_utf8(), "ab");
    assert_eq!(drv.editor.paragraphs()[0].layout().text_len(), 4);
    assert!(!drv.editor.paragraphs()[0].layout().decorations().is_empty());
    assert!((drv.editor.caret_info().x - 3.0 * CHAR).abs() < 0.01);
    let rect = drv.editor.input_rect();
    assert!((rect.x0 - f64::from(2.0 * CHAR)).abs() < 0.01);
    assert!((rect.x1 - f64::from(4.0 * CHAR)).abs() < 0.01);

    drv.commit_composition_utf32(None);
    assert!(!drv.editor.is_composing());
    assert_eq!(drv.editor.get_text_utf8(), "abxy");
    assert_eq!(drv.editor.selection_range(), 4..4);

    drv.set_composition_utf32(&['z'], 1);
    drv.clear_composition();
    assert_eq!(drv.editor.get_text_utf8(), "abxy");
    assert_eq!(drv.editor.paragraphs()[0].layout().text_len(), 4);
}

#[test]
fn composition_replaces_selection() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("abc");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(range(1, 3));
    drv.set_composition_utf32(&['x'], 1);
    drv.commit_composition_utf32(Some(&['y', 'z']));
    assert_eq!(drv.editor.get_text_utf8(), "ayz");
}

#[test]
fn paste_normalizes_line_endings() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    env.driver(&mut editor).paste_utf8("a\r\nb\rc");
    assert_eq!(editor.get_text_utf8(), "a\nb\nc");
    assert_eq!(editor.paragraph_count(), 3);
}

#[test]
fn selection_bounds_span_paragraphs() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\ncd");
    env.driver(&mut editor).select_all();
    let mut rects: Vec<Rect> = Vec::new();
    editor.iterate_selection_bounds(|r| rects.push(r));
    assert_eq!(rects.len(), 2);
    assert!((rects[0].x1 - f64::from(2.0 * CHAR)).abs() < 0.01);
    assert!((rects[1].y0 - f64::from(SIZE)).abs() < 0.01);
}

#[test]
fn width_changes_rewrap() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("aaaa bbbb");
    assert_eq!(editor.paragraphs()[0].layout().lines().len(), 1);
    editor.set_width(6.0 * CHAR);
    env.driver(&mut editor).refresh_layout();
    assert_eq!(editor.paragraphs()[0].layout().lines().len(), 2);
    assert_eq!(editor.paragraphs()[0].advance_y(), 2.0 * SIZE);
}

#[test]
fn change_callback() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    editor.set_on_change(move |_| counter.set(counter.get() + 1));
    let mut drv = env.driver(&mut editor);
    drv.insert_text_utf8("a");
    assert_eq!(count.get(), 1);
    drv.undo_transaction_begin();
    drv.insert_text_utf8("b");
    drv.insert_text_utf8("c");
    assert_eq!(count.get(), 1);
    drv.undo_transaction_end();
    assert_eq!(count.get(), 2);
    drv.undo();
    assert_eq!(count.get(), 3);
}
