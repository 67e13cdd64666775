// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::attribute::{Attribute, AttributeCollection, AttributeSet, ListMarker};
use crate::editor::{Editor, Key, Modifiers, TextSelection};
use crate::layout::TextPosition;
use crate::rules::{markdown_rules, EditorRule, EditorRuleSet, MarkdownStyles, RuleCondition};

use super::utils::TestEnv;

fn bullet() -> Attribute {
    Attribute::ListMarker(ListMarker::bullet())
}

/// Type `text` the way a host would, offering each character to `rules` first.
fn type_text(env: &mut TestEnv, editor: &mut Editor, rules: &EditorRuleSet, text: &str) {
    let mut drv = env.driver(editor);
    for ch in text.chars() {
        if !rules.process(&mut drv, Key::Character(ch), Modifiers::NONE) {
            drv.insert_codepoint(ch);
        }
    }
}

#[test]
fn prefix_sets_paragraph_attribute() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let rules = markdown_rules(&MarkdownStyles::default());
    type_text(&mut env, &mut editor, &rules, "- item");
    assert_eq!(editor.get_text_utf8(), "item");
    assert_eq!(editor.paragraphs()[0].attributes(), [bullet()]);

    // Undo the typed characters, then the shortcut itself.
    let mut drv = env.driver(&mut editor);
    while !drv.editor.get_text_utf8().is_empty() {
        assert!(drv.undo());
    }
    assert!(drv.undo());
    assert_eq!(drv.editor.get_text_utf8(), "-");
    assert!(drv.editor.paragraphs()[0].attributes().is_empty());
    assert_eq!(
        drv.editor.selection(),
        TextSelection::caret(TextPosition::leading(1))
    );
}

#[test]
fn prefix_only_matches_whole_paragraph_start() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let rules = markdown_rules(&MarkdownStyles::default());
    type_text(&mut env, &mut editor, &rules, "a- b");
    assert_eq!(editor.get_text_utf8(), "a- b");
    assert!(editor.paragraphs()[0].attributes().is_empty());
}

#[test]
fn numbered_prefix() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let rules = markdown_rules(&MarkdownStyles::default());
    type_text(&mut env, &mut editor, &rules, "1. first");
    assert_eq!(editor.get_text_utf8(), "first");
    assert_eq!(
        editor.paragraphs()[0].attributes(),
        [Attribute::ListMarker(ListMarker::numbered())]
    );
}

#[test]
fn heading_prefixes_use_collection_styles() {
    let mut env = TestEnv::new();
    let mut collection = AttributeCollection::new();
    let h1_items = [Attribute::FontSize(32.0)];
    let h1 = collection.add_to_group("h1", "heading", &AttributeSet::new(&h1_items));
    let h2_items = [Attribute::FontSize(24.0)];
    let h2 = collection.add_to_group("h2", "heading", &AttributeSet::new(&h2_items));
    let styles = MarkdownStyles::from_collection(&collection);
    assert_eq!(styles.heading1, Some(Attribute::Reference(h1)));
    assert_eq!(styles.heading2, Some(Attribute::Reference(h2)));
    assert_eq!(styles.heading3, None);
    assert_eq!(styles.quote, None);

    let mut params = TestEnv::params();
    params.attribute_collection = Some(Arc::new(collection));
    let mut editor = Editor::new(params);
    let rules = markdown_rules(&styles);
    type_text(&mut env, &mut editor, &rules, "## Title");
    assert_eq!(editor.get_text_utf8(), "Title");
    assert_eq!(editor.paragraphs()[0].attributes(), [Attribute::Reference(h2)]);
    assert_eq!(editor.paragraphs()[0].layout().height(), 24.0);
}

#[test]
fn enter_in_empty_item_leaves_the_list() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let rules = markdown_rules(&MarkdownStyles::default());
    type_text(&mut env, &mut editor, &rules, "- a");

    let mut drv = env.driver(&mut editor);
    // Not empty, so Enter starts a new item.
    assert!(!rules.process(&mut drv, Key::Enter, Modifiers::NONE));
    drv.process_key_pressed(Key::Enter, Modifiers::NONE);
    assert_eq!(drv.editor.paragraph_count(), 2);
    assert_eq!(drv.editor.paragraphs()[1].attributes(), [bullet()]);

    assert!(rules.process(&mut drv, Key::Enter, Modifiers::NONE));
    assert_eq!(drv.editor.paragraph_count(), 2);
    assert!(drv.editor.paragraphs()[1].attributes().is_empty());
    assert_eq!(drv.editor.paragraphs()[0].attributes(), [bullet()]);
}

#[test]
fn backspace_at_item_start_clears_marker() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let rules = markdown_rules(&MarkdownStyles::default());
    type_text(&mut env, &mut editor, &rules, "- item");

    let mut drv = env.driver(&mut editor);
    // Inside the text Backspace is left to the editor.
    assert!(!rules.process(&mut drv, Key::Backspace, Modifiers::NONE));
    drv.set_selection(TextSelection::caret(TextPosition::leading(0)));
    assert!(rules.process(&mut drv, Key::Backspace, Modifiers::NONE));
    assert_eq!(drv.editor.get_text_utf8(), "item");
    assert!(drv.editor.paragraphs()[0].attributes().is_empty());
    // Without the marker there is nothing left to handle.
    assert!(!rules.process(&mut drv, Key::Backspace, Modifiers::NONE));
}

#[test]
fn formatting_hot_keys() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("hi");
    let rules = markdown_rules(&MarkdownStyles::default());
    let mut drv = env.driver(&mut editor);
    drv.select_all();
    // Character keys match regardless of case.
    assert!(rules.process(&mut drv, Key::Character('B'), Modifiers::CONTROL));
    assert!(drv.editor.is_attribute_active(&Attribute::bold()));
    assert!(rules.process(&mut drv, Key::Character('u'), Modifiers::CONTROL));
    assert!(drv.editor.is_attribute_active(&Attribute::underline()));
    // Modifiers must match exactly.
    assert!(!rules.process(&mut drv, Key::Character('i'), Modifiers::CONTROL | Modifiers::ALT));
    assert!(!drv.editor.is_attribute_active(&Attribute::italic()));

    assert!(rules.process(&mut drv, Key::Character('z'), Modifiers::CONTROL));
    assert!(!drv.editor.is_attribute_active(&Attribute::underline()));
    assert!(rules.process(&mut drv, Key::Character('y'), Modifiers::CONTROL));
    assert!(drv.editor.is_attribute_active(&Attribute::underline()));
}

#[test]
fn undo_declines_without_history() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("hi");
    let rules = markdown_rules(&MarkdownStyles::default());
    let mut drv = env.driver(&mut editor);
    assert!(!rules.process(&mut drv, Key::Character('z'), Modifiers::CONTROL));
    assert!(!rules.process(
        &mut drv,
        Key::Character('z'),
        Modifiers::CONTROL | Modifiers::SHIFT
    ));
}

#[test]
fn declined_rules_fall_through() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("");
    let hits = Rc::new(Cell::new(0));
    let first = hits.clone();
    let second = hits.clone();
    let rules = EditorRuleSet::new()
        .with(EditorRule::new(Key::Tab, Modifiers::NONE, Vec::new(), move |_| {
            first.set(first.get() + 1);
            false
        }))
        .with(EditorRule::new(
            Key::Tab,
            Modifiers::NONE,
            alloc::vec![RuleCondition::SelectionEmpty],
            move |_| {
                second.set(second.get() + 10);
                true
            },
        ));
    assert_eq!(rules.len(), 2);
    let mut drv = env.driver(&mut editor);
    assert!(rules.process(&mut drv, Key::Tab, Modifiers::NONE));
    assert_eq!(hits.get(), 11);
}

#[test]
fn conditions() {
    let mut env = TestEnv::new();
    let mut editor = env.editor("ab\n");
    let mut drv = env.driver(&mut editor);
    drv.set_selection(TextSelection::caret(TextPosition::leading(3)));
    let editor = &*drv.editor;
    assert!(RuleCondition::SelectionEmpty.holds(editor));
    assert!(!RuleCondition::SelectionNonEmpty.holds(editor));
    assert!(RuleCondition::CaretAtParagraphStart.holds(editor));
    assert!(RuleCondition::ParagraphEmpty.holds(editor));
    assert!(RuleCondition::ParagraphLacksAttribute(bullet()).holds(editor));
    assert!(!RuleCondition::ParagraphHasKind(bullet().kind()).holds(editor));

    drv.set_selection(TextSelection::new(
        TextPosition::leading(0),
        TextPosition::leading(2),
    ));
    let editor = &*drv.editor;
    assert!(RuleCondition::SelectionNonEmpty.holds(editor));
    assert!(RuleCondition::ParagraphStartsWith("ab".into()).holds(editor));
    assert!(!RuleCondition::ParagraphStartsWith("a".into()).holds(editor));
    assert!(!RuleCondition::ParagraphEmpty.holds(editor));
}

#[test]
fn default_rule_count() {
    let rules = markdown_rules(&MarkdownStyles::default());
    // Six hot keys, two bullet prefixes and one numbered prefix, each list style with
    // its Enter and Backspace rules.
    assert_eq!(rules.len(), 6 + 2 + 2 + 1 + 2);
    assert!(EditorRuleSet::new().is_empty());
}
