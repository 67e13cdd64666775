// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key bindings and Markdown-like shortcuts layered over the editor.
//!
//! A rule set is consulted before the editor handles a key. Typed characters that a
//! rule may consume, such as the space after `#`, should be passed to
//! [`EditorRuleSet::process`] as [`Key::Character`] before inserting them:
//!
//! ```ignore
//! if !rules.process(&mut driver, Key::Character(' '), Modifiers::NONE) {
//!     driver.insert_codepoint(' ');
//! }
//! ```

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::attribute::{Attribute, AttributeCollection, AttributeKind, ListMarker};
use crate::editor::{Editor, EditorDriver, Key, Modifiers};

/// Something that must hold for a rule to fire.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleCondition {
    /// Nothing is selected.
    SelectionEmpty,
    /// Some text is selected.
    SelectionNonEmpty,
    /// The caret paragraph's text from its start up to the caret is exactly this.
    ParagraphStartsWith(String),
    /// The caret paragraph has a paragraph attribute of this kind.
    ParagraphHasKind(AttributeKind),
    /// The caret paragraph has this paragraph attribute.
    ParagraphHasAttribute(Attribute),
    /// The caret paragraph does not have this paragraph attribute.
    ParagraphLacksAttribute(Attribute),
    /// The caret is at the start of its paragraph.
    CaretAtParagraphStart,
    /// The caret paragraph has no text besides its separator.
    ParagraphEmpty,
}

impl RuleCondition {
    /// Returns `true` if the condition holds for `editor`.
    pub fn holds(&self, editor: &Editor) -> bool {
        let range = editor.selection_range();
        let caret = editor.insert_offset(editor.selection().end_pos);
        let paragraph = &editor.paragraphs()[editor.paragraph_index_at(caret)];
        let local = caret - paragraph.text_start();
        match self {
            Self::SelectionEmpty => range.is_empty(),
            Self::SelectionNonEmpty => !range.is_empty(),
            Self::ParagraphStartsWith(prefix) => {
                let text = &paragraph.text().text()[..local.min(paragraph.len())];
                text.iter().copied().eq(prefix.chars())
            }
            Self::ParagraphHasKind(kind) => {
                paragraph.attributes().iter().any(|a| a.kind() == *kind)
            }
            Self::ParagraphHasAttribute(attribute) => {
                paragraph.attributes().contains(attribute)
            }
            Self::ParagraphLacksAttribute(attribute) => {
                !paragraph.attributes().contains(attribute)
            }
            Self::CaretAtParagraphStart => local == 0,
            Self::ParagraphEmpty => paragraph.content_len() == 0,
        }
    }
}

type RuleAction = Box<dyn Fn(&mut EditorDriver<'_>) -> bool>;

/// A key binding with conditions and an action.
pub struct EditorRule {
    /// Key that triggers the rule.
    pub key: Key,
    /// Modifiers that must be held, exactly.
    pub mods: Modifiers,
    /// Conditions that must all hold.
    pub conditions: Vec<RuleCondition>,
    apply: RuleAction,
}

impl fmt::Debug for EditorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorRule")
            .field("key", &self.key)
            .field("mods", &self.mods)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

fn same_key(a: Key, b: Key) -> bool {
    match (a, b) {
        (Key::Character(a), Key::Character(b)) => a.to_lowercase().eq(b.to_lowercase()),
        _ => a == b,
    }
}

impl EditorRule {
    /// A rule running `apply` when `key` is pressed with `mods` and `conditions` hold.
    ///
    /// `apply` returns `false` to let later rules for the same key run.
    pub fn new(
        key: Key,
        mods: Modifiers,
        conditions: Vec<RuleCondition>,
        apply: impl Fn(&mut EditorDriver<'_>) -> bool + 'static,
    ) -> Self {
        Self {
            key,
            mods,
            conditions,
            apply: Box::new(apply),
        }
    }

    /// Toggle an inline attribute on the selection.
    pub fn toggle_attribute(key: Key, mods: Modifiers, attribute: Attribute) -> Self {
        Self::new(key, mods, Vec::new(), move |driver| {
            driver.toggle_attribute(attribute.clone());
            true
        })
    }

    /// Undo the last edit. Declines when there is nothing to undo.
    pub fn undo(key: Key, mods: Modifiers) -> Self {
        Self::new(key, mods, Vec::new(), |driver| driver.undo())
    }

    /// Redo the last undone edit. Declines when there is nothing to redo.
    pub fn redo(key: Key, mods: Modifiers) -> Self {
        Self::new(key, mods, Vec::new(), |driver| driver.redo())
    }

    /// Typing a space after `prefix` at the start of a paragraph removes the prefix and
    /// sets `attribute` on the paragraph, as one undo step.
    pub fn markdown_prefix(prefix: &str, attribute: Attribute) -> Self {
        let conditions = alloc::vec![
            RuleCondition::SelectionEmpty,
            RuleCondition::ParagraphStartsWith(prefix.into()),
        ];
        Self::new(Key::Character(' '), Modifiers::NONE, conditions, move |driver| {
            let editor = &*driver.editor;
            let caret = editor.insert_offset(editor.selection().end_pos);
            let start = editor.paragraphs()[editor.paragraph_index_at(caret)].text_start();
            driver.undo_transaction_begin();
            driver.delete_range(start..caret);
            driver.set_paragraph_attribute(attribute.clone());
            driver.undo_transaction_end();
            true
        })
    }

    /// Enter in an empty paragraph with `attribute` removes the attribute instead of
    /// starting a new paragraph.
    pub fn exit_on_enter(attribute: Attribute) -> Self {
        let conditions = alloc::vec![
            RuleCondition::SelectionEmpty,
            RuleCondition::ParagraphEmpty,
            RuleCondition::ParagraphHasAttribute(attribute.clone()),
        ];
        Self::new(Key::Enter, Modifiers::NONE, conditions, move |driver| {
            driver.clear_paragraph_attribute(&attribute);
            true
        })
    }

    /// Backspace at the start of a paragraph with `attribute` removes the attribute
    /// instead of joining the paragraph to the previous one.
    pub fn clear_on_backspace(attribute: Attribute) -> Self {
        let conditions = alloc::vec![
            RuleCondition::SelectionEmpty,
            RuleCondition::CaretAtParagraphStart,
            RuleCondition::ParagraphHasAttribute(attribute.clone()),
        ];
        Self::new(Key::Backspace, Modifiers::NONE, conditions, move |driver| {
            driver.clear_paragraph_attribute(&attribute);
            true
        })
    }

    fn matches(&self, editor: &Editor, key: Key, mods: Modifiers) -> bool {
        same_key(self.key, key)
            && self.mods == mods
            && self.conditions.iter().all(|c| c.holds(editor))
    }
}

/// An ordered list of rules.
#[derive(Debug, Default)]
pub struct EditorRuleSet {
    rules: Vec<EditorRule>,
}

impl EditorRuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Earlier rules take precedence.
    pub fn add(&mut self, rule: EditorRule) {
        self.rules.push(rule);
    }

    /// Append a rule, builder style.
    #[must_use]
    pub fn with(mut self, rule: EditorRule) -> Self {
        self.add(rule);
        self
    }

    /// The rules in precedence order.
    pub fn rules(&self) -> &[EditorRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the first matching rule that accepts the key.
    ///
    /// Returns `true` if a rule consumed the key, in which case the editor should not
    /// handle it.
    pub fn process(&self, driver: &mut EditorDriver<'_>, key: Key, mods: Modifiers) -> bool {
        driver.refresh_layout();
        for (ix, rule) in self.rules.iter().enumerate() {
            if rule.matches(driver.editor, key, mods) && (rule.apply)(driver) {
                log::debug!("editor rule {ix} consumed {key:?}");
                return true;
            }
        }
        false
    }
}

/// Paragraph styles used by [`markdown_rules`]. Missing styles get no rules.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkdownStyles {
    /// `# `
    pub heading1: Option<Attribute>,
    /// `## `
    pub heading2: Option<Attribute>,
    /// `### `
    pub heading3: Option<Attribute>,
    /// `> `
    pub quote: Option<Attribute>,
    /// `- ` and `* `
    pub bullet_list: Option<Attribute>,
    /// `1. `
    pub numbered_list: Option<Attribute>,
}

impl Default for MarkdownStyles {
    fn default() -> Self {
        Self {
            heading1: None,
            heading2: None,
            heading3: None,
            quote: None,
            bullet_list: Some(Attribute::ListMarker(ListMarker::bullet())),
            numbered_list: Some(Attribute::ListMarker(ListMarker::numbered())),
        }
    }
}

impl MarkdownStyles {
    /// Styles referring to the sets named `h1`, `h2`, `h3` and `quote` in `collection`,
    /// with default list markers.
    pub fn from_collection(collection: &AttributeCollection) -> Self {
        let named = |name: &str| collection.find_by_name(name).map(Attribute::Reference);
        Self {
            heading1: named("h1"),
            heading2: named("h2"),
            heading3: named("h3"),
            quote: named("quote"),
            ..Self::default()
        }
    }
}

/// Markdown-like shortcuts and the usual formatting and history hot keys.
///
/// Control+B, I and U toggle bold, italic and underline. Control+Z undoes, Control+Y
/// and Control+Shift+Z redo. Paragraph prefixes such as `# ` apply `styles`, which are
/// left again with Enter in an empty paragraph or Backspace at its start.
pub fn markdown_rules(styles: &MarkdownStyles) -> EditorRuleSet {
    let mut rules = EditorRuleSet::new()
        .with(EditorRule::toggle_attribute(
            Key::Character('b'),
            Modifiers::CONTROL,
            Attribute::bold(),
        ))
        .with(EditorRule::toggle_attribute(
            Key::Character('i'),
            Modifiers::CONTROL,
            Attribute::italic(),
        ))
        .with(EditorRule::toggle_attribute(
            Key::Character('u'),
            Modifiers::CONTROL,
            Attribute::underline(),
        ))
        .with(EditorRule::undo(Key::Character('z'), Modifiers::CONTROL))
        .with(EditorRule::redo(
            Key::Character('z'),
            Modifiers::CONTROL | Modifiers::SHIFT,
        ))
        .with(EditorRule::redo(Key::Character('y'), Modifiers::CONTROL));

    let prefixes: [(&[&str], &Option<Attribute>); 6] = [
        (&["#"], &styles.heading1),
        (&["##"], &styles.heading2),
        (&["###"], &styles.heading3),
        (&[">"], &styles.quote),
        (&["-", "*"], &styles.bullet_list),
        (&["1."], &styles.numbered_list),
    ];
    for (prefixes, style) in prefixes {
        let Some(style) = style else {
            continue;
        };
        for prefix in prefixes {
            rules.add(EditorRule::markdown_prefix(prefix, style.clone()));
        }
        rules.add(EditorRule::exit_on_enter(style.clone()));
        rules.add(EditorRule::clear_on_backspace(style.clone()));
    }
    rules
}
