// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Undo history made of paragraph replacements grouped into transactions.

use alloc::vec::Vec;

use rich_text::RichText;

use super::TextSelection;
use crate::attribute::Attribute;

/// The editable content of one paragraph.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ParagraphContent {
    pub(crate) text: RichText<Attribute>,
    pub(crate) attributes: Vec<Attribute>,
}

/// Paragraphs `index..index + removed.len()` were replaced by `inserted`.
#[derive(Clone, Debug)]
pub(crate) struct Replacement {
    pub(crate) index: usize,
    pub(crate) removed: Vec<ParagraphContent>,
    pub(crate) inserted: Vec<ParagraphContent>,
}

/// One undo step.
#[derive(Clone, Debug)]
pub(crate) struct Transaction {
    pub(crate) edits: Vec<Replacement>,
    pub(crate) selection_before: TextSelection,
    pub(crate) selection_after: TextSelection,
}

#[derive(Clone, Debug)]
pub(crate) struct UndoStack {
    transactions: Vec<Transaction>,
    /// Number of transactions that are applied; the rest can be redone.
    index: usize,
    open: Option<Transaction>,
    depth: u32,
    max_levels: usize,
}

impl UndoStack {
    pub(crate) fn new(max_levels: usize) -> Self {
        Self {
            transactions: Vec::new(),
            index: 0,
            open: None,
            depth: 0,
            max_levels: max_levels.max(1),
        }
    }

    pub(crate) fn set_max_levels(&mut self, max_levels: usize) {
        self.max_levels = max_levels.max(1);
        self.enforce_limit();
    }

    pub(crate) fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub(crate) fn can_redo(&self) -> bool {
        self.index < self.transactions.len()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Start a transaction. Nested calls join the outermost one.
    pub(crate) fn begin(&mut self, selection: TextSelection) {
        if self.depth == 0 {
            self.open = Some(Transaction {
                edits: Vec::new(),
                selection_before: selection,
                selection_after: selection,
            });
        }
        self.depth += 1;
    }

    /// End a transaction, committing it when the outermost one ends.
    pub(crate) fn end(&mut self, selection: TextSelection) {
        debug_assert!(self.depth > 0, "unbalanced undo transaction end");
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        if self.depth > 0 {
            return;
        }
        let Some(mut transaction) = self.open.take() else {
            return;
        };
        if transaction.edits.is_empty() {
            return;
        }
        transaction.selection_after = selection;
        log::debug!(
            "commit undo transaction with {} edits",
            transaction.edits.len()
        );
        self.transactions.truncate(self.index);
        self.transactions.push(transaction);
        self.index = self.transactions.len();
        self.enforce_limit();
    }

    /// Record an edit into the open transaction.
    pub(crate) fn record(&mut self, edit: Replacement) {
        debug_assert!(self.depth > 0, "edits are recorded inside a transaction");
        if let Some(open) = self.open.as_mut() {
            open.edits.push(edit);
        }
    }

    /// Step back, returning the transaction to revert.
    pub(crate) fn undo(&mut self) -> Option<&Transaction> {
        if self.is_open() || !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(&self.transactions[self.index])
    }

    /// Step forward, returning the transaction to reapply.
    pub(crate) fn redo(&mut self) -> Option<&Transaction> {
        if self.is_open() || !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(&self.transactions[self.index - 1])
    }

    pub(crate) fn clear(&mut self) {
        self.transactions.clear();
        self.index = 0;
        self.open = None;
        self.depth = 0;
    }

    fn enforce_limit(&mut self) {
        if self.transactions.len() > self.max_levels {
            let excess = self.transactions.len() - self.max_levels;
            self.transactions.drain(0..excess);
            self.index = self.index.saturating_sub(excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{ParagraphContent, Replacement, UndoStack};
    use crate::editor::TextSelection;

    fn edit(index: usize) -> Replacement {
        Replacement {
            index,
            removed: Vec::new(),
            inserted: vec![ParagraphContent::default()],
        }
    }

    #[test]
    fn nested_transactions_collapse() {
        let mut stack = UndoStack::new(10);
        let sel = TextSelection::default();
        stack.begin(sel);
        stack.record(edit(0));
        stack.begin(sel);
        stack.record(edit(1));
        stack.end(sel);
        assert!(!stack.can_undo());
        stack.end(sel);
        let undone = stack.undo().map(|t| t.edits.len());
        assert_eq!(undone, Some(2));
        assert!(!stack.can_undo());
        assert!(stack.can_redo());
    }

    #[test]
    fn empty_transactions_are_dropped() {
        let mut stack = UndoStack::new(10);
        let sel = TextSelection::default();
        stack.begin(sel);
        stack.end(sel);
        assert!(!stack.can_undo());
        assert!(stack.undo().is_none());
    }

    #[test]
    fn history_is_capped() {
        let mut stack = UndoStack::new(2);
        let sel = TextSelection::default();
        for ix in 0..5 {
            stack.begin(sel);
            stack.record(edit(ix));
            stack.end(sel);
        }
        assert!(stack.undo().is_some());
        assert!(stack.undo().is_some());
        assert!(stack.undo().is_none());
    }

    #[test]
    fn new_edit_discards_redo() {
        let mut stack = UndoStack::new(10);
        let sel = TextSelection::default();
        stack.begin(sel);
        stack.record(edit(0));
        stack.end(sel);
        stack.undo();
        assert!(stack.can_redo());
        stack.begin(sel);
        stack.record(edit(0));
        stack.end(sel);
        assert!(!stack.can_redo());
    }
}
