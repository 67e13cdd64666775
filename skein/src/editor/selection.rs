// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::layout::TextPosition;

/// A selection in document offsets.
///
/// `start_pos` is the anchor and stays put while the selection is extended, `end_pos`
/// is where the caret is drawn. The two may be in either order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextSelection {
    /// The anchor of the selection.
    pub start_pos: TextPosition,
    /// The moving end of the selection, where the caret is.
    pub end_pos: TextPosition,
}

impl TextSelection {
    /// A selection between `start_pos` and `end_pos`.
    pub const fn new(start_pos: TextPosition, end_pos: TextPosition) -> Self {
        Self { start_pos, end_pos }
    }

    /// A caret at `pos`.
    pub const fn caret(pos: TextPosition) -> Self {
        Self::new(pos, pos)
    }

    /// The same selection with the moving end at `pos`.
    #[must_use]
    pub fn extend_to(self, pos: TextPosition) -> Self {
        Self::new(self.start_pos, pos)
    }
}

impl From<TextPosition> for TextSelection {
    fn from(pos: TextPosition) -> Self {
        Self::caret(pos)
    }
}
