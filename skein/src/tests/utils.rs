// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec;

use crate::attribute::{Attribute, AttributeSet, TextWrap};
use crate::editor::{Editor, EditorDriver, EditorParams};
use crate::layout::LayoutParams;
use crate::{testing, FontContext, Layout, LayoutContext};

/// Font size used by the helpers, every character is `8.0` wide and lines are `16.0` tall.
pub(crate) const SIZE: f32 = 16.0;
pub(crate) const CHAR: f32 = SIZE * testing::ADVANCE;

pub(crate) struct TestEnv {
    pub(crate) font_cx: FontContext,
    pub(crate) layout_cx: LayoutContext,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self {
            font_cx: testing::font_context(),
            layout_cx: LayoutContext::new(),
        }
    }

    /// Lay out `text` at [`SIZE`], wrapped to `width` unless it is `0.0`.
    pub(crate) fn layout(&mut self, text: &str, width: f32) -> Layout {
        self.layout_with(text, width, &[])
    }

    pub(crate) fn layout_with(
        &mut self,
        text: &str,
        width: f32,
        attributes: &[Attribute],
    ) -> Layout {
        let mut items = vec![Attribute::FontSize(SIZE)];
        items.extend_from_slice(attributes);
        let params = LayoutParams::new(width, 0.0).with_attributes(AttributeSet::new(&items));
        Layout::build_utf8(
            &mut self.layout_cx,
            &mut self.font_cx,
            &params,
            text,
            &AttributeSet::default(),
        )
    }

    pub(crate) fn params() -> EditorParams {
        EditorParams {
            layout_attributes: vec![Attribute::FontSize(SIZE), Attribute::TextWrap(TextWrap::Word)],
            ..EditorParams::default()
        }
    }

    /// An editor holding `text` with the caret at the end.
    pub(crate) fn editor(&mut self, text: &str) -> Editor {
        let mut editor = Editor::new(Self::params());
        self.driver(&mut editor).set_text_utf8(text);
        editor
    }

    pub(crate) fn driver<'a>(&'a mut self, editor: &'a mut Editor) -> EditorDriver<'a> {
        editor.driver(&mut self.font_cx, &mut self.layout_cx)
    }
}
