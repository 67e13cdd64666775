// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A multi-paragraph rich text editor.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

use peniko::kurbo::{Rect, Vec2};
use rich_text::RichText;

use super::backspace::Backspace;
use super::input::{ClickTracker, DragState, Granularity, Key, Modifiers};
use super::undo::{ParagraphContent, Replacement, UndoStack};
use super::TextSelection;
use crate::attribute::{Attribute, AttributeCollection, AttributeSet, ListMarkerStyle, TextWrap};
use crate::layout::{Layout, LayoutParams, MovementType, TextPosition, VisualCaret};
use crate::util::{is_paragraph_separator, to_f64};
use crate::{FontContext, LayoutContext};

/// Configuration of an [`Editor`].
#[derive(Clone, Debug)]
pub struct EditorParams {
    /// Collection used to resolve [`Attribute::Reference`] in text and paragraphs.
    pub attribute_collection: Option<Arc<AttributeCollection>>,
    /// Attributes every paragraph inherits.
    pub layout_attributes: Vec<Attribute>,
    /// Attributes applied to IME composition text.
    pub composition_attributes: Vec<Attribute>,
    /// Width paragraphs are wrapped to, `0.0` for unconstrained.
    pub editor_width: f32,
    /// Number of undo steps kept.
    pub max_undo_levels: usize,
    /// Maximum time between clicks counted as a double or triple click.
    pub double_click_time_ms: u64,
    /// Maximum distance between clicks counted as a double or triple click.
    pub double_click_distance: f32,
}

impl Default for EditorParams {
    fn default() -> Self {
        Self {
            attribute_collection: None,
            layout_attributes: vec![Attribute::TextWrap(TextWrap::Word)],
            composition_attributes: vec![Attribute::underline()],
            editor_width: 0.0,
            max_undo_levels: 100,
            double_click_time_ms: 400,
            double_click_distance: 4.0,
        }
    }
}

/// One paragraph of an editor, laid out independently.
///
/// The text includes the separator that ends the paragraph, every paragraph but the
/// last has one.
#[derive(Clone, Debug)]
pub struct Paragraph {
    content: ParagraphContent,
    layout: Layout,
    y: f32,
    advance_y: f32,
    text_start: usize,
    list_counter: u32,
}

impl Paragraph {
    fn new(content: ParagraphContent) -> Self {
        Self {
            content,
            layout: Layout::default(),
            y: 0.0,
            advance_y: 0.0,
            text_start: 0,
            list_counter: 1,
        }
    }

    /// Layout of the paragraph, in paragraph local coordinates.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Text and inline attributes.
    pub fn text(&self) -> &RichText<Attribute> {
        &self.content.text
    }

    /// Paragraph level attributes.
    pub fn attributes(&self) -> &[Attribute] {
        &self.content.attributes
    }

    /// Top of the layout in editor coordinates.
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Vertical space taken by the paragraph including its padding.
    pub fn advance_y(&self) -> f32 {
        self.advance_y
    }

    /// Document offset of the first codepoint.
    pub fn text_start(&self) -> usize {
        self.text_start
    }

    /// Document range of the paragraph's text.
    pub fn text_range(&self) -> Range<usize> {
        self.text_start..self.text_start + self.len()
    }

    /// Number of codepoints including the separator.
    pub fn len(&self) -> usize {
        self.content.text.len()
    }

    /// Returns `true` if the paragraph has no text at all.
    pub fn is_empty(&self) -> bool {
        self.content.text.is_empty()
    }

    /// Number of codepoints before the separator.
    pub fn content_len(&self) -> usize {
        let text = self.content.text.text();
        let mut len = text.len();
        if len > 0 && is_paragraph_separator(text[len - 1]) {
            len -= 1;
            if text[len] == '\n' && len > 0 && text[len - 1] == '\r' {
                len -= 1;
            }
        }
        len
    }
}

/// IME text shown at the caret without being part of the document.
#[derive(Clone, Debug)]
struct Composition {
    paragraph: usize,
    /// Paragraph local insert offset.
    offset: usize,
    text: Vec<char>,
    caret: usize,
    attributes: Vec<Attribute>,
}

/// A rich text editor made of paragraphs.
///
/// The editor holds the document and the selection; operations that change either go
/// through an [`EditorDriver`], which also brings the font and layout contexts needed to
/// rebuild layouts. Queries on the editor reflect the layouts as of the last driver call.
pub struct Editor {
    params: EditorParams,
    paragraphs: Vec<Paragraph>,
    selection: TextSelection,
    active_attributes: Vec<Attribute>,
    composition: Option<Composition>,
    undo: UndoStack,
    clicks: ClickTracker,
    drag: Option<DragState>,
    preferred_x: Option<f32>,
    backspace: Backspace,
    layout_dirty: bool,
    changed: bool,
    on_change: Option<Box<dyn FnMut(&Editor)>>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("params", &self.params)
            .field("paragraphs", &self.paragraphs)
            .field("selection", &self.selection)
            .field("active_attributes", &self.active_attributes)
            .field("composition", &self.composition)
            .finish_non_exhaustive()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorParams::default())
    }
}

fn slice(text: &RichText<Attribute>, range: Range<usize>) -> RichText<Attribute> {
    text.slice(range).unwrap_or_default()
}

/// Split `text` after each paragraph separator.
///
/// A trailing empty paragraph is only produced when `ends_document` is set.
fn split_paragraphs(
    text: &RichText<Attribute>,
    attributes: &[Attribute],
    ends_document: bool,
) -> Vec<ParagraphContent> {
    let chars = text.text();
    let mut out = Vec::new();
    let mut start = 0;
    for (ix, &ch) in chars.iter().enumerate() {
        let ends = match ch {
            '\r' => chars.get(ix + 1) != Some(&'\n'),
            ch => is_paragraph_separator(ch),
        };
        if ends {
            out.push(ParagraphContent {
                text: slice(text, start..ix + 1),
                attributes: attributes.to_vec(),
            });
            start = ix + 1;
        }
    }
    if start < chars.len() || out.is_empty() || ends_document {
        out.push(ParagraphContent {
            text: slice(text, start..chars.len()),
            attributes: attributes.to_vec(),
        });
    }
    out
}

/// Returns `true` if applying `new` removes `existing`.
///
/// Cumulative kinds only replace equal values, references replace references to sets
/// of the same group.
pub(crate) fn replaces(
    existing: &Attribute,
    new: &Attribute,
    collection: Option<&AttributeCollection>,
) -> bool {
    match (existing, new) {
        (Attribute::Reference(a), Attribute::Reference(b)) => {
            a == b || collection.is_some_and(|c| c.same_group(*a, *b))
        }
        _ if new.kind().is_cumulative() => existing == new,
        _ => existing.kind() == new.kind(),
    }
}

/// Returns `true` if `attribute` is in effect at `index`, taking later spans as winning.
fn is_active_at(
    text: &RichText<Attribute>,
    index: usize,
    attribute: &Attribute,
    collection: Option<&AttributeCollection>,
) -> bool {
    let mut matching = text
        .attributes_at(index)
        .rev()
        .filter(|a| replaces(a, attribute, collection));
    if attribute.kind().is_cumulative() {
        matching.any(|a| a == attribute)
    } else {
        matching.next() == Some(attribute)
    }
}

impl Editor {
    /// Create an editor with one empty paragraph.
    pub fn new(params: EditorParams) -> Self {
        let undo = UndoStack::new(params.max_undo_levels);
        Self {
            params,
            paragraphs: vec![Paragraph::new(ParagraphContent::default())],
            selection: TextSelection::default(),
            active_attributes: Vec::new(),
            composition: None,
            undo,
            clicks: ClickTracker::default(),
            drag: None,
            preferred_x: None,
            backspace: Backspace::new(),
            layout_dirty: true,
            changed: false,
            on_change: None,
        }
    }

    /// Borrow the editor together with the contexts needed to change it.
    pub fn driver<'drv>(
        &'drv mut self,
        font_cx: &'drv mut FontContext,
        layout_cx: &'drv mut LayoutContext,
    ) -> EditorDriver<'drv> {
        EditorDriver {
            editor: self,
            font_cx,
            layout_cx,
        }
    }

    /// The editor configuration.
    pub fn params(&self) -> &EditorParams {
        &self.params
    }

    /// Replace the configuration. Layouts are rebuilt by the next driver call.
    pub fn set_params(&mut self, params: EditorParams) {
        self.undo.set_max_levels(params.max_undo_levels);
        self.params = params;
        self.layout_dirty = true;
    }

    /// Set the wrapping width. Layouts are rebuilt by the next driver call.
    pub fn set_width(&mut self, width: f32) {
        if self.params.editor_width != width {
            self.params.editor_width = width;
            self.layout_dirty = true;
        }
    }

    /// Call `callback` after every change to the document.
    pub fn set_on_change(&mut self, callback: impl FnMut(&Editor) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// The paragraphs. There is always at least one.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// The current selection.
    pub fn selection(&self) -> TextSelection {
        self.selection
    }

    /// Number of codepoints in the document.
    pub fn text_len(&self) -> usize {
        self.paragraphs.last().map(|p| p.text_range().end).unwrap_or(0)
    }

    /// Attributes applied to the next inserted text.
    pub fn active_attributes(&self) -> &[Attribute] {
        &self.active_attributes
    }

    /// Returns `true` while IME composition text is shown.
    pub fn is_composing(&self) -> bool {
        self.composition.is_some()
    }

    /// Returns `true` if there is an edit to undo.
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Returns `true` if there is an undone edit to redo.
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// The document as UTF-8, without composition text.
    pub fn get_text_utf8(&self) -> String {
        let mut out = String::new();
        for paragraph in &self.paragraphs {
            out.extend(paragraph.content.text.text());
        }
        out
    }

    /// The document as codepoints, without composition text.
    pub fn get_text_utf32(&self) -> Vec<char> {
        let mut out = Vec::with_capacity(self.text_len());
        for paragraph in &self.paragraphs {
            out.extend_from_slice(paragraph.content.text.text());
        }
        out
    }

    /// The selected text as UTF-8.
    pub fn get_selection_text_utf8(&self) -> String {
        let range = self.selection_range();
        let mut out = String::new();
        for paragraph in &self.paragraphs {
            let pr = paragraph.text_range();
            let start = range.start.max(pr.start);
            let end = range.end.min(pr.end);
            if start < end {
                paragraph
                    .content
                    .text
                    .write_utf8(start - pr.start..end - pr.start, &mut out);
            }
        }
        out
    }

    /// Index of the paragraph containing document offset `offset`.
    ///
    /// Offsets past the end belong to the last paragraph.
    pub fn paragraph_index_at(&self, offset: usize) -> usize {
        self.paragraphs
            .iter()
            .position(|p| offset < p.text_range().end)
            .unwrap_or(self.paragraphs.len() - 1)
    }

    /// Index of the paragraph at `y`, clamped to the first and last paragraph.
    pub fn paragraph_index_at_y(&self, y: f32) -> usize {
        self.paragraphs
            .iter()
            .position(|p| y < p.y + p.layout.height())
            .unwrap_or(self.paragraphs.len() - 1)
    }

    /// Index of the paragraph the caret is in.
    pub fn caret_paragraph(&self) -> usize {
        self.paragraph_index_at(self.insert_offset(self.selection.end_pos))
    }

    fn local(&self, pos: TextPosition) -> (usize, TextPosition) {
        let ix = self.paragraph_index_at(pos.offset);
        let start = self.paragraphs[ix].text_start;
        (
            ix,
            TextPosition::new(pos.offset.saturating_sub(start), pos.affinity),
        )
    }

    fn global(&self, ix: usize, pos: TextPosition) -> TextPosition {
        TextPosition::new(pos.offset + self.paragraphs[ix].text_start, pos.affinity)
    }

    /// Document offset where text is inserted for `pos`.
    pub fn insert_offset(&self, pos: TextPosition) -> usize {
        let (ix, local) = self.local(pos);
        let paragraph = &self.paragraphs[ix];
        paragraph.text_start + paragraph.layout.insert_offset(local).min(paragraph.len())
    }

    /// The ordered document range of the selection.
    pub fn selection_range(&self) -> Range<usize> {
        let a = self.insert_offset(self.selection.start_pos);
        let b = self.insert_offset(self.selection.end_pos);
        a.min(b)..a.max(b)
    }

    /// A position ending a range at `offset`, shown after the preceding grapheme.
    fn end_position(&self, offset: usize) -> TextPosition {
        if offset == 0 {
            return TextPosition::leading(0);
        }
        let ix = self.paragraph_index_at(offset - 1);
        let paragraph = &self.paragraphs[ix];
        let local = offset - paragraph.text_start;
        let ends_paragraph = paragraph
            .content
            .text
            .char_at(local - 1)
            .is_some_and(is_paragraph_separator);
        if ends_paragraph {
            return TextPosition::leading(offset);
        }
        let prev = paragraph.layout.prev_grapheme_offset(local);
        self.global(ix, TextPosition::trailing(prev))
    }

    /// Resolve a point in editor coordinates to a document position.
    pub fn hit_test(&self, movement: MovementType, x: f32, y: f32) -> TextPosition {
        let ix = self.paragraph_index_at_y(y);
        let paragraph = &self.paragraphs[ix];
        let local = paragraph.layout.hit_test(movement, x, y - paragraph.y);
        self.global(ix, local)
    }

    /// Geometry of a document position in editor coordinates.
    pub fn caret_info_at(&self, pos: TextPosition) -> VisualCaret {
        let (ix, local) = self.local(pos);
        let paragraph = &self.paragraphs[ix];
        let mut caret = paragraph.layout.caret_info(local);
        caret.y += paragraph.y;
        caret
    }

    /// Geometry of the caret, inside the composition text while composing.
    pub fn caret_info(&self) -> VisualCaret {
        if let Some(composition) = &self.composition {
            if let Some(paragraph) = self.paragraphs.get(composition.paragraph) {
                let pos = TextPosition::leading(composition.offset + composition.caret);
                let mut caret = paragraph.layout.caret_info(pos);
                caret.y += paragraph.y;
                return caret;
            }
        }
        self.caret_info_at(self.selection.end_pos)
    }

    /// Call `f` with the rectangles covering the selection, in editor coordinates.
    pub fn iterate_selection_bounds(&self, mut f: impl FnMut(Rect)) {
        let range = self.selection_range();
        if range.is_empty() {
            return;
        }
        for paragraph in &self.paragraphs {
            let pr = paragraph.text_range();
            let start = range.start.max(pr.start);
            let end = range.end.min(pr.end);
            if start >= end {
                continue;
            }
            let offset = Vec2::new(0.0, to_f64(paragraph.y));
            paragraph
                .layout
                .selection_bounds(start - pr.start..end - pr.start, |rect| f(rect + offset));
        }
    }

    /// Rectangle an IME should place its candidate window next to.
    ///
    /// Covers the composition text while composing, the caret otherwise.
    pub fn input_rect(&self) -> Rect {
        if let Some(composition) = &self.composition {
            if let Some(paragraph) = self.paragraphs.get(composition.paragraph) {
                let mut bounds: Option<Rect> = None;
                let range = composition.offset..composition.offset + composition.text.len();
                paragraph.layout.selection_bounds(range, |rect| {
                    bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
                });
                if let Some(bounds) = bounds {
                    return bounds + Vec2::new(0.0, to_f64(paragraph.y));
                }
            }
        }
        let caret = self.caret_info();
        Rect::new(
            to_f64(caret.x),
            to_f64(caret.y),
            to_f64(caret.x),
            to_f64(caret.y + caret.height),
        )
    }

    /// Number of selected codepoints where `attribute` is in effect.
    ///
    /// With an empty selection, `1` if the attribute is active for typing.
    pub fn get_attribute_count(&self, attribute: &Attribute) -> usize {
        let range = self.selection_range();
        if range.is_empty() {
            return usize::from(self.active_attributes.contains(attribute));
        }
        let collection = self.params.attribute_collection.as_deref();
        let mut count = 0;
        for paragraph in &self.paragraphs {
            let pr = paragraph.text_range();
            let start = range.start.max(pr.start);
            let end = range.end.min(pr.end);
            count += (start..end)
                .filter(|&ix| {
                    is_active_at(&paragraph.content.text, ix - pr.start, attribute, collection)
                })
                .count();
        }
        count
    }

    /// Returns `true` if `attribute` is in effect over the whole selection, or active for
    /// typing when the selection is empty.
    pub fn is_attribute_active(&self, attribute: &Attribute) -> bool {
        let range = self.selection_range();
        if range.is_empty() {
            return self.active_attributes.contains(attribute);
        }
        self.get_attribute_count(attribute) == range.len()
    }

    /// Range of paragraph indices touched by the selection.
    pub fn selected_paragraphs(&self) -> Range<usize> {
        let range = self.selection_range();
        let first = self.paragraph_index_at(range.start);
        let mut last = self.paragraph_index_at(range.end);
        if last > first && !range.is_empty() && range.end == self.paragraphs[last].text_start {
            last -= 1;
        }
        first..last + 1
    }

    /// Active attributes follow the text before the caret.
    fn refresh_active_attributes(&mut self) {
        let offset = self.insert_offset(self.selection.end_pos);
        let ix = self.paragraph_index_at(offset);
        let paragraph = &self.paragraphs[ix];
        let local = offset - paragraph.text_start;
        let at = if local > 0 {
            Some(local - 1)
        } else {
            (!paragraph.is_empty()).then_some(0)
        };
        let mut active: Vec<Attribute> = Vec::new();
        if let Some(at) = at {
            for attribute in paragraph.content.text.attributes_at(at) {
                if !active.contains(attribute) {
                    active.push(attribute.clone());
                }
            }
        }
        self.active_attributes = active;
    }

    fn set_selection_internal(&mut self, selection: TextSelection) {
        self.selection = selection;
        self.refresh_active_attributes();
    }

    /// Snap a document position onto a grapheme boundary inside the document.
    fn clamp_position(&self, pos: TextPosition) -> TextPosition {
        let offset = pos.offset.min(self.text_len());
        let (ix, local) = self.local(TextPosition::new(offset, pos.affinity));
        let paragraph = &self.paragraphs[ix];
        let aligned = paragraph.layout.align_grapheme_offset(local.offset);
        self.global(ix, TextPosition::new(aligned, pos.affinity))
    }

    /// Caret after text inserted up to `offset`, moved past any grapheme the
    /// insertion joined with the following text.
    fn caret_after_insert(&self, offset: usize) -> TextPosition {
        let pos = self.clamp_position(TextPosition::leading(offset));
        if pos.offset == offset {
            return pos;
        }
        let (ix, local) = self.local(pos);
        let end = self.paragraphs[ix].layout.next_grapheme_offset(local.offset);
        self.global(ix, TextPosition::leading(end))
    }

    fn unit_range(&self, pos: TextPosition, granularity: Granularity) -> Range<usize> {
        let (ix, local) = self.local(pos);
        let paragraph = &self.paragraphs[ix];
        let start = paragraph.text_start;
        let layout = &paragraph.layout;
        match granularity {
            Granularity::Grapheme => {
                let offset = self.insert_offset(pos);
                offset..offset
            }
            Granularity::Word => {
                start + layout.word_start_at(local.offset)..start + layout.word_end_at(local.offset)
            }
            Granularity::Line => {
                let line_start = layout.line_start_at(local.offset);
                let line_end = layout.line_end_at(local.offset);
                start + line_start.offset..start + layout.insert_offset(line_end)
            }
        }
    }

    fn move_horizontal(&self, pos: TextPosition, right: bool) -> TextPosition {
        let (ix, local) = self.local(pos);
        let paragraph = &self.paragraphs[ix];
        let layout = &paragraph.layout;
        let moved = if right {
            layout.move_position_right(local)
        } else {
            layout.move_position_left(local)
        };
        if layout.caret_info(moved) != layout.caret_info(local) {
            return self.global(ix, moved);
        }
        let forward = right != layout.is_rtl();
        if forward {
            match self.paragraphs.get(ix + 1) {
                Some(next) => TextPosition::leading(next.text_start),
                None => pos,
            }
        } else if ix > 0 {
            self.paragraph_end(ix - 1)
        } else {
            pos
        }
    }

    fn move_word(&self, pos: TextPosition, forward: bool) -> TextPosition {
        let offset = self.insert_offset(pos);
        let ix = self.paragraph_index_at(offset);
        let paragraph = &self.paragraphs[ix];
        let local = offset - paragraph.text_start;
        let layout = &paragraph.layout;
        let target = if forward {
            paragraph.text_start + layout.next_word_offset(local)
        } else if local == 0 && ix > 0 {
            let prev = &self.paragraphs[ix - 1];
            prev.text_start + prev.layout.prev_word_offset(prev.content_len())
        } else {
            paragraph.text_start + layout.prev_word_offset(local)
        };
        TextPosition::leading(target)
    }

    fn move_vertical(&mut self, pos: TextPosition, down: bool) -> TextPosition {
        let caret = self.caret_info_at(pos);
        let x = *self.preferred_x.get_or_insert(caret.x);
        let (ix, _) = self.local(pos);
        let paragraph = &self.paragraphs[ix];
        let lines = paragraph.layout.lines().len();
        let (target, line) = if down {
            if caret.line_idx + 1 < lines {
                (ix, caret.line_idx + 1)
            } else if ix + 1 < self.paragraphs.len() {
                (ix + 1, 0)
            } else {
                return self.paragraph_end(ix);
            }
        } else if caret.line_idx > 0 {
            (ix, caret.line_idx - 1)
        } else if ix > 0 {
            let prev = &self.paragraphs[ix - 1];
            (ix - 1, prev.layout.lines().len().saturating_sub(1))
        } else {
            return TextPosition::leading(0);
        };
        let local = self.paragraphs[target]
            .layout
            .hit_test_at_line(MovementType::Caret, line, x);
        self.global(target, local)
    }

    fn paragraph_end(&self, ix: usize) -> TextPosition {
        let paragraph = &self.paragraphs[ix];
        let end = paragraph.layout.line_end_at(paragraph.content_len());
        self.global(ix, end)
    }

    fn line_start(&self, pos: TextPosition) -> TextPosition {
        let (ix, local) = self.local(pos);
        let start = self.paragraphs[ix].layout.line_start_at(local.offset);
        self.global(ix, start)
    }

    fn line_end(&self, pos: TextPosition) -> TextPosition {
        let (ix, local) = self.local(pos);
        let end = self.paragraphs[ix].layout.line_end_at(local.offset);
        self.global(ix, end)
    }

    fn list_marker_style(&self, ix: usize) -> Option<ListMarkerStyle> {
        let base = AttributeSet::new(&self.params.layout_attributes);
        let set = AttributeSet::with_parent(&self.paragraphs[ix].content.attributes, &base);
        set.list_marker(self.params.attribute_collection.as_deref())
            .map(|marker| marker.style)
            .filter(|style| *style != ListMarkerStyle::None)
    }

    /// Recompute paragraph offsets and vertical positions.
    fn update_offsets(&mut self) {
        let collection = self.params.attribute_collection.as_deref();
        let base = AttributeSet::new(&self.params.layout_attributes);
        let mut y = 0.0;
        let mut start = 0;
        for paragraph in &mut self.paragraphs {
            let set = AttributeSet::with_parent(&paragraph.content.attributes, &base);
            let padding = set.paragraph_padding(collection);
            paragraph.text_start = start;
            paragraph.y = y + padding.before;
            paragraph.advance_y = padding.before + paragraph.layout.height() + padding.after;
            y += paragraph.advance_y;
            start += paragraph.content.text.len();
        }
    }

    fn notify_change(&mut self) {
        if !self.changed || self.undo.is_open() {
            return;
        }
        self.changed = false;
        if let Some(mut callback) = self.on_change.take() {
            callback(self);
            if self.on_change.is_none() {
                self.on_change = Some(callback);
            }
        }
    }
}

fn build_paragraph_layout(
    params: &EditorParams,
    paragraph: &Paragraph,
    composition: Option<&Composition>,
    font_cx: &mut FontContext,
    layout_cx: &mut LayoutContext,
) -> Layout {
    let base = AttributeSet::new(&params.layout_attributes);
    let paragraph_attributes = AttributeSet::with_parent(&paragraph.content.attributes, &base);
    let mut layout_params =
        LayoutParams::new(params.editor_width, 0.0).with_attributes(paragraph_attributes);
    layout_params.attribute_collection = params.attribute_collection.as_deref();
    layout_params.list_marker_counter = paragraph.list_counter;
    let attributes = AttributeSet::default();
    let text = &paragraph.content.text;
    match composition {
        Some(composition) => {
            let mut composed = text.clone();
            let at = composition.offset.min(composed.len());
            if composed
                .insert(at, &composition.text, &composition.attributes)
                .is_err()
            {
                log::warn!("composition offset {at} outside paragraph");
            }
            Layout::build_rich_text(layout_cx, font_cx, &layout_params, &composed, &attributes)
        }
        None => Layout::build_rich_text(layout_cx, font_cx, &layout_params, text, &attributes),
    }
}

/// A short-lived wrapper around [`Editor`] that can rebuild layouts.
pub struct EditorDriver<'a> {
    /// The editor.
    pub editor: &'a mut Editor,
    /// Fonts and shaping.
    pub font_cx: &'a mut FontContext,
    /// Layout scratch space.
    pub layout_cx: &'a mut LayoutContext,
}

impl fmt::Debug for EditorDriver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorDriver")
            .field("editor", &self.editor)
            .finish_non_exhaustive()
    }
}

impl EditorDriver<'_> {
    // --- MARK: Layout ---

    /// Rebuild layouts made stale by [`Editor::set_params`] or [`Editor::set_width`].
    pub fn refresh_layout(&mut self) {
        if self.editor.layout_dirty {
            self.editor.layout_dirty = false;
            let count = self.editor.paragraphs.len();
            self.relayout(0..count);
        }
    }

    fn layout_paragraph(&mut self, ix: usize) {
        let editor = &mut *self.editor;
        let composition = editor
            .composition
            .as_ref()
            .filter(|composition| composition.paragraph == ix);
        let layout = build_paragraph_layout(
            &editor.params,
            &editor.paragraphs[ix],
            composition,
            self.font_cx,
            self.layout_cx,
        );
        editor.paragraphs[ix].layout = layout;
    }

    /// Rebuild paragraphs in `range` and any whose list counter changed.
    fn relayout(&mut self, range: Range<usize>) {
        let mut stale = Vec::new();
        let mut prev: Option<(ListMarkerStyle, u32)> = None;
        for ix in 0..self.editor.paragraphs.len() {
            let style = self.editor.list_marker_style(ix);
            let counter = match (prev, style) {
                (Some((prev_style, count)), Some(style)) if prev_style == style => count + 1,
                _ => 1,
            };
            prev = style.map(|style| (style, counter));
            let paragraph = &mut self.editor.paragraphs[ix];
            let recount = style.is_some() && paragraph.list_counter != counter;
            paragraph.list_counter = counter;
            if range.contains(&ix) || recount {
                stale.push(ix);
            }
        }
        log::trace!("relayout {} paragraphs", stale.len());
        for ix in stale {
            self.layout_paragraph(ix);
        }
        self.editor.update_offsets();
    }

    // --- MARK: Mutation ---

    fn transaction<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.editor.undo.begin(self.editor.selection);
        let result = f(self);
        self.editor.undo.end(self.editor.selection);
        self.editor.notify_change();
        result
    }

    /// Replace paragraphs `index..index + remove` without recording undo.
    fn splice_paragraphs(&mut self, index: usize, remove: usize, contents: Vec<ParagraphContent>) {
        let count = contents.len();
        let end = (index + remove).min(self.editor.paragraphs.len());
        self.editor
            .paragraphs
            .splice(index..end, contents.into_iter().map(Paragraph::new));
        if self.editor.paragraphs.is_empty() {
            self.editor
                .paragraphs
                .push(Paragraph::new(ParagraphContent::default()));
        }
        self.editor.changed = true;
        let len = self.editor.paragraphs.len();
        self.relayout(index.min(len - 1)..(index + count).min(len));
    }

    /// Replace the document `range` with `text`, returning the end of the inserted text.
    fn replace_range(&mut self, range: Range<usize>, text: &RichText<Attribute>) -> usize {
        let editor = &*self.editor;
        let len = editor.text_len();
        let range = range.start.min(len)..range.end.min(len);
        let first = editor.paragraph_index_at(range.start);
        let last = editor.paragraph_index_at(range.end).max(first);
        let head = &editor.paragraphs[first];
        let tail = &editor.paragraphs[last];
        let mut combined = slice(&head.content.text, 0..range.start - head.text_start);
        combined.append_rich(text);
        combined.append_rich(&slice(
            &tail.content.text,
            range.end - tail.text_start..tail.len(),
        ));
        let ends_document = last + 1 == editor.paragraphs.len();
        let inserted = split_paragraphs(&combined, &head.content.attributes, ends_document);
        let removed: Vec<ParagraphContent> = editor.paragraphs[first..=last]
            .iter()
            .map(|p| p.content.clone())
            .collect();
        self.editor.undo.record(Replacement {
            index: first,
            removed,
            inserted: inserted.clone(),
        });
        self.splice_paragraphs(first, last - first + 1, inserted);
        range.start + text.len()
    }

    /// Apply `f` to the content of paragraphs `indices`, recording one undo step.
    fn update_paragraphs(
        &mut self,
        indices: Range<usize>,
        mut f: impl FnMut(Range<usize>, &mut ParagraphContent),
    ) {
        let paragraphs = &self.editor.paragraphs[indices.clone()];
        let removed: Vec<ParagraphContent> = paragraphs.iter().map(|p| p.content.clone()).collect();
        let mut inserted = removed.clone();
        for (paragraph, content) in paragraphs.iter().zip(&mut inserted) {
            f(paragraph.text_range(), content);
        }
        if inserted == removed {
            return;
        }
        self.transaction(|driver| {
            let selection = driver.editor.selection;
            driver.editor.undo.record(Replacement {
                index: indices.start,
                removed,
                inserted: inserted.clone(),
            });
            driver.splice_paragraphs(indices.start, indices.len(), inserted);
            driver.editor.selection = selection;
        });
    }

    pub(crate) fn delete_range(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        self.transaction(|driver| {
            let start = driver.replace_range(range, &RichText::new());
            let caret = driver.editor.clamp_position(TextPosition::leading(start));
            driver.editor.set_selection_internal(caret.into());
        });
    }

    // --- MARK: Text ---

    /// Replace the whole document with plain `text`, clearing the undo history.
    pub fn set_text_utf8(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        self.set_text_utf32(&chars);
    }

    /// Replace the whole document with plain `text`, clearing the undo history.
    pub fn set_text_utf32(&mut self, text: &[char]) {
        let mut rich = RichText::new();
        rich.append(text, &[]);
        self.set_rich_text(&rich);
    }

    /// Replace the whole document with `text`, clearing the undo history.
    pub fn set_rich_text(&mut self, text: &RichText<Attribute>) {
        let editor = &mut *self.editor;
        editor.composition = None;
        editor.drag = None;
        editor.undo.clear();
        editor.paragraphs = split_paragraphs(text, &[], true)
            .into_iter()
            .map(Paragraph::new)
            .collect();
        editor.layout_dirty = false;
        editor.changed = true;
        let count = editor.paragraphs.len();
        self.relayout(0..count);
        let end = self.editor.text_len();
        self.editor
            .set_selection_internal(TextPosition::leading(end).into());
        self.editor.notify_change();
    }

    /// Insert `text` at the caret, replacing the selection, with the active attributes.
    pub fn insert_text_utf32(&mut self, text: &[char]) {
        self.refresh_layout();
        self.drop_composition();
        let range = self.editor.selection_range();
        if text.is_empty() && range.is_empty() {
            return;
        }
        let mut rich = RichText::new();
        rich.append(text, &self.editor.active_attributes);
        self.transaction(|driver| {
            let end = driver.replace_range(range, &rich);
            driver.editor.selection = driver.editor.caret_after_insert(end).into();
        });
    }

    /// Insert `text` at the caret, replacing the selection, with the active attributes.
    pub fn insert_text_utf8(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        self.insert_text_utf32(&chars);
    }

    /// Insert a single codepoint at the caret.
    pub fn insert_codepoint(&mut self, ch: char) {
        self.insert_text_utf32(&[ch]);
    }

    /// Insert pasted text, normalizing line endings to `\n`.
    pub fn paste_utf8(&mut self, text: &str) {
        let mut chars = Vec::with_capacity(text.len());
        let mut iter = text.chars().peekable();
        while let Some(ch) = iter.next() {
            if ch == '\r' {
                if iter.peek() == Some(&'\n') {
                    iter.next();
                }
                chars.push('\n');
            } else {
                chars.push(ch);
            }
        }
        self.insert_text_utf32(&chars);
    }

    /// Delete the selection.
    pub fn delete_selection(&mut self) {
        self.refresh_layout();
        let range = self.editor.selection_range();
        self.delete_range(range);
    }

    /// Delete the selection or the text before the caret (typical ‘backspace’ behavior).
    ///
    /// Emoji sequences are removed as a whole, combining marks one at a time.
    pub fn backdelete(&mut self) {
        self.refresh_layout();
        let range = self.editor.selection_range();
        if !range.is_empty() {
            self.delete_range(range);
            return;
        }
        let offset = range.start;
        if offset == 0 {
            return;
        }
        let editor = &*self.editor;
        let paragraph = &editor.paragraphs[editor.paragraph_index_at(offset - 1)];
        let local = offset - paragraph.text_start;
        let start = editor
            .backspace
            .start_offset(paragraph.content.text.text(), local);
        let start = paragraph.text_start + start;
        self.delete_range(start..offset);
    }

    /// Delete the selection or back to the previous word boundary.
    pub fn backdelete_word(&mut self) {
        self.refresh_layout();
        let range = self.editor.selection_range();
        if !range.is_empty() {
            self.delete_range(range);
            return;
        }
        let offset = range.start;
        let start = self
            .editor
            .move_word(TextPosition::leading(offset), false)
            .offset;
        self.delete_range(start.min(offset)..offset);
    }

    /// Delete the selection or the grapheme after the caret (typical ‘delete’ behavior).
    pub fn delete(&mut self) {
        self.refresh_layout();
        let range = self.editor.selection_range();
        if !range.is_empty() {
            self.delete_range(range);
            return;
        }
        let offset = range.start;
        let editor = &*self.editor;
        let paragraph = &editor.paragraphs[editor.paragraph_index_at(offset)];
        let local = offset - paragraph.text_start;
        let end = paragraph.text_start + paragraph.layout.next_grapheme_offset(local);
        self.delete_range(offset..end.max(offset));
    }

    /// Delete the selection or up to the next word boundary.
    pub fn delete_word(&mut self) {
        self.refresh_layout();
        let range = self.editor.selection_range();
        if !range.is_empty() {
            self.delete_range(range);
            return;
        }
        let offset = range.start;
        let end = self
            .editor
            .move_word(TextPosition::leading(offset), true)
            .offset;
        self.delete_range(offset..end.max(offset));
    }

    // --- MARK: Selection ---

    /// Set the selection, snapping both ends to grapheme boundaries.
    pub fn set_selection(&mut self, selection: TextSelection) {
        self.refresh_layout();
        self.commit_composition_utf32(None);
        let start_pos = self.editor.clamp_position(selection.start_pos);
        let end_pos = self.editor.clamp_position(selection.end_pos);
        self.editor
            .set_selection_internal(TextSelection::new(start_pos, end_pos));
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        let end = self.editor.text_len();
        self.set_selection(TextSelection::new(
            TextPosition::leading(0),
            TextPosition::leading(end),
        ));
    }

    /// Collapse the selection to the caret.
    pub fn select_none(&mut self) {
        let caret = self.editor.selection.end_pos;
        self.set_selection(caret.into());
    }

    fn move_caret(&mut self, pos: TextPosition, extend: bool) {
        let selection = if extend {
            self.editor.selection.extend_to(pos)
        } else {
            pos.into()
        };
        self.editor.set_selection_internal(selection);
    }

    // --- MARK: Input ---

    /// Handle a key press.
    pub fn process_key_pressed(&mut self, key: Key, mods: Modifiers) {
        self.refresh_layout();
        self.commit_composition_utf32(None);
        let extend = mods.shift();
        let word = mods.shortcut();
        let selection = self.editor.selection;
        let range = self.editor.selection_range();
        match key {
            Key::Left | Key::Right => {
                let right = key == Key::Right;
                let editor = &*self.editor;
                let (ix, _) = editor.local(selection.end_pos);
                let rtl = editor.paragraphs[ix].layout.is_rtl();
                let pos = if !extend && !range.is_empty() {
                    if right != rtl {
                        editor.end_position(range.end)
                    } else {
                        TextPosition::leading(range.start)
                    }
                } else if word {
                    editor.move_word(selection.end_pos, right != rtl)
                } else {
                    editor.move_horizontal(selection.end_pos, right)
                };
                self.move_caret(pos, extend);
            }
            Key::Up | Key::Down => {
                let pos = self.editor.move_vertical(selection.end_pos, key == Key::Down);
                self.move_caret(pos, extend);
            }
            Key::Home => {
                let pos = if word {
                    TextPosition::leading(0)
                } else {
                    self.editor.line_start(selection.end_pos)
                };
                self.move_caret(pos, extend);
            }
            Key::End => {
                let pos = if word {
                    let last = self.editor.paragraphs.len() - 1;
                    self.editor.paragraph_end(last)
                } else {
                    self.editor.line_end(selection.end_pos)
                };
                self.move_caret(pos, extend);
            }
            Key::Backspace if word => self.backdelete_word(),
            Key::Backspace => self.backdelete(),
            Key::Delete if word => self.delete_word(),
            Key::Delete => self.delete(),
            // Shift+Enter breaks the line without starting a new paragraph.
            Key::Enter if extend => self.insert_codepoint('\u{2028}'),
            Key::Enter => self.insert_codepoint('\n'),
            Key::Tab => self.insert_codepoint('\t'),
            Key::Escape => self.select_none(),
            Key::Character(ch) if word => match ch.to_ascii_lowercase() {
                'a' => self.select_all(),
                'z' if extend => {
                    self.redo();
                }
                'z' => {
                    self.undo();
                }
                'y' => {
                    self.redo();
                }
                _ => {}
            },
            Key::Character(_) => {}
        }
        if !matches!(key, Key::Up | Key::Down) {
            self.editor.preferred_x = None;
        }
    }

    /// Handle a mouse button press at `x`, `y` in editor coordinates.
    ///
    /// Repeated clicks select words, then lines. Shift extends the selection.
    pub fn process_mouse_click(&mut self, x: f32, y: f32, mods: Modifiers, time_ms: u64) {
        self.refresh_layout();
        self.commit_composition_utf32(None);
        let editor = &mut *self.editor;
        editor.preferred_x = None;
        if mods.shift() {
            editor.clicks.reset();
            let pos = editor.hit_test(MovementType::Selection, x, y);
            let anchor = editor.insert_offset(editor.selection.start_pos);
            editor.drag = Some(DragState {
                anchor: anchor..anchor,
                granularity: Granularity::Grapheme,
            });
            let selection = editor.selection.extend_to(pos);
            editor.set_selection_internal(selection);
            return;
        }
        let granularity = editor.clicks.click(
            x,
            y,
            time_ms,
            editor.params.double_click_time_ms,
            editor.params.double_click_distance,
        );
        let pos = editor.hit_test(MovementType::Caret, x, y);
        let unit = editor.unit_range(pos, granularity);
        let selection = match granularity {
            Granularity::Grapheme => TextSelection::caret(pos),
            _ => TextSelection::new(
                TextPosition::leading(unit.start),
                editor.end_position(unit.end),
            ),
        };
        editor.drag = Some(DragState {
            anchor: unit,
            granularity,
        });
        editor.set_selection_internal(selection);
    }

    /// Handle mouse movement with the button held.
    pub fn process_mouse_drag(&mut self, x: f32, y: f32) {
        self.refresh_layout();
        let editor = &mut *self.editor;
        let Some(drag) = editor.drag.clone() else {
            return;
        };
        let pos = editor.hit_test(MovementType::Selection, x, y);
        let selection = if drag.granularity == Granularity::Grapheme {
            editor.selection.extend_to(pos)
        } else {
            let unit = editor.unit_range(pos, drag.granularity);
            let anchor = drag.anchor;
            if unit.start < anchor.start {
                TextSelection::new(
                    editor.end_position(anchor.end),
                    TextPosition::leading(unit.start),
                )
            } else if unit.end > anchor.end {
                TextSelection::new(
                    TextPosition::leading(anchor.start),
                    editor.end_position(unit.end),
                )
            } else {
                TextSelection::new(
                    TextPosition::leading(anchor.start),
                    editor.end_position(anchor.end),
                )
            }
        };
        editor.set_selection_internal(selection);
    }

    // --- MARK: IME ---

    /// Show `text` as IME composition at the caret, with the IME caret at `caret`.
    ///
    /// Starting a composition deletes the selection.
    pub fn set_composition_utf32(&mut self, text: &[char], caret: usize) {
        self.refresh_layout();
        if text.is_empty() {
            self.clear_composition();
            return;
        }
        if self.editor.composition.is_none() {
            let range = self.editor.selection_range();
            self.delete_range(range);
        }
        let editor = &mut *self.editor;
        let composition = match editor.composition.take() {
            Some(mut composition) => {
                composition.text = text.to_vec();
                composition.caret = caret.min(text.len());
                composition
            }
            None => {
                let offset = editor.insert_offset(editor.selection.end_pos);
                let paragraph = editor.paragraph_index_at(offset);
                let mut attributes = editor.active_attributes.clone();
                attributes.extend(editor.params.composition_attributes.iter().cloned());
                Composition {
                    paragraph,
                    offset: offset - editor.paragraphs[paragraph].text_start,
                    text: text.to_vec(),
                    caret: caret.min(text.len()),
                    attributes,
                }
            }
        };
        let paragraph = composition.paragraph;
        editor.composition = Some(composition);
        self.layout_paragraph(paragraph);
        self.editor.update_offsets();
    }

    /// Insert the composition, or `text` in its place, into the document.
    pub fn commit_composition_utf32(&mut self, text: Option<&[char]>) {
        let Some(composition) = self.drop_composition() else {
            if let Some(text) = text {
                self.insert_text_utf32(text);
            }
            return;
        };
        let text = text.map(<[char]>::to_vec).unwrap_or(composition.text);
        if !text.is_empty() {
            self.insert_text_utf32(&text);
        }
    }

    /// Discard the composition.
    pub fn clear_composition(&mut self) {
        self.drop_composition();
    }

    fn drop_composition(&mut self) -> Option<Composition> {
        let composition = self.editor.composition.take()?;
        if composition.paragraph < self.editor.paragraphs.len() {
            self.layout_paragraph(composition.paragraph);
            self.editor.update_offsets();
        }
        Some(composition)
    }

    // --- MARK: Attributes ---

    /// Set `attribute` on the selection, or clear it if the whole selection has it.
    ///
    /// With an empty selection only the active attributes change.
    pub fn toggle_attribute(&mut self, attribute: Attribute) {
        self.refresh_layout();
        if self.editor.is_attribute_active(&attribute) {
            self.clear_attribute(&attribute);
        } else {
            self.apply_attribute(attribute);
        }
    }

    /// Set `attribute` on the selection, replacing conflicting attributes.
    pub fn apply_attribute(&mut self, attribute: Attribute) {
        self.refresh_layout();
        self.commit_composition_utf32(None);
        let collection = self.editor.params.attribute_collection.clone();
        let collection = collection.as_deref();
        self.editor
            .active_attributes
            .retain(|a| !replaces(a, &attribute, collection));
        self.editor.active_attributes.push(attribute.clone());
        let range = self.editor.selection_range();
        if range.is_empty() {
            return;
        }
        let paragraphs = self.editor.selected_paragraphs();
        self.update_paragraphs(paragraphs, |pr, content| {
            let start = range.start.max(pr.start) - pr.start;
            let end = range.end.min(pr.end) - pr.start;
            if start >= end {
                return;
            }
            let cleared = content
                .text
                .clear_attribute(start..end, |a| replaces(a, &attribute, collection));
            let added = content.text.add_attribute(start..end, attribute.clone());
            debug_assert!(
                cleared.is_ok() && added.is_ok(),
                "paragraph-local range {start}..{end} out of bounds"
            );
        });
    }

    /// Remove `attribute` from the selection.
    pub fn clear_attribute(&mut self, attribute: &Attribute) {
        self.refresh_layout();
        self.commit_composition_utf32(None);
        self.editor.active_attributes.retain(|a| a != attribute);
        let range = self.editor.selection_range();
        if range.is_empty() {
            return;
        }
        let paragraphs = self.editor.selected_paragraphs();
        self.update_paragraphs(paragraphs, |pr, content| {
            let start = range.start.max(pr.start) - pr.start;
            let end = range.end.min(pr.end) - pr.start;
            if start < end {
                let cleared = content.text.clear_attribute(start..end, |a| a == attribute);
                debug_assert!(
                    cleared.is_ok(),
                    "paragraph-local range {start}..{end} out of bounds"
                );
            }
        });
    }

    /// Set a paragraph attribute on every selected paragraph, replacing attributes of the
    /// same kind, or references to sets of the same group.
    pub fn set_paragraph_attribute(&mut self, attribute: Attribute) {
        self.refresh_layout();
        self.commit_composition_utf32(None);
        let collection = self.editor.params.attribute_collection.clone();
        let collection = collection.as_deref();
        let paragraphs = self.editor.selected_paragraphs();
        self.update_paragraphs(paragraphs, |_, content| {
            content
                .attributes
                .retain(|a| !replaces(a, &attribute, collection));
            content.attributes.push(attribute.clone());
        });
    }

    /// Remove paragraph attributes `attribute` would replace from every selected paragraph.
    pub fn clear_paragraph_attribute(&mut self, attribute: &Attribute) {
        self.refresh_layout();
        self.commit_composition_utf32(None);
        let collection = self.editor.params.attribute_collection.clone();
        let collection = collection.as_deref();
        let paragraphs = self.editor.selected_paragraphs();
        self.update_paragraphs(paragraphs, |_, content| {
            content
                .attributes
                .retain(|a| !replaces(a, attribute, collection));
        });
    }

    // --- MARK: Undo ---

    /// Start grouping edits into one undo step. Calls nest.
    pub fn undo_transaction_begin(&mut self) {
        self.editor.undo.begin(self.editor.selection);
    }

    /// End a group started with [`undo_transaction_begin`](Self::undo_transaction_begin).
    pub fn undo_transaction_end(&mut self) {
        self.editor.undo.end(self.editor.selection);
        self.editor.notify_change();
    }

    /// Revert the last undo step. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.refresh_layout();
        self.drop_composition();
        let Some(transaction) = self.editor.undo.undo().cloned() else {
            return false;
        };
        log::debug!("undo {} edits", transaction.edits.len());
        for edit in transaction.edits.iter().rev() {
            self.splice_paragraphs(edit.index, edit.inserted.len(), edit.removed.clone());
        }
        self.editor
            .set_selection_internal(transaction.selection_before);
        self.editor.notify_change();
        true
    }

    /// Reapply the last undone step. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.refresh_layout();
        self.drop_composition();
        let Some(transaction) = self.editor.undo.redo().cloned() else {
            return false;
        };
        log::debug!("redo {} edits", transaction.edits.len());
        for edit in &transaction.edits {
            self.splice_paragraphs(edit.index, edit.removed.len(), edit.inserted.clone());
        }
        self.editor
            .set_selection_internal(transaction.selection_after);
        self.editor.notify_change();
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use rich_text::RichText;

    use super::{replaces, split_paragraphs};
    use crate::attribute::{Attribute, AttributeCollection, AttributeSet};

    fn texts(text: &str, ends_document: bool) -> Vec<alloc::string::String> {
        let rich = RichText::<Attribute>::from(text);
        split_paragraphs(&rich, &[], ends_document)
            .iter()
            .map(|p| p.text.to_utf8())
            .collect()
    }

    #[test]
    fn paragraphs_keep_separators() {
        assert_eq!(texts("a\nb", true), ["a\n", "b"]);
        assert_eq!(texts("a\r\nb\rc", true), ["a\r\n", "b\r", "c"]);
        assert_eq!(texts("a\n", true), ["a\n", ""]);
        assert_eq!(texts("a\n", false), ["a\n"]);
        assert_eq!(texts("", false), [""]);
        assert_eq!(texts("a\u{2028}b", true), ["a\u{2028}b"]);
    }

    #[test]
    fn replacement_rules() {
        let mut collection = AttributeCollection::new();
        let set = AttributeSet::default();
        let h1 = collection.add_to_group("h1", "heading", &set);
        let h2 = collection.add_to_group("h2", "heading", &set);
        let quote = collection.add("quote", &set);
        let c = Some(&collection);
        let normal = Attribute::FontWeight(crate::attribute::FontWeight::NORMAL);
        assert!(replaces(&Attribute::bold(), &normal, c));
        assert!(!replaces(&Attribute::underline(), &Attribute::strikethrough(), c));
        assert!(replaces(&Attribute::underline(), &Attribute::underline(), c));
        assert!(replaces(&Attribute::Reference(h1), &Attribute::Reference(h2), c));
        assert!(!replaces(&Attribute::Reference(h1), &Attribute::Reference(quote), c));
    }
}
