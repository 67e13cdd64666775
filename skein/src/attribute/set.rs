// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use peniko::Color;

use super::{
    Attribute, AttributeCollection, AttributeKind, BaselineShift, FontFamily, FontStretch,
    FontStyle, FontWeight, HorizontalAlign, LineHeight, ListMarker, ObjectAlign, ObjectPadding,
    ParagraphPadding, TextDirection, TextOverflow, TextWrap, VerticalAlign, VerticalTrim,
};

/// References nested deeper than this are ignored.
const MAX_REFERENCE_DEPTH: u32 = 8;

/// Default font size.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Default width of one indentation level.
pub const DEFAULT_INDENT_INCREMENT: f32 = 32.0;

/// An ordered, non-owning view of attributes with an optional parent.
///
/// Lookups scan `items` from last to first, so later attributes override earlier ones,
/// and fall back to the parent chain. [`Attribute::Reference`] items are resolved against
/// the [`AttributeCollection`] passed to the lookup at the time of the query.
#[derive(Copy, Clone, Debug, Default)]
pub struct AttributeSet<'a> {
    items: &'a [Attribute],
    parent: Option<&'a AttributeSet<'a>>,
}

impl<'a> AttributeSet<'a> {
    /// An empty set without a parent.
    pub const EMPTY: AttributeSet<'static> = AttributeSet {
        items: &[],
        parent: None,
    };

    /// Create a set over `items`.
    pub const fn new(items: &'a [Attribute]) -> Self {
        Self {
            items,
            parent: None,
        }
    }

    /// Create a set over `items` that inherits from `parent`.
    pub const fn with_parent(items: &'a [Attribute], parent: &'a AttributeSet<'a>) -> Self {
        Self {
            items,
            parent: Some(parent),
        }
    }

    /// The local attributes of this set.
    pub fn items(&self) -> &'a [Attribute] {
        self.items
    }

    /// The parent set.
    pub fn parent(&self) -> Option<&'a AttributeSet<'a>> {
        self.parent
    }

    /// Returns `true` if neither this set nor its parents have any items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.parent.is_none_or(|p| p.is_empty())
    }

    /// Find the effective attribute of `kind`.
    pub fn find<'s>(
        &'s self,
        kind: AttributeKind,
        collection: Option<&'s AttributeCollection>,
    ) -> Option<&'s Attribute> {
        let mut set = Some(self);
        while let Some(current) = set {
            if let Some(found) = find_in_items(current.items, kind, collection, 0) {
                return Some(found);
            }
            set = current.parent;
        }
        None
    }

    /// The effective attribute of `kind`, or its default when absent.
    ///
    /// See [`Attribute::default_for`] for kinds without a default.
    pub fn get(
        &self,
        kind: AttributeKind,
        collection: Option<&AttributeCollection>,
    ) -> Option<Attribute> {
        match self.find(kind, collection) {
            Some(found) => Some(found.clone()),
            None => Attribute::default_for(kind),
        }
    }

    /// Collect every attribute of `kind` in the chain, parents first, in application order.
    pub fn get_by_kind<'s>(
        &'s self,
        kind: AttributeKind,
        collection: Option<&'s AttributeCollection>,
        out: &mut Vec<&'s Attribute>,
    ) {
        if let Some(parent) = self.parent {
            parent.get_by_kind(kind, collection, out);
        }
        collect_in_items(self.items, kind, collection, 0, out);
    }

    /// Returns `true` if the chain contains an attribute of `kind`.
    pub fn contains(&self, kind: AttributeKind, collection: Option<&AttributeCollection>) -> bool {
        self.find(kind, collection).is_some()
    }

    /// Flatten the chain into an owned list, parents first.
    ///
    /// References are kept as references so the result resolves against the state of
    /// the collection at lookup time.
    pub fn copy_flat(&self) -> Vec<Attribute> {
        let mut out = Vec::new();
        self.copy_flat_into(&mut out);
        out
    }

    fn copy_flat_into(&self, out: &mut Vec<Attribute>) {
        if let Some(parent) = self.parent {
            parent.copy_flat_into(out);
        }
        out.extend(self.items.iter().cloned());
    }

    /// Text direction, defaults to [`TextDirection::Auto`].
    pub fn text_direction(&self, collection: Option<&AttributeCollection>) -> TextDirection {
        match self.find(AttributeKind::TextDirection, collection) {
            Some(Attribute::TextDirection(v)) => *v,
            _ => TextDirection::default(),
        }
    }

    /// Language tag, defaults to none.
    pub fn lang<'s>(&'s self, collection: Option<&'s AttributeCollection>) -> Option<&'s str> {
        match self.find(AttributeKind::Lang, collection) {
            Some(Attribute::Lang(v)) => Some(v.as_ref()),
            _ => None,
        }
    }

    /// Font family, defaults to [`FontFamily::Default`].
    pub fn font_family(&self, collection: Option<&AttributeCollection>) -> FontFamily {
        match self.find(AttributeKind::FontFamily, collection) {
            Some(Attribute::FontFamily(v)) => v.clone(),
            _ => FontFamily::Default,
        }
    }

    /// Font size, defaults to 16.
    pub fn font_size(&self, collection: Option<&AttributeCollection>) -> f32 {
        match self.find(AttributeKind::FontSize, collection) {
            Some(Attribute::FontSize(v)) => *v,
            _ => DEFAULT_FONT_SIZE,
        }
    }

    /// Font weight, defaults to [`FontWeight::NORMAL`].
    pub fn font_weight(&self, collection: Option<&AttributeCollection>) -> FontWeight {
        match self.find(AttributeKind::FontWeight, collection) {
            Some(Attribute::FontWeight(v)) => *v,
            _ => FontWeight::NORMAL,
        }
    }

    /// Font style, defaults to [`FontStyle::Normal`].
    pub fn font_style(&self, collection: Option<&AttributeCollection>) -> FontStyle {
        match self.find(AttributeKind::FontStyle, collection) {
            Some(Attribute::FontStyle(v)) => *v,
            _ => FontStyle::Normal,
        }
    }

    /// Font stretch, defaults to [`FontStretch::NORMAL`].
    pub fn font_stretch(&self, collection: Option<&AttributeCollection>) -> FontStretch {
        match self.find(AttributeKind::FontStretch, collection) {
            Some(Attribute::FontStretch(v)) => *v,
            _ => FontStretch::NORMAL,
        }
    }

    /// Letter spacing, defaults to 0.
    pub fn letter_spacing(&self, collection: Option<&AttributeCollection>) -> f32 {
        match self.find(AttributeKind::LetterSpacing, collection) {
            Some(Attribute::LetterSpacing(v)) => *v,
            _ => 0.0,
        }
    }

    /// Word spacing, defaults to 0.
    pub fn word_spacing(&self, collection: Option<&AttributeCollection>) -> f32 {
        match self.find(AttributeKind::WordSpacing, collection) {
            Some(Attribute::WordSpacing(v)) => *v,
            _ => 0.0,
        }
    }

    /// Line height, defaults to [`LineHeight::Normal`].
    pub fn line_height(&self, collection: Option<&AttributeCollection>) -> LineHeight {
        match self.find(AttributeKind::LineHeight, collection) {
            Some(Attribute::LineHeight(v)) => *v,
            _ => LineHeight::Normal,
        }
    }

    /// Tab stop increment, defaults to 0 (twice the font size).
    pub fn tab_stop_increment(&self, collection: Option<&AttributeCollection>) -> f32 {
        match self.find(AttributeKind::TabStopIncrement, collection) {
            Some(Attribute::TabStopIncrement(v)) => *v,
            _ => 0.0,
        }
    }

    /// Fill color, defaults to opaque black.
    pub fn fill_color(&self, collection: Option<&AttributeCollection>) -> Color {
        match self.find(AttributeKind::Fill, collection) {
            Some(Attribute::Fill(v)) => *v,
            _ => Color::BLACK,
        }
    }

    /// Baseline shift, defaults to none.
    pub fn baseline_shift(&self, collection: Option<&AttributeCollection>) -> BaselineShift {
        match self.find(AttributeKind::BaselineShift, collection) {
            Some(Attribute::BaselineShift(v)) => *v,
            _ => BaselineShift::None,
        }
    }

    /// Object alignment, defaults to [`ObjectAlign::Baseline`].
    pub fn object_align(&self, collection: Option<&AttributeCollection>) -> ObjectAlign {
        match self.find(AttributeKind::ObjectAlign, collection) {
            Some(Attribute::ObjectAlign(v)) => *v,
            _ => ObjectAlign::Baseline,
        }
    }

    /// Object padding, defaults to zero.
    pub fn object_padding(&self, collection: Option<&AttributeCollection>) -> ObjectPadding {
        match self.find(AttributeKind::ObjectPadding, collection) {
            Some(Attribute::ObjectPadding(v)) => *v,
            _ => ObjectPadding::default(),
        }
    }

    /// Horizontal alignment, defaults to [`HorizontalAlign::Start`].
    pub fn horizontal_align(&self, collection: Option<&AttributeCollection>) -> HorizontalAlign {
        match self.find(AttributeKind::HorizontalAlign, collection) {
            Some(Attribute::HorizontalAlign(v)) => *v,
            _ => HorizontalAlign::Start,
        }
    }

    /// Vertical alignment, defaults to [`VerticalAlign::Top`].
    pub fn vertical_align(&self, collection: Option<&AttributeCollection>) -> VerticalAlign {
        match self.find(AttributeKind::VerticalAlign, collection) {
            Some(Attribute::VerticalAlign(v)) => *v,
            _ => VerticalAlign::Top,
        }
    }

    /// Vertical trim, defaults to [`VerticalTrim::Default`].
    pub fn vertical_trim(&self, collection: Option<&AttributeCollection>) -> VerticalTrim {
        match self.find(AttributeKind::VerticalTrim, collection) {
            Some(Attribute::VerticalTrim(v)) => *v,
            _ => VerticalTrim::Default,
        }
    }

    /// Text wrap, defaults to [`TextWrap::None`].
    pub fn text_wrap(&self, collection: Option<&AttributeCollection>) -> TextWrap {
        match self.find(AttributeKind::TextWrap, collection) {
            Some(Attribute::TextWrap(v)) => *v,
            _ => TextWrap::None,
        }
    }

    /// Text overflow, defaults to [`TextOverflow::None`].
    pub fn text_overflow(&self, collection: Option<&AttributeCollection>) -> TextOverflow {
        match self.find(AttributeKind::TextOverflow, collection) {
            Some(Attribute::TextOverflow(v)) => *v,
            _ => TextOverflow::None,
        }
    }

    /// Indent level, defaults to 0.
    pub fn indent_level(&self, collection: Option<&AttributeCollection>) -> u32 {
        match self.find(AttributeKind::IndentLevel, collection) {
            Some(Attribute::IndentLevel(v)) => *v,
            _ => 0,
        }
    }

    /// Indent increment, defaults to 32.
    pub fn indent_increment(&self, collection: Option<&AttributeCollection>) -> f32 {
        match self.find(AttributeKind::IndentIncrement, collection) {
            Some(Attribute::IndentIncrement(v)) => *v,
            _ => DEFAULT_INDENT_INCREMENT,
        }
    }

    /// List marker, defaults to none.
    pub fn list_marker(&self, collection: Option<&AttributeCollection>) -> Option<ListMarker> {
        match self.find(AttributeKind::ListMarker, collection) {
            Some(Attribute::ListMarker(v)) => Some(*v),
            _ => None,
        }
    }

    /// Paragraph padding, defaults to zero.
    pub fn paragraph_padding(&self, collection: Option<&AttributeCollection>) -> ParagraphPadding {
        match self.find(AttributeKind::ParagraphPadding, collection) {
            Some(Attribute::ParagraphPadding(v)) => *v,
            _ => ParagraphPadding::default(),
        }
    }
}

fn find_in_items<'s>(
    items: &'s [Attribute],
    kind: AttributeKind,
    collection: Option<&'s AttributeCollection>,
    depth: u32,
) -> Option<&'s Attribute> {
    for item in items.iter().rev() {
        if item.kind() == kind {
            return Some(item);
        }
        if let Attribute::Reference(handle) = item {
            if depth >= MAX_REFERENCE_DEPTH {
                continue;
            }
            let Some(referenced) = collection.and_then(|c| c.items(*handle)) else {
                continue;
            };
            if let Some(found) = find_in_items(referenced, kind, collection, depth + 1) {
                return Some(found);
            }
        }
    }
    None
}

fn collect_in_items<'s>(
    items: &'s [Attribute],
    kind: AttributeKind,
    collection: Option<&'s AttributeCollection>,
    depth: u32,
    out: &mut Vec<&'s Attribute>,
) {
    for item in items {
        if item.kind() == kind {
            out.push(item);
        } else if let Attribute::Reference(handle) = item {
            if depth >= MAX_REFERENCE_DEPTH {
                continue;
            }
            if let Some(referenced) = collection.and_then(|c| c.items(*handle)) {
                collect_in_items(referenced, kind, collection, depth + 1, out);
            }
        }
    }
}
