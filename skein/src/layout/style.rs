// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;
use alloc::vec::Vec;

use peniko::Color;
use smallvec::SmallVec;

use crate::attribute::{
    Attribute, AttributeCollection, AttributeKind, AttributeSet, BaselineShift, Decoration,
    FontFamily, FontFeature, FontStretch, FontStyle, FontWeight, HorizontalAlign, LineHeight,
    ListMarker, ObjectAlign, ObjectPadding, TextDirection, TextOverflow, TextWrap, VerticalAlign,
    VerticalTrim,
};

/// Character level style resolved once per content run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunStyle {
    /// Font family.
    pub family: FontFamily,
    /// Font weight.
    pub weight: FontWeight,
    /// Font style.
    pub style: FontStyle,
    /// Font stretch.
    pub stretch: FontStretch,
    /// Language tag.
    pub lang: Option<Arc<str>>,
    /// Font size before baseline shift scaling.
    pub font_size: f32,
    /// Superscript or subscript.
    pub baseline_shift: BaselineShift,
    /// Extra space after each grapheme.
    pub letter_spacing: f32,
    /// Extra space after whitespace.
    pub word_spacing: f32,
    /// Line height.
    pub line_height: LineHeight,
    /// Distance between tab stops.
    pub tab_stop_increment: f32,
    /// Text color.
    pub fill: Color,
    /// Font features, in application order.
    pub features: SmallVec<[FontFeature; 4]>,
    /// Decorations, in application order.
    pub decorations: SmallVec<[Decoration; 2]>,
    /// Vertical alignment of icons and objects.
    pub object_align: ObjectAlign,
    /// Padding of icons and objects.
    pub object_padding: ObjectPadding,
}

impl RunStyle {
    /// Resolve the style of `set`.
    pub fn resolve(set: &AttributeSet<'_>, collection: Option<&AttributeCollection>) -> Self {
        let mut cumulative = Vec::new();
        set.get_by_kind(AttributeKind::FontFeature, collection, &mut cumulative);
        let features = cumulative
            .iter()
            .filter_map(|a| match a {
                Attribute::FontFeature(f) => Some(*f),
                _ => None,
            })
            .collect();
        cumulative.clear();
        set.get_by_kind(AttributeKind::Decoration, collection, &mut cumulative);
        let decorations = cumulative
            .iter()
            .filter_map(|a| match a {
                Attribute::Decoration(d) => Some(*d),
                _ => None,
            })
            .collect();
        Self {
            family: set.font_family(collection),
            weight: set.font_weight(collection),
            style: set.font_style(collection),
            stretch: set.font_stretch(collection),
            lang: set.lang(collection).map(Arc::from),
            font_size: set.font_size(collection),
            baseline_shift: set.baseline_shift(collection),
            letter_spacing: set.letter_spacing(collection),
            word_spacing: set.word_spacing(collection),
            line_height: set.line_height(collection),
            tab_stop_increment: set.tab_stop_increment(collection),
            fill: set.fill_color(collection),
            features,
            decorations,
            object_align: set.object_align(collection),
            object_padding: set.object_padding(collection),
        }
    }

    /// Size the text is shaped at.
    pub fn shaping_size(&self) -> f32 {
        self.font_size * self.baseline_shift.scale()
    }

    /// Baseline offset of shifted text, negative is up.
    pub fn baseline_offset(&self) -> f32 {
        self.baseline_shift.offset() * self.font_size
    }

    /// Distance between tab stops, defaulting to twice the font size.
    pub fn tab_stop(&self) -> f32 {
        if self.tab_stop_increment > 0.0 {
            self.tab_stop_increment
        } else {
            self.font_size * 2.0
        }
    }
}

/// Paragraph level style resolved from the layout attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphStyle {
    /// Requested base direction.
    pub direction: TextDirection,
    /// Horizontal alignment.
    pub horizontal_align: HorizontalAlign,
    /// Vertical alignment.
    pub vertical_align: VerticalAlign,
    /// Vertical trim.
    pub vertical_trim: VerticalTrim,
    /// Wrapping mode.
    pub wrap: TextWrap,
    /// Overflow handling.
    pub overflow: TextOverflow,
    /// Indentation of every line, in layout units.
    pub indent: f32,
    /// List marker.
    pub list_marker: Option<ListMarker>,
}

impl ParagraphStyle {
    /// Resolve the paragraph style of `set`.
    pub fn resolve(set: &AttributeSet<'_>, collection: Option<&AttributeCollection>) -> Self {
        let list_marker = set
            .list_marker(collection)
            .filter(|m| m.style != crate::attribute::ListMarkerStyle::None);
        let level = set.indent_level(collection) as f32;
        let indent = level * set.indent_increment(collection)
            + list_marker.map(|m| m.indent).unwrap_or(0.0);
        Self {
            direction: set.text_direction(collection),
            horizontal_align: set.horizontal_align(collection),
            vertical_align: set.vertical_align(collection),
            vertical_trim: set.vertical_trim(collection),
            wrap: set.text_wrap(collection),
            overflow: set.text_overflow(collection),
            indent,
            list_marker,
        }
    }
}
