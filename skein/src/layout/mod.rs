// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text layout.
//!
//! A [`Layout`] is built in one go from [`LayoutParams`] and a list of [`ContentRun`]s and
//! is never modified afterwards. Changing the text or the attributes means building a
//! new layout.

mod build;
mod hit;
mod params;
mod style;

use alloc::vec::Vec;
use core::ops::Range;

use icu_properties::props::Script;
use peniko::kurbo::Rect;
use peniko::Color;

use crate::analysis::TextProperty;
use crate::attribute::{DecorationPosition, DecorationStyle};
use crate::font::{FontHandle, IconHandle};

pub(crate) use build::Scratch;
pub use hit::{Affinity, CaretStep, MovementType, TextPosition, VisualCaret};
pub use params::{ContentRun, LayoutParams};
pub use style::{ParagraphStyle, RunStyle};

/// A positioned glyph.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glyph {
    /// X position of the glyph origin.
    pub offset_x: f32,
    /// Y position of the glyph origin, y-down.
    ///
    /// For icon and object runs this is the bottom edge of the object.
    pub offset_y: f32,
    /// Horizontal advance, including letter and word spacing.
    pub advance_x: f32,
    /// Glyph id, `0` for placeholder glyphs.
    pub gid: u32,
    /// Font of the glyph, `None` for placeholders, icons and objects.
    pub font: Option<FontHandle>,
    /// Index into [`Layout::clusters`].
    pub cluster_idx: u32,
    /// Index into [`Layout::styles`] of the content run the glyph came from.
    pub span_idx: u32,
}

/// Maps a grapheme range to its glyphs.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// Codepoint range of the cluster.
    pub text_range: Range<usize>,
    /// Glyph range of the cluster in [`Layout::glyphs`].
    pub glyph_range: Range<usize>,
    /// X position of the left edge of the cluster.
    pub x: f32,
    /// Width of the cluster.
    pub advance: f32,
    /// Index into [`Layout::runs`].
    pub run_idx: u32,
}

/// What kind of content produced a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentRunType {
    /// Text given as UTF-8.
    #[default]
    Utf8,
    /// Text given as UTF-32.
    Utf32,
    /// An icon from the icon collection.
    Icon,
    /// An inline object sized by the caller.
    Object,
}

/// The purpose of a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunRole {
    /// Content from the input text.
    #[default]
    Content,
    /// The ellipsis added by [`TextOverflow::Ellipsis`](crate::attribute::TextOverflow::Ellipsis).
    Ellipsis,
    /// A list marker.
    ListMarker,
}

/// Contiguous glyphs sharing font, script, direction and attributes, in visual order.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRun {
    /// What produced this run.
    pub content_type: ContentRunType,
    /// Content, ellipsis or list marker.
    pub role: RunRole,
    /// Logical codepoint range.
    pub text_range: Range<usize>,
    /// Range into [`Layout::glyphs`].
    pub glyph_range: Range<usize>,
    /// Range into [`Layout::clusters`].
    pub cluster_range: Range<usize>,
    /// Font, if any.
    pub font: Option<FontHandle>,
    /// Font size the run was shaped at.
    pub font_size: f32,
    /// Script of the run.
    pub script: Script,
    /// Bidi level of the run.
    pub level: u8,
    /// Index into [`Layout::styles`].
    pub style_idx: u32,
    /// Caller supplied id of the content run.
    pub content_id: u64,
    /// Icon of icon runs.
    pub icon: Option<IconHandle>,
    /// X position of the left edge.
    pub x: f32,
    /// Width of the run.
    pub advance: f32,
    /// Index into [`Layout::lines`].
    pub line_idx: u32,
}

impl LayoutRun {
    /// Returns `true` for right-to-left runs.
    pub fn is_rtl(&self) -> bool {
        self.level & 1 != 0
    }
}

/// One line of a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// Logical codepoint range, including trailing whitespace and line break characters.
    pub text_range: Range<usize>,
    /// Range into [`Layout::glyphs`].
    pub glyph_range: Range<usize>,
    /// Range into [`Layout::runs`], in visual order.
    pub run_range: Range<usize>,
    /// Range into [`Layout::clusters`], in visual order.
    pub cluster_range: Range<usize>,
    /// Distance from the top of the line to the baseline.
    pub ascender: f32,
    /// Distance from the baseline to the bottom of the line.
    pub descender: f32,
    /// Y position of the baseline.
    pub baseline: f32,
    /// Line box, without hanging whitespace.
    pub bounds: Rect,
    /// Union of the line box and the ink bounds of the glyphs and decorations.
    pub culling_bounds: Rect,
    /// Start of the last grapheme before any line break characters.
    pub last_grapheme_offset: usize,
    /// The line ends with an ellipsis.
    pub is_truncated: bool,
}

impl Line {
    /// Y position of the top of the line.
    pub fn top(&self) -> f32 {
        self.baseline - self.ascender
    }

    /// Y position of the bottom of the line.
    pub fn bottom(&self) -> f32 {
        self.baseline + self.descender
    }

    /// Height of the line.
    pub fn height(&self) -> f32 {
        self.ascender + self.descender
    }
}

/// Geometry of one decoration line segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutDecoration {
    /// X position of the start.
    pub x: f32,
    /// Y position of the center of the stroke.
    pub y: f32,
    /// Length of the segment.
    pub length: f32,
    /// Stroke thickness.
    pub thickness: f32,
    /// Offset of the stroke pattern, keeps dashes continuous across segments.
    pub pattern_offset: f32,
    /// Where the line is drawn.
    pub position: DecorationPosition,
    /// Stroke style.
    pub style: DecorationStyle,
    /// Stroke color.
    pub color: Color,
    /// Index into [`Layout::styles`] of the first run the segment covers.
    pub span_idx: u32,
    /// Index into [`Layout::lines`].
    pub line_idx: u32,
}

/// Content run as recorded in the layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentRange {
    /// Codepoint range.
    pub text_range: Range<usize>,
    /// Kind of content.
    pub content_type: ContentRunType,
    /// Caller supplied id.
    pub id: u64,
}

/// Shaped, wrapped and positioned text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub(crate) text: Vec<char>,
    pub(crate) properties: Vec<TextProperty>,
    pub(crate) contents: Vec<ContentRange>,
    pub(crate) styles: Vec<RunStyle>,
    pub(crate) glyphs: Vec<Glyph>,
    pub(crate) clusters: Vec<Cluster>,
    pub(crate) runs: Vec<LayoutRun>,
    pub(crate) lines: Vec<Line>,
    pub(crate) decorations: Vec<LayoutDecoration>,
    pub(crate) paragraph: ParagraphStyle,
    pub(crate) is_rtl: bool,
    pub(crate) layout_width: f32,
    pub(crate) layout_height: f32,
    pub(crate) visible_lines: usize,
    pub(crate) bounds: Rect,
}

impl Layout {
    /// The laid out text.
    pub fn text(&self) -> &[char] {
        &self.text
    }

    /// Number of codepoints.
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// Analysis results, one per codepoint.
    pub fn properties(&self) -> &[TextProperty] {
        &self.properties
    }

    /// The content runs the layout was built from.
    pub fn contents(&self) -> &[ContentRange] {
        &self.contents
    }

    /// Resolved styles, indexed by [`Glyph::span_idx`] and [`LayoutRun::style_idx`].
    pub fn styles(&self) -> &[RunStyle] {
        &self.styles
    }

    /// Resolved paragraph level style.
    pub fn paragraph_style(&self) -> &ParagraphStyle {
        &self.paragraph
    }

    /// All glyphs, line by line in visual order.
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// All clusters, line by line in visual order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// All runs, line by line in visual order.
    pub fn runs(&self) -> &[LayoutRun] {
        &self.runs
    }

    /// All lines. There is always at least one.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Decoration segments.
    pub fn decorations(&self) -> &[LayoutDecoration] {
        &self.decorations
    }

    /// Returns `true` if the resolved base direction is right to left.
    pub fn is_rtl(&self) -> bool {
        self.is_rtl
    }

    /// Width the layout was built for, `0.0` when unconstrained.
    pub fn layout_width(&self) -> f32 {
        self.layout_width
    }

    /// Height the layout was built for, `0.0` when unconstrained.
    pub fn layout_height(&self) -> f32 {
        self.layout_height
    }

    /// Number of lines inside the layout box. Clipped lines follow the visible ones.
    pub fn visible_line_count(&self) -> usize {
        self.visible_lines
    }

    /// Union of the visible line boxes.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Total height of all lines.
    pub fn height(&self) -> f32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => last.bottom() - first.top(),
            _ => 0.0,
        }
    }

    /// Line index containing codepoint `offset`, clamped to the last line.
    pub fn line_index_for_offset(&self, offset: usize) -> usize {
        self.lines
            .iter()
            .position(|line| offset < line.text_range.end)
            .unwrap_or(self.lines.len().saturating_sub(1))
    }
}
