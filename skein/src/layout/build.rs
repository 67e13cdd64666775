// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout build pipeline.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;
use core::ops::Range;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;
use icu_properties::props::Script;
use peniko::kurbo::Rect;
use rich_text::RichText;

use super::params::Content;
use super::style::{ParagraphStyle, RunStyle};
use super::{
    Cluster, ContentRange, ContentRun, ContentRunType, Glyph, Layout, LayoutDecoration,
    LayoutParams, LayoutRun, Line, RunRole,
};
use crate::analysis::TextProperty;
use crate::attribute::{
    Attribute, AttributeSet, DecorationPosition, FontFamily, HorizontalAlign, LineHeight,
    ListMarkerStyle, ObjectAlign, TextDirection, TextOverflow, TextWrap, VerticalAlign,
    VerticalTrim,
};
use crate::context::LayoutContext;
use crate::font::{FallbackRequest, FontContext, FontHandle, FontMetrics, FontQuery, IconHandle};
use crate::shape::{ShapeRequest, ShapedGlyph};
use crate::util::{nearly_eq, to_f64};

const OBJECT_REPLACEMENT: char = '\u{FFFC}';
const ELLIPSIS: char = '\u{2026}';
/// Advance of placeholder glyphs, relative to the font size.
const PLACEHOLDER_ADVANCE: f32 = 0.5;

#[derive(Copy, Clone, Debug)]
enum SlotKind {
    Text { utf8: bool },
    Icon(IconHandle),
    Object { width: f32, height: f32 },
}

#[derive(Clone, Debug)]
struct ContentSlot {
    range: Range<usize>,
    kind: SlotKind,
    id: u64,
}

#[derive(Clone, Debug, Default)]
struct Item {
    range: Range<usize>,
    slot: usize,
    script: Option<Script>,
    level: u8,
    font: Option<FontHandle>,
    size: f32,
    ascender: f32,
    descender: f32,
    /// Vertical offset of the glyph origins from the line baseline.
    glyph_y: f32,
}

impl Item {
    fn is_rtl(&self) -> bool {
        self.level & 1 != 0
    }
}

#[derive(Clone, Debug, Default)]
struct LogicalCluster {
    text_range: Range<usize>,
    item: usize,
    glyphs: Range<usize>,
    advance: f32,
    /// Spacing added after the last glyph.
    extra: f32,
    break_after: bool,
    must_break: bool,
    whitespace: bool,
    tab: bool,
    zero_advance: bool,
}

#[derive(Clone, Debug, Default)]
struct LineSpan {
    clusters: Range<usize>,
    ascender: f32,
    descender: f32,
    baseline: f32,
    truncated: bool,
}

#[derive(Clone, Debug)]
struct LineItem {
    item: usize,
    clusters: Range<usize>,
    level: u8,
}

#[derive(Clone, Debug)]
struct FontCacheEntry {
    slot: usize,
    script: Option<Script>,
    emoji: bool,
    fonts: Range<usize>,
}

/// Intermediate buffers of a layout build, reset when the build ends.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    slots: Vec<ContentSlot>,
    items: Vec<Item>,
    glyphs: Vec<ShapedGlyph>,
    shaped: Vec<ShapedGlyph>,
    clusters: Vec<LogicalCluster>,
    groups: Vec<(usize, Range<usize>)>,
    fonts: Vec<FontHandle>,
    font_cache: Vec<FontCacheEntry>,
    fallback_tried: Vec<(Option<Script>, FontFamily)>,
    missing_warned: Vec<Option<Script>>,
    lines: Vec<LineSpan>,
    line_items: Vec<LineItem>,
    ellipsis: Vec<ShapedGlyph>,
    ellipsis_item: usize,
    marker: Vec<ShapedGlyph>,
    marker_font: Option<FontHandle>,
    marker_size: f32,
    marker_text: String,
    marker_chars: Vec<char>,
}

impl Scratch {
    pub(crate) fn reset(&mut self) {
        self.slots.clear();
        self.items.clear();
        self.glyphs.clear();
        self.shaped.clear();
        self.clusters.clear();
        self.groups.clear();
        self.fonts.clear();
        self.font_cache.clear();
        self.fallback_tried.clear();
        self.missing_warned.clear();
        self.lines.clear();
        self.line_items.clear();
        self.ellipsis.clear();
        self.ellipsis_item = 0;
        self.marker.clear();
        self.marker_font = None;
        self.marker_size = 0.0;
        self.marker_text.clear();
        self.marker_chars.clear();
    }
}

impl Layout {
    /// Build a layout from a list of content runs.
    pub fn build(
        lcx: &mut LayoutContext,
        fcx: &mut FontContext,
        params: &LayoutParams<'_>,
        runs: &[ContentRun<'_>],
    ) -> Self {
        build_layout(lcx, fcx, params, runs)
    }

    /// Build a layout of UTF-8 `text` with `attributes`.
    pub fn build_utf8(
        lcx: &mut LayoutContext,
        fcx: &mut FontContext,
        params: &LayoutParams<'_>,
        text: &str,
        attributes: &AttributeSet<'_>,
    ) -> Self {
        build_layout(lcx, fcx, params, &[ContentRun::utf8(text, *attributes)])
    }

    /// Build a layout of UTF-32 `text` with `attributes`.
    pub fn build_utf32(
        lcx: &mut LayoutContext,
        fcx: &mut FontContext,
        params: &LayoutParams<'_>,
        text: &[char],
        attributes: &AttributeSet<'_>,
    ) -> Self {
        build_layout(lcx, fcx, params, &[ContentRun::utf32(text, *attributes)])
    }

    /// Build a layout of rich text.
    ///
    /// Every span boundary starts a new content run whose attributes are the spans active
    /// over it, in application order, inheriting from `attributes`.
    pub fn build_rich_text(
        lcx: &mut LayoutContext,
        fcx: &mut FontContext,
        params: &LayoutParams<'_>,
        text: &RichText<Attribute>,
        attributes: &AttributeSet<'_>,
    ) -> Self {
        let mut segments: Vec<(Range<usize>, Vec<Attribute>)> = Vec::new();
        {
            let mut iter = lcx.segments.segments(text);
            while let Some(range) = iter.next() {
                let items = iter.active_spans().map(|s| s.attribute.clone()).collect();
                segments.push((range, items));
            }
        }
        let sets: Vec<AttributeSet<'_>> = segments
            .iter()
            .map(|(_, items)| AttributeSet::with_parent(items, attributes))
            .collect();
        let runs: Vec<ContentRun<'_>> = segments
            .iter()
            .zip(&sets)
            .enumerate()
            .map(|(ix, ((range, _), set))| {
                ContentRun::utf32(&text.text()[range.clone()], *set).with_id(ix as u64)
            })
            .collect();
        build_layout(lcx, fcx, params, &runs)
    }
}

fn grapheme_end(props: &[TextProperty], start: usize) -> usize {
    let mut end = start;
    while end < props.len() && !props[end].is_grapheme_break() {
        end += 1;
    }
    (end + 1).min(props.len())
}

fn grapheme_start(props: &[TextProperty], offset: usize) -> usize {
    let mut start = offset.min(props.len());
    while start > 0 && !props[start - 1].is_grapheme_break() {
        start -= 1;
    }
    start
}

fn build_layout(
    lcx: &mut LayoutContext,
    fcx: &mut FontContext,
    params: &LayoutParams<'_>,
    runs: &[ContentRun<'_>],
) -> Layout {
    let collection = params.attribute_collection;
    let LayoutContext {
        scratch, analyzer, ..
    } = lcx;
    let mut scope = scratch.scope();
    let s = &mut *scope;

    let paragraph = ParagraphStyle::resolve(&params.layout_attributes, collection);
    let default_style = RunStyle::resolve(&params.layout_attributes, collection);

    // Text assembly.
    let mut text: Vec<char> = Vec::new();
    let mut styles: Vec<RunStyle> = Vec::with_capacity(runs.len());
    for run in runs {
        let start = text.len();
        let kind = match run.content {
            Content::Utf8(str) => {
                text.extend(str.chars());
                SlotKind::Text { utf8: true }
            }
            Content::Utf32(chars) => {
                text.extend_from_slice(chars);
                SlotKind::Text { utf8: false }
            }
            Content::Icon(icon) => {
                text.push(OBJECT_REPLACEMENT);
                SlotKind::Icon(icon)
            }
            Content::Object { width, height } => {
                text.push(OBJECT_REPLACEMENT);
                SlotKind::Object { width, height }
            }
        };
        // Layout attributes sit below the whole chain of the run.
        let mut flat = params.layout_attributes.copy_flat();
        flat.extend(run.attributes.copy_flat());
        styles.push(RunStyle::resolve(&AttributeSet::new(&flat), collection));
        s.slots.push(ContentSlot {
            range: start..text.len(),
            kind,
            id: run.id,
        });
    }

    // Property analysis and bidi.
    let mut props = Vec::with_capacity(text.len());
    let is_rtl = analyzer.analyze(
        &text,
        paragraph.direction,
        params.ignore_must_line_breaks,
        &mut props,
    );
    log::trace!("analyzed {} codepoints, rtl: {is_rtl}", text.len());

    // Itemization and font selection.
    for slot_ix in 0..s.slots.len() {
        let slot = s.slots[slot_ix].clone();
        if slot.range.is_empty() {
            continue;
        }
        match slot.kind {
            SlotKind::Icon(_) | SlotKind::Object { .. } => {
                let p = props[slot.range.start];
                s.items.push(Item {
                    range: slot.range.clone(),
                    slot: slot_ix,
                    script: Some(p.script),
                    level: p.level,
                    size: styles[slot_ix].font_size,
                    ..Item::default()
                });
            }
            SlotKind::Text { .. } => {
                let mut i = slot.range.start;
                while i < slot.range.end {
                    let end = grapheme_end(&props, i).min(slot.range.end);
                    let p = props[i];
                    let ch = text[i];
                    let reuse = match s.items.last() {
                        Some(last) if last.slot == slot_ix && last.range.end == i => {
                            ch.is_control() || (p.is_whitespace() && !p.is_emoji())
                        }
                        _ => false,
                    };
                    let font = if reuse {
                        s.items.last().and_then(|last| last.font)
                    } else {
                        let style = &styles[slot_ix];
                        select_font(fcx, s, style, slot_ix, Some(p.script), p.is_emoji(), ch)
                    };
                    let extend = match s.items.last() {
                        Some(last) => {
                            last.slot == slot_ix
                                && last.range.end == i
                                && last.level == p.level
                                && last.font == font
                                && (reuse || last.script == Some(p.script))
                        }
                        None => false,
                    };
                    if extend {
                        if let Some(last) = s.items.last_mut() {
                            last.range.end = end;
                        }
                    } else {
                        s.items.push(Item {
                            range: i..end,
                            slot: slot_ix,
                            script: Some(p.script),
                            level: p.level,
                            font,
                            size: styles[slot_ix].shaping_size(),
                            ..Item::default()
                        });
                    }
                    i = end;
                }
            }
        }
    }

    // Shaping and logical clusters.
    for item_ix in 0..s.items.len() {
        shape_item(fcx, s, &text, &props, &styles, item_ix);
    }
    log::trace!(
        "shaped {} items into {} glyphs",
        s.items.len(),
        s.glyphs.len()
    );

    // Line breaking.
    let layout_width = params.layout_width.max(0.0);
    let layout_height = params.layout_height.max(0.0);
    let wrap_width = if paragraph.wrap != TextWrap::None && layout_width > 0.0 {
        (layout_width - paragraph.indent).max(0.0)
    } else {
        f32::INFINITY
    };
    break_lines(s, &styles, paragraph.wrap, wrap_width);

    // Vertical metrics.
    let mut empty_metrics = None;
    for line_ix in 0..s.lines.len() {
        let range = s.lines[line_ix].clusters.clone();
        let mut ascender: f32 = 0.0;
        let mut descender: f32 = 0.0;
        let mut any = false;
        let mut last_item = usize::MAX;
        for ci in range {
            let item = s.clusters[ci].item;
            if item == last_item {
                continue;
            }
            last_item = item;
            ascender = ascender.max(s.items[item].ascender);
            descender = descender.max(s.items[item].descender);
            any = true;
        }
        if !any {
            let (a, d) = *empty_metrics
                .get_or_insert_with(|| default_line_metrics(fcx, s, &default_style));
            ascender = a;
            descender = d;
        }
        let line = &mut s.lines[line_ix];
        line.ascender = ascender;
        line.descender = descender;
    }

    // Overflow.
    let mut visible_lines = s.lines.len();
    if layout_height > 0.0
        && matches!(paragraph.overflow, TextOverflow::Clip | TextOverflow::Ellipsis)
    {
        let mut y = 0.0;
        let mut count = 0;
        for line in &s.lines {
            y += line.ascender + line.descender;
            if y > layout_height + 0.001 && count > 0 {
                break;
            }
            count += 1;
        }
        visible_lines = count;
    }
    let mut ellipsis_width = 0.0;
    if paragraph.overflow == TextOverflow::Ellipsis {
        let truncated_by_height = visible_lines < s.lines.len();
        s.lines.truncate(visible_lines);
        if let Some(last) = s.lines.len().checked_sub(1) {
            let fit_width = if layout_width > 0.0 {
                (layout_width - paragraph.indent).max(0.0)
            } else {
                f32::INFINITY
            };
            let overflows = content_width(s, &s.lines[last].clusters) > fit_width + 0.001;
            if truncated_by_height || overflows {
                ellipsis_width = add_ellipsis(fcx, s, &styles, last, fit_width);
            }
        }
    }

    // Vertical positions and alignment.
    let mut y = 0.0;
    for line in &mut s.lines {
        line.baseline = y + line.ascender;
        y += line.ascender + line.descender;
    }
    let visible_bottom = s
        .lines
        .get(visible_lines.min(s.lines.len()).saturating_sub(1))
        .map(|l| l.baseline + l.descender)
        .unwrap_or(0.0);
    let (trim_top, trim_bottom) = match paragraph.vertical_trim {
        VerticalTrim::Default => (0.0, visible_bottom),
        VerticalTrim::CapToBaseline => {
            let first = s.lines.first();
            let cap = first
                .and_then(|line| {
                    s.clusters
                        .get(line.clusters.start)
                        .map(|c| &s.items[c.item])
                })
                .map(|item| {
                    let metrics = item
                        .font
                        .map(|f| fcx.collection.metrics(f))
                        .unwrap_or_default();
                    metrics.cap_height * item.size
                })
                .unwrap_or(0.0);
            let top = first.map(|l| l.baseline - cap).unwrap_or(0.0);
            let bottom = s
                .lines
                .get(visible_lines.min(s.lines.len()).saturating_sub(1))
                .map(|l| l.baseline)
                .unwrap_or(0.0);
            (top, bottom)
        }
    };
    let shift = if layout_height > 0.0 {
        match paragraph.vertical_align {
            VerticalAlign::Top => -trim_top,
            VerticalAlign::Center => (layout_height - (trim_bottom - trim_top)) * 0.5 - trim_top,
            VerticalAlign::Bottom => layout_height - trim_bottom,
        }
    } else {
        -trim_top
    };
    for line in &mut s.lines {
        line.baseline += shift;
    }

    // Horizontal positions, bidi reordering and output.
    let max_width = (0..s.lines.len())
        .map(|ix| {
            let mut w = content_width(s, &s.lines[ix].clusters);
            if s.lines[ix].truncated {
                w += ellipsis_width;
            }
            w
        })
        .fold(0.0_f32, f32::max);
    let area_width = if layout_width > 0.0 {
        (layout_width - paragraph.indent).max(0.0)
    } else {
        max_width
    };
    let align = match (paragraph.horizontal_align, is_rtl) {
        (HorizontalAlign::Start, false) | (HorizontalAlign::End, true) => HorizontalAlign::Left,
        (HorizontalAlign::Start, true) | (HorizontalAlign::End, false) => HorizontalAlign::Right,
        (other, _) => other,
    };
    let area_left = if is_rtl { 0.0 } else { paragraph.indent };

    let mut out = Output::default();
    for line_ix in 0..s.lines.len() {
        let line = s.lines[line_ix].clone();
        let trailing = trailing_start(s, &line.clusters);
        let mut width = advance_sum(s, line.clusters.start..trailing);
        let hang = advance_sum(s, trailing..line.clusters.end);
        if line.truncated {
            width += ellipsis_width;
        }
        let left = area_left
            + match align {
                HorizontalAlign::Right => area_width - width,
                HorizontalAlign::Center => (area_width - width) * 0.5,
                _ => 0.0,
            };
        let mut pen = if is_rtl { left - hang } else { left };

        // L1: trailing whitespace takes the paragraph level.
        let base_level = u8::from(is_rtl);
        s.line_items.clear();
        for ci in line.clusters.clone() {
            let item = s.clusters[ci].item;
            let level = if ci >= trailing {
                base_level
            } else {
                s.items[item].level
            };
            match s.line_items.last_mut() {
                Some(last) if last.item == item && last.level == level => {
                    last.clusters.end = ci + 1;
                }
                _ => s.line_items.push(LineItem {
                    item,
                    clusters: ci..ci + 1,
                    level,
                }),
            }
        }
        reorder_line_items(&mut s.line_items);

        let run_start = out.runs.len();
        let glyph_start = out.glyphs.len();
        let cluster_start = out.clusters.len();
        let line_idx = line_ix as u32;
        let line_end = line
            .clusters
            .end
            .checked_sub(1)
            .and_then(|ix| s.clusters.get(ix))
            .map(|c| c.text_range.end)
            .unwrap_or(0);
        if line.truncated && is_rtl {
            pen = out.emit_special(s, RunRole::Ellipsis, pen, line.baseline, line_idx, line_end);
        }
        for li in 0..s.line_items.len() {
            let line_item = s.line_items[li].clone();
            pen = out.emit_run(s, &styles, &line_item, pen, line.baseline, line_idx);
        }
        if line.truncated && !is_rtl {
            out.emit_special(s, RunRole::Ellipsis, pen, line.baseline, line_idx, line_end);
        }
        if line_ix == 0 {
            if let Some(marker) = paragraph.list_marker {
                let marker_width = shape_marker(
                    fcx,
                    s,
                    &styles,
                    &default_style,
                    marker.style,
                    params.list_marker_counter,
                );
                if marker_width > 0.0 {
                    let x = if is_rtl {
                        area_left + area_width + marker.spacing
                    } else {
                        paragraph.indent - marker.spacing - marker_width
                    };
                    let start = s
                        .clusters
                        .get(line.clusters.start)
                        .map(|c| c.text_range.start)
                        .unwrap_or(0);
                    out.emit_special(s, RunRole::ListMarker, x, line.baseline, line_idx, start);
                }
            }
        }

        let text_range = match (
            s.clusters.get(line.clusters.start),
            line.clusters.end.checked_sub(1).and_then(|ix| s.clusters.get(ix)),
        ) {
            (Some(first), Some(last)) if !line.clusters.is_empty() => {
                first.text_range.start..last.text_range.end
            }
            _ => {
                let at = s
                    .clusters
                    .get(line.clusters.start)
                    .map(|c| c.text_range.start)
                    .unwrap_or(text.len());
                at..at
            }
        };
        let mut last_grapheme_offset = text_range.start;
        for ci in line.clusters.clone().rev() {
            let c = &s.clusters[ci];
            if !c.must_break && !c.zero_advance {
                last_grapheme_offset = c.text_range.start;
                break;
            }
        }
        let top = line.baseline - line.ascender;
        let bounds = Rect::new(
            to_f64(left),
            to_f64(top),
            to_f64(left + width),
            to_f64(line.baseline + line.descender),
        );
        out.lines.push(Line {
            text_range,
            glyph_range: glyph_start..out.glyphs.len(),
            run_range: run_start..out.runs.len(),
            cluster_range: cluster_start..out.clusters.len(),
            ascender: line.ascender,
            descender: line.descender,
            baseline: line.baseline,
            bounds,
            culling_bounds: bounds,
            last_grapheme_offset,
            is_truncated: line.truncated,
        });
        out.decorate_line(fcx, &styles, line_ix);
        out.cull_line(fcx, line_ix);
    }

    let visible_lines = visible_lines.min(out.lines.len()).max(1);
    let bounds = out.lines[..visible_lines.min(out.lines.len())]
        .iter()
        .map(|l| l.bounds)
        .reduce(|a, b| a.union(b))
        .unwrap_or_default();
    let contents = s
        .slots
        .iter()
        .map(|slot| ContentRange {
            text_range: slot.range.clone(),
            content_type: content_type(slot.kind),
            id: slot.id,
        })
        .collect();
    log::trace!(
        "laid out {} lines, {} runs, {} glyphs",
        out.lines.len(),
        out.runs.len(),
        out.glyphs.len()
    );

    Layout {
        text,
        properties: props,
        contents,
        styles,
        glyphs: out.glyphs,
        clusters: out.clusters,
        runs: out.runs,
        lines: out.lines,
        decorations: out.decorations,
        paragraph,
        is_rtl,
        layout_width,
        layout_height,
        visible_lines,
        bounds,
    }
}

fn content_type(kind: SlotKind) -> ContentRunType {
    match kind {
        SlotKind::Text { utf8: true } => ContentRunType::Utf8,
        SlotKind::Text { utf8: false } => ContentRunType::Utf32,
        SlotKind::Icon(_) => ContentRunType::Icon,
        SlotKind::Object { .. } => ContentRunType::Object,
    }
}

fn select_font(
    fcx: &mut FontContext,
    s: &mut Scratch,
    style: &RunStyle,
    slot: usize,
    script: Option<Script>,
    emoji: bool,
    ch: char,
) -> Option<FontHandle> {
    for attempt in 0..2 {
        let cached = s
            .font_cache
            .iter()
            .find(|e| e.slot == slot && e.script == script && e.emoji == emoji)
            .map(|e| e.fonts.clone());
        let fonts = match cached {
            Some(fonts) => fonts,
            None => {
                let start = s.fonts.len();
                let script_value = script.unwrap_or(Script::Common);
                if emoji {
                    let query = FontQuery {
                        family: &FontFamily::Emoji,
                        weight: style.weight,
                        style: style.style,
                        stretch: style.stretch,
                        script: script_value,
                        lang: style.lang.as_deref(),
                    };
                    fcx.collection.match_fonts(&query, &mut s.fonts);
                }
                let query = FontQuery {
                    family: &style.family,
                    weight: style.weight,
                    style: style.style,
                    stretch: style.stretch,
                    script: script_value,
                    lang: style.lang.as_deref(),
                };
                fcx.collection.match_fonts(&query, &mut s.fonts);
                let fonts = start..s.fonts.len();
                s.font_cache.push(FontCacheEntry {
                    slot,
                    script,
                    emoji,
                    fonts: fonts.clone(),
                });
                fonts
            }
        };
        if let Some(&font) = s.fonts[fonts]
            .iter()
            .find(|&&font| fcx.collection.covers(font, ch))
        {
            return Some(font);
        }
        if attempt > 0 {
            break;
        }
        let key = (script, style.family.clone());
        if s.fallback_tried.contains(&key) {
            break;
        }
        s.fallback_tried.push(key);
        let request = FallbackRequest {
            script: script.unwrap_or(Script::Common),
            family: &style.family,
            lang: style.lang.as_deref(),
        };
        if !fcx.run_fallback(&request) {
            break;
        }
        log::debug!("font fallback loaded fonts for {:?}", request.script);
        s.font_cache.clear();
        s.fonts.clear();
    }
    if !s.missing_warned.contains(&script) {
        s.missing_warned.push(script);
        log::warn!(
            "no font covers U+{:04X} (script {script:?}, family {:?})",
            u32::from(ch),
            style.family
        );
    }
    None
}

fn item_metrics(fcx: &FontContext, font: Option<FontHandle>) -> FontMetrics {
    font.map(|f| fcx.collection.metrics(f)).unwrap_or_default()
}

fn text_line_metrics(metrics: &FontMetrics, style: &RunStyle, size: f32) -> (f32, f32) {
    let ascender = metrics.ascender * size;
    let descender = metrics.descender * size;
    let gap = metrics.line_gap * size;
    let content = ascender + descender;
    let line_height = match style.line_height {
        LineHeight::Normal => content + gap,
        LineHeight::Relative(factor) => factor * style.font_size,
        LineHeight::MetricsRelative(factor) => (content + gap) * factor,
        LineHeight::Absolute(height) => height,
    };
    let half_leading = (line_height - content) * 0.5;
    (ascender + half_leading, descender + half_leading)
}

fn default_line_metrics(fcx: &FontContext, s: &mut Scratch, style: &RunStyle) -> (f32, f32) {
    let start = s.fonts.len();
    let query = FontQuery {
        family: &style.family,
        weight: style.weight,
        style: style.style,
        stretch: style.stretch,
        script: Script::Latin,
        lang: style.lang.as_deref(),
    };
    fcx.collection.match_fonts(&query, &mut s.fonts);
    let font = s.fonts.get(start).copied();
    s.fonts.truncate(start);
    let metrics = item_metrics(fcx, font);
    text_line_metrics(&metrics, style, style.font_size)
}

fn shape_item(
    fcx: &mut FontContext,
    s: &mut Scratch,
    text: &[char],
    props: &[TextProperty],
    styles: &[RunStyle],
    item_ix: usize,
) {
    let item = s.items[item_ix].clone();
    let style = &styles[item.slot];
    let kind = s.slots[item.slot].kind;
    let glyph_start = s.glyphs.len();
    let rtl = item.is_rtl();

    let (ascender, descender, glyph_y) = match kind {
        SlotKind::Text { .. } => {
            let size = item.size;
            if let Some(font) = item.font {
                s.shaped.clear();
                let request = ShapeRequest {
                    text: &text[item.range.clone()],
                    font,
                    size,
                    direction: if rtl {
                        TextDirection::Rtl
                    } else {
                        TextDirection::Ltr
                    },
                    script: item.script.unwrap_or(Script::Common),
                    lang: style.lang.as_deref(),
                    features: &style.features,
                };
                fcx.shaper
                    .shape(fcx.collection.as_ref(), &request, &mut s.shaped);
                let len = u32::try_from(item.range.len()).unwrap_or(u32::MAX);
                s.glyphs.extend(s.shaped.iter().map(|g| ShapedGlyph {
                    cluster: g.cluster.min(len.saturating_sub(1)),
                    ..*g
                }));
            } else {
                let mut i = item.range.start;
                let first = s.glyphs.len();
                while i < item.range.end {
                    let end = grapheme_end(props, i).min(item.range.end);
                    s.glyphs.push(ShapedGlyph {
                        gid: 0,
                        cluster: u32::try_from(i - item.range.start).unwrap_or(0),
                        advance_x: size * PLACEHOLDER_ADVANCE,
                        offset_x: 0.0,
                        offset_y: 0.0,
                    });
                    i = end;
                }
                if rtl {
                    s.glyphs[first..].reverse();
                }
            }
            let metrics = item_metrics(fcx, item.font);
            let (a, d) = text_line_metrics(&metrics, style, size);
            let offset = style.baseline_offset();
            (a - offset, (d + offset).max(0.0), offset)
        }
        SlotKind::Icon(_) | SlotKind::Object { .. } => {
            let (width, height) = match kind {
                SlotKind::Icon(icon) => {
                    let intrinsic = fcx.icons.as_ref().and_then(|icons| icons.icon_size(icon));
                    match intrinsic {
                        Some((w, h)) if h > 0.0 => (w * style.font_size / h, style.font_size),
                        _ => {
                            log::warn!("missing icon {icon:?}");
                            (0.0, 0.0)
                        }
                    }
                }
                SlotKind::Object { width, height } => (width, height),
                SlotKind::Text { .. } => (0.0, 0.0),
            };
            let pad = style.object_padding;
            s.glyphs.push(ShapedGlyph {
                gid: 0,
                cluster: 0,
                advance_x: width + 2.0 * pad.horizontal,
                offset_x: pad.horizontal,
                offset_y: 0.0,
            });
            let metrics = item_metrics(fcx, None);
            let text_ascender = metrics.ascender * style.font_size;
            let text_descender = metrics.descender * style.font_size;
            let box_height = height + 2.0 * pad.vertical;
            let (a, d) = match style.object_align {
                ObjectAlign::Baseline => (box_height, 0.0),
                ObjectAlign::Center => {
                    let a = (box_height + text_ascender) * 0.5;
                    (a, box_height - a)
                }
                ObjectAlign::Top => (text_ascender, box_height - text_ascender),
                ObjectAlign::Bottom => (box_height - text_descender, text_descender),
            };
            (a, d.max(0.0), d - pad.vertical)
        }
    };
    {
        let item = &mut s.items[item_ix];
        item.ascender = ascender;
        item.descender = descender;
        item.glyph_y = glyph_y;
    }

    // Group glyphs by the grapheme their cluster starts in.
    s.groups.clear();
    for gi in glyph_start..s.glyphs.len() {
        let offset = item.range.start + s.glyphs[gi].cluster as usize;
        let gs = grapheme_start(props, offset).max(item.range.start);
        match s.groups.last_mut() {
            Some((start, glyphs)) if *start == gs => glyphs.end = gi + 1,
            _ => s.groups.push((gs, gi..gi + 1)),
        }
    }
    if rtl {
        s.groups.reverse();
    }
    if s.groups.is_empty() {
        s.groups.push((item.range.start, glyph_start..glyph_start));
    }
    let count = s.groups.len();
    for k in 0..count {
        let start = if k == 0 {
            item.range.start
        } else {
            s.groups[k].0
        };
        let end = if k + 1 < count {
            s.groups[k + 1].0
        } else {
            item.range.end
        };
        if end <= start {
            // Out of order clusters from the shaper: fold into the previous cluster.
            if let Some(prev) = s.clusters.last_mut() {
                let glyphs = s.groups[k].1.clone();
                prev.glyphs = prev.glyphs.start.min(glyphs.start)..prev.glyphs.end.max(glyphs.end);
            }
            continue;
        }
        let glyphs = s.groups[k].1.clone();
        let first = text[start];
        let p = props[start];
        let last = props[end - 1];
        let zero_advance = (first.is_control() && first != '\t')
            || first == '\u{2028}'
            || first == '\u{2029}';
        let tab = first == '\t';
        let whitespace = p.is_whitespace();
        let mut extra = 0.0;
        if !zero_advance && !tab {
            extra += style.letter_spacing;
            if whitespace {
                extra += style.word_spacing;
            }
        }
        let advance = if zero_advance {
            0.0
        } else {
            s.glyphs[glyphs.clone()]
                .iter()
                .map(|g| g.advance_x)
                .sum::<f32>()
                + extra
        };
        s.clusters.push(LogicalCluster {
            text_range: start..end,
            item: item_ix,
            glyphs,
            advance,
            extra,
            break_after: last.is_line_break(),
            must_break: last.is_must_line_break(),
            whitespace: whitespace || zero_advance,
            tab,
            zero_advance,
        });
    }
}

fn tab_advance(x: f32, stop: f32) -> f32 {
    if stop <= 0.0 {
        return 0.0;
    }
    let next = ((x / stop).floor() + 1.0) * stop;
    next - x
}

fn break_lines(s: &mut Scratch, styles: &[RunStyle], wrap: TextWrap, width: f32) {
    let n = s.clusters.len();
    let mut line_start = 0;
    let mut x = 0.0;
    let mut last_break: Option<usize> = None;
    let mut i = 0;
    while i < n {
        if s.clusters[i].tab {
            let stop = styles[s.items[s.clusters[i].item].slot].tab_stop();
            s.clusters[i].advance = tab_advance(x, stop);
        }
        let cluster = &s.clusters[i];
        if !cluster.whitespace && x + cluster.advance > width + 0.001 && i > line_start {
            if let Some(b) = last_break.filter(|&b| b > line_start) {
                s.lines.push(LineSpan {
                    clusters: line_start..b,
                    ..LineSpan::default()
                });
                line_start = b;
                i = b;
                x = 0.0;
                last_break = None;
                continue;
            }
            if wrap == TextWrap::WordChar {
                s.lines.push(LineSpan {
                    clusters: line_start..i,
                    ..LineSpan::default()
                });
                line_start = i;
                x = 0.0;
                last_break = None;
                continue;
            }
        }
        x += cluster.advance;
        let must_break = cluster.must_break;
        let break_after = cluster.break_after;
        i += 1;
        if must_break {
            s.lines.push(LineSpan {
                clusters: line_start..i,
                ..LineSpan::default()
            });
            line_start = i;
            x = 0.0;
            last_break = None;
        } else if break_after {
            last_break = Some(i);
        }
    }
    if line_start < n || s.lines.is_empty() {
        s.lines.push(LineSpan {
            clusters: line_start..n,
            ..LineSpan::default()
        });
    }
}

fn trailing_start(s: &Scratch, clusters: &Range<usize>) -> usize {
    let mut t = clusters.end;
    while t > clusters.start && s.clusters[t - 1].whitespace {
        t -= 1;
    }
    t
}

fn advance_sum(s: &Scratch, clusters: Range<usize>) -> f32 {
    s.clusters[clusters].iter().map(|c| c.advance).sum()
}

fn content_width(s: &Scratch, clusters: &Range<usize>) -> f32 {
    advance_sum(s, clusters.start..trailing_start(s, clusters))
}

/// Shape the ellipsis for line `line_ix`, trimming clusters until it fits.
fn add_ellipsis(
    fcx: &mut FontContext,
    s: &mut Scratch,
    styles: &[RunStyle],
    line_ix: usize,
    fit_width: f32,
) -> f32 {
    let range = s.lines[line_ix].clusters.clone();
    let item_ix = range
        .end
        .checked_sub(1)
        .filter(|&ix| ix >= range.start)
        .or_else(|| s.clusters.len().checked_sub(1))
        .map(|ci| s.clusters[ci].item);
    let Some(item_ix) = item_ix else {
        return 0.0;
    };
    let item = s.items[item_ix].clone();
    let style = &styles[item.slot];
    s.ellipsis.clear();
    let chars = [ELLIPSIS];
    match item.font {
        Some(font) if fcx.collection.covers(font, ELLIPSIS) => {
            let request = ShapeRequest {
                text: &chars,
                font,
                size: item.size,
                direction: if item.is_rtl() {
                    TextDirection::Rtl
                } else {
                    TextDirection::Ltr
                },
                script: item.script.unwrap_or(Script::Common),
                lang: style.lang.as_deref(),
                features: &style.features,
            };
            fcx.shaper
                .shape(fcx.collection.as_ref(), &request, &mut s.ellipsis);
        }
        _ => s.ellipsis.push(ShapedGlyph {
            gid: 0,
            cluster: 0,
            advance_x: item.size * PLACEHOLDER_ADVANCE,
            offset_x: 0.0,
            offset_y: 0.0,
        }),
    }
    s.ellipsis_item = item_ix;
    let width: f32 = s.ellipsis.iter().map(|g| g.advance_x).sum();
    s.lines[line_ix].truncated = true;
    let start = s.lines[line_ix].clusters.start;
    let mut end = s.lines[line_ix].clusters.end;
    loop {
        end = trailing_start(s, &(start..end));
        if end <= start || advance_sum(s, start..end) + width <= fit_width {
            break;
        }
        end -= 1;
    }
    s.lines[line_ix].clusters.end = end;
    width
}

fn shape_marker(
    fcx: &mut FontContext,
    s: &mut Scratch,
    styles: &[RunStyle],
    default_style: &RunStyle,
    style: ListMarkerStyle,
    counter: u32,
) -> f32 {
    s.marker_text.clear();
    match style {
        ListMarkerStyle::None => return 0.0,
        ListMarkerStyle::Codepoint(ch) => s.marker_text.push(ch),
        ListMarkerStyle::CounterDecimal => {
            let _ = write!(s.marker_text, "{counter}.");
        }
        ListMarkerStyle::CounterLowerLatin | ListMarkerStyle::CounterUpperLatin => {
            let base = if style == ListMarkerStyle::CounterLowerLatin {
                b'a'
            } else {
                b'A'
            };
            let mut n = counter.max(1);
            let mut letters = Vec::new();
            while n > 0 {
                n -= 1;
                letters.push(char::from(base + (n % 26) as u8));
                n /= 26;
            }
            s.marker_text.extend(letters.iter().rev());
            s.marker_text.push('.');
        }
    }
    s.marker_chars.clear();
    s.marker_chars.extend(s.marker_text.chars());
    // Markers take the style of the first run.
    let run_style = styles.first().unwrap_or(default_style);
    let first = s.marker_chars.first().copied().unwrap_or(' ');
    let font = select_font(fcx, s, run_style, usize::MAX, None, false, first);
    s.marker.clear();
    match font {
        Some(font) => {
            let request = ShapeRequest {
                text: &s.marker_chars,
                font,
                size: run_style.font_size,
                direction: TextDirection::Ltr,
                script: Script::Common,
                lang: run_style.lang.as_deref(),
                features: &run_style.features,
            };
            fcx.shaper
                .shape(fcx.collection.as_ref(), &request, &mut s.marker);
        }
        None => {
            for _ in 0..s.marker_chars.len() {
                s.marker.push(ShapedGlyph {
                    advance_x: run_style.font_size * PLACEHOLDER_ADVANCE,
                    ..ShapedGlyph::default()
                });
            }
        }
    }
    s.marker_font = font;
    s.marker_size = run_style.font_size;
    s.marker.iter().map(|g| g.advance_x).sum()
}

/// Reorder items within a line according to their bidi levels (rule L2).
fn reorder_line_items(items: &mut [LineItem]) {
    let mut max_level = 0;
    let mut lowest_odd_level = u8::MAX;
    for item in items.iter() {
        max_level = max_level.max(item.level);
        if item.level & 1 != 0 {
            lowest_odd_level = lowest_odd_level.min(item.level);
        }
    }
    if lowest_odd_level == u8::MAX {
        return;
    }
    for level in (lowest_odd_level..=max_level).rev() {
        let mut i = 0;
        while i < items.len() {
            if items[i].level < level {
                i += 1;
                continue;
            }
            let mut end = i + 1;
            while end < items.len() && items[end].level >= level {
                end += 1;
            }
            items[i..end].reverse();
            i = end;
        }
    }
}

#[derive(Debug, Default)]
struct Output {
    glyphs: Vec<Glyph>,
    clusters: Vec<Cluster>,
    runs: Vec<LayoutRun>,
    lines: Vec<Line>,
    decorations: Vec<LayoutDecoration>,
}

impl Output {
    fn emit_run(
        &mut self,
        s: &Scratch,
        styles: &[RunStyle],
        line_item: &LineItem,
        mut pen: f32,
        baseline: f32,
        line_idx: u32,
    ) -> f32 {
        let item = &s.items[line_item.item];
        let slot = &s.slots[item.slot];
        let rtl = line_item.level & 1 != 0;
        let run_idx = self.runs.len() as u32;
        let run_x = pen;
        let glyph_start = self.glyphs.len();
        let cluster_start = self.clusters.len();
        let mut text_start = usize::MAX;
        let mut text_end = 0;
        let span_idx = item.slot as u32;
        let mut emit_cluster = |out: &mut Self, ci: usize, pen: &mut f32| {
            let c = &s.clusters[ci];
            text_start = text_start.min(c.text_range.start);
            text_end = text_end.max(c.text_range.end);
            let cluster_x = *pen;
            let cluster_glyphs = out.glyphs.len();
            let cluster_idx = out.clusters.len() as u32;
            let count = c.glyphs.len();
            for (k, gi) in c.glyphs.clone().enumerate() {
                let g = s.glyphs[gi];
                let advance = if c.zero_advance {
                    0.0
                } else if c.tab {
                    if k == 0 { c.advance } else { 0.0 }
                } else if k + 1 == count {
                    g.advance_x + c.extra
                } else {
                    g.advance_x
                };
                out.glyphs.push(Glyph {
                    offset_x: *pen + g.offset_x,
                    offset_y: baseline + item.glyph_y + g.offset_y,
                    advance_x: advance,
                    gid: g.gid,
                    font: item.font,
                    cluster_idx,
                    span_idx,
                });
                *pen += advance;
            }
            if count == 0 {
                *pen += c.advance;
            }
            out.clusters.push(Cluster {
                text_range: c.text_range.clone(),
                glyph_range: cluster_glyphs..out.glyphs.len(),
                x: cluster_x,
                advance: *pen - cluster_x,
                run_idx,
            });
        };
        if rtl {
            for ci in line_item.clusters.clone().rev() {
                emit_cluster(self, ci, &mut pen);
            }
        } else {
            for ci in line_item.clusters.clone() {
                emit_cluster(self, ci, &mut pen);
            }
        }
        let icon = match slot.kind {
            SlotKind::Icon(icon) => Some(icon),
            _ => None,
        };
        self.runs.push(LayoutRun {
            content_type: content_type(slot.kind),
            role: RunRole::Content,
            text_range: text_start.min(text_end)..text_end,
            glyph_range: glyph_start..self.glyphs.len(),
            cluster_range: cluster_start..self.clusters.len(),
            font: item.font,
            font_size: styles[item.slot].shaping_size(),
            script: item.script.unwrap_or(Script::Common),
            level: line_item.level,
            style_idx: span_idx,
            content_id: slot.id,
            icon,
            x: run_x,
            advance: pen - run_x,
            line_idx,
        });
        pen
    }

    /// Emit an ellipsis or list marker run at `pen`.
    fn emit_special(
        &mut self,
        s: &Scratch,
        role: RunRole,
        mut pen: f32,
        baseline: f32,
        line_idx: u32,
        at: usize,
    ) -> f32 {
        let (glyphs, font, size, item) = match role {
            RunRole::ListMarker => (&s.marker, s.marker_font, s.marker_size, None),
            _ => {
                let item = s.items.get(s.ellipsis_item);
                let size = item.map(|i| i.size).unwrap_or(0.0);
                (&s.ellipsis, item.and_then(|i| i.font), size, item)
            }
        };
        let span_idx = item.map(|i| i.slot as u32).unwrap_or(0);
        let run_idx = self.runs.len() as u32;
        let run_x = pen;
        let glyph_start = self.glyphs.len();
        let cluster_idx = self.clusters.len() as u32;
        for g in glyphs {
            self.glyphs.push(Glyph {
                offset_x: pen + g.offset_x,
                offset_y: baseline + g.offset_y,
                advance_x: g.advance_x,
                gid: g.gid,
                font,
                cluster_idx,
                span_idx,
            });
            pen += g.advance_x;
        }
        self.clusters.push(Cluster {
            text_range: at..at,
            glyph_range: glyph_start..self.glyphs.len(),
            x: run_x,
            advance: pen - run_x,
            run_idx,
        });
        self.runs.push(LayoutRun {
            content_type: ContentRunType::Utf32,
            role,
            text_range: at..at,
            glyph_range: glyph_start..self.glyphs.len(),
            cluster_range: cluster_idx as usize..self.clusters.len(),
            font,
            font_size: size,
            script: item.and_then(|i| i.script).unwrap_or(Script::Common),
            level: item.map(|i| i.level).unwrap_or(0),
            style_idx: span_idx,
            content_id: 0,
            icon: None,
            x: run_x,
            advance: pen - run_x,
            line_idx,
        });
        pen
    }

    fn decorate_line(&mut self, fcx: &FontContext, styles: &[RunStyle], line_ix: usize) {
        let line = &self.lines[line_ix];
        let first_decoration = self.decorations.len();
        let line_idx = line_ix as u32;
        for run in &self.runs[line.run_range.clone()] {
            if run.role == RunRole::ListMarker {
                continue;
            }
            let Some(style) = styles.get(run.style_idx as usize) else {
                continue;
            };
            let metrics = run.font.map(|f| fcx.collection.metrics(f)).unwrap_or_default();
            let size = run.font_size;
            for decoration in &style.decorations {
                let thickness = if decoration.thickness > 0.0 {
                    decoration.thickness
                } else {
                    match decoration.position {
                        DecorationPosition::Throughline => metrics.strikeout_size * size,
                        _ => metrics.underline_size * size,
                    }
                    .max(1.0)
                };
                let y = match decoration.position {
                    DecorationPosition::Underline => {
                        line.baseline + metrics.underline_offset * size
                    }
                    DecorationPosition::Bottomline => {
                        line.baseline + line.descender - thickness * 0.5
                    }
                    DecorationPosition::Overline => {
                        line.baseline - line.ascender + thickness * 0.5
                    }
                    DecorationPosition::Throughline => {
                        line.baseline - metrics.strikeout_offset * size
                    }
                } + decoration.offset;
                let color = decoration.color.unwrap_or(style.fill);
                let merged = self.decorations[first_decoration..]
                    .iter_mut()
                    .find(|d| {
                        d.position == decoration.position
                            && d.style == decoration.style
                            && d.color == color
                            && nearly_eq(d.x + d.length, run.x)
                            && nearly_eq(d.y, y)
                            && nearly_eq(d.thickness, thickness)
                    });
                match merged {
                    Some(d) => d.length += run.advance,
                    None => self.decorations.push(LayoutDecoration {
                        x: run.x,
                        y,
                        length: run.advance,
                        thickness,
                        pattern_offset: run.x - line.bounds.x0 as f32,
                        position: decoration.position,
                        style: decoration.style,
                        color,
                        span_idx: run.style_idx,
                        line_idx,
                    }),
                }
            }
        }
    }

    fn cull_line(&mut self, fcx: &FontContext, line_ix: usize) {
        let line = &self.lines[line_ix];
        let mut bounds = line.bounds;
        for glyph in &self.glyphs[line.glyph_range.clone()] {
            let ink = match glyph.font {
                Some(font) => {
                    let size = self
                        .clusters
                        .get(glyph.cluster_idx as usize)
                        .and_then(|c| self.runs.get(c.run_idx as usize))
                        .map(|r| r.font_size)
                        .unwrap_or(0.0);
                    let ink = fcx.collection.glyph_bounds(font, glyph.gid, size);
                    let (x, y) = (to_f64(glyph.offset_x), to_f64(glyph.offset_y));
                    Rect::new(ink.x0 + x, ink.y0 + y, ink.x1 + x, ink.y1 + y)
                }
                None => Rect::new(
                    to_f64(glyph.offset_x),
                    line.bounds.y0,
                    to_f64(glyph.offset_x + glyph.advance_x),
                    line.bounds.y1,
                ),
            };
            if ink.width() > 0.0 || ink.height() > 0.0 {
                bounds = bounds.union(ink);
            }
        }
        for d in self
            .decorations
            .iter()
            .filter(|d| d.line_idx as usize == line_ix)
        {
            let half = to_f64(d.thickness * 0.5);
            bounds = bounds.union(Rect::new(
                to_f64(d.x),
                to_f64(d.y) - half,
                to_f64(d.x + d.length),
                to_f64(d.y) + half,
            ));
        }
        self.lines[line_ix].culling_bounds = bounds;
    }
}
