// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit testing, caret geometry and cursor navigation.

use alloc::vec::Vec;
use core::ops::Range;

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;
use peniko::kurbo::Rect;

use super::{Cluster, Layout, Line, RunRole};
use crate::util::to_f64;

/// Which edge of a grapheme a position refers to.
///
/// The same insertion offset can be shown at two places where the text direction
/// changes or a line wraps; the affinity picks one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Affinity {
    /// No preference, treated as [`Affinity::Leading`].
    #[default]
    None,
    /// The trailing edge of the grapheme at `offset`, insertion happens after it.
    Trailing,
    /// The leading edge of the grapheme at `offset`, insertion happens before it.
    Leading,
    /// The start of the line that begins at `offset`.
    StartOfLine,
    /// The end of the line whose last grapheme starts at `offset`.
    EndOfLine,
}

/// A caret position: a codepoint offset and the grapheme edge it refers to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextPosition {
    /// Codepoint offset of a grapheme start.
    pub offset: usize,
    /// Edge of the grapheme.
    pub affinity: Affinity,
}

impl TextPosition {
    /// Create a position.
    pub const fn new(offset: usize, affinity: Affinity) -> Self {
        Self { offset, affinity }
    }

    /// The leading edge of the grapheme at `offset`.
    pub const fn leading(offset: usize) -> Self {
        Self::new(offset, Affinity::Leading)
    }

    /// The trailing edge of the grapheme at `offset`.
    pub const fn trailing(offset: usize) -> Self {
        Self::new(offset, Affinity::Trailing)
    }

    /// Returns `true` if text is inserted after the grapheme at `offset`.
    pub fn is_after(&self) -> bool {
        matches!(self.affinity, Affinity::Trailing | Affinity::EndOfLine)
    }
}

/// How hit testing resolves a point between two graphemes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MovementType {
    /// Positions suitable for a caret: trailing edges are moved to the leading edge of
    /// the next grapheme when both are shown at the same place.
    #[default]
    Caret,
    /// Positions suitable for extending a selection, edges are kept as hit.
    Selection,
}

/// A visual caret stop on a line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CaretStep {
    /// X position of the stop.
    pub x: f32,
    /// Position referring to the grapheme left of the stop.
    pub left: TextPosition,
    /// The grapheme left of the stop is right to left.
    pub left_is_rtl: bool,
    /// Position referring to the grapheme right of the stop.
    pub right: TextPosition,
    /// The grapheme right of the stop is right to left.
    pub right_is_rtl: bool,
}

/// Geometry of a caret.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VisualCaret {
    /// X position.
    pub x: f32,
    /// Y position of the top.
    pub y: f32,
    /// Height.
    pub height: f32,
    /// Line the caret is on.
    pub line_idx: usize,
    /// Direction of the grapheme the caret is attached to.
    pub is_rtl: bool,
}

impl Layout {
    fn grapheme_start_at(&self, offset: usize) -> usize {
        let mut start = offset.min(self.text.len());
        while start > 0 && !self.properties[start - 1].is_grapheme_break() {
            start -= 1;
        }
        start
    }

    /// Start of the grapheme after the one containing `offset`.
    pub fn next_grapheme_offset(&self, offset: usize) -> usize {
        let len = self.text.len();
        let mut end = offset;
        while end < len && !self.properties[end].is_grapheme_break() {
            end += 1;
        }
        (end + 1).min(len)
    }

    /// Start of the grapheme before `offset`.
    pub fn prev_grapheme_offset(&self, offset: usize) -> usize {
        match offset.min(self.text.len()) {
            0 => 0,
            offset => self.grapheme_start_at(offset - 1),
        }
    }

    /// Snap `offset` to the start of the grapheme containing it.
    pub fn align_grapheme_offset(&self, offset: usize) -> usize {
        if offset >= self.text.len() {
            return self.text.len();
        }
        self.grapheme_start_at(offset)
    }

    /// Start of the word segment containing `offset`.
    pub fn word_start_at(&self, offset: usize) -> usize {
        let mut start = offset.min(self.text.len());
        while start > 0 && !self.properties[start - 1].is_word_break() {
            start -= 1;
        }
        start
    }

    /// End of the word segment containing `offset`.
    pub fn word_end_at(&self, offset: usize) -> usize {
        let len = self.text.len();
        let mut end = offset;
        while end < len && !self.properties[end].is_word_break() {
            end += 1;
        }
        (end + 1).min(len)
    }

    /// Start of the next word after `offset`, skipping whitespace.
    pub fn next_word_offset(&self, offset: usize) -> usize {
        let len = self.text.len();
        if offset >= len {
            return len;
        }
        let mut offset = self.word_end_at(offset);
        while offset < len && self.properties[offset].is_whitespace() {
            offset = self.word_end_at(offset);
        }
        offset
    }

    /// Start of the word before `offset`, skipping whitespace.
    pub fn prev_word_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        if offset == 0 {
            return 0;
        }
        let mut start = self.word_start_at(offset - 1);
        while start > 0 && self.properties[start].is_whitespace() {
            start = self.word_start_at(start - 1);
        }
        start
    }

    /// Index of the line containing `offset`.
    pub fn line_index_at(&self, offset: usize) -> usize {
        self.line_index_for_offset(offset)
    }

    /// Index of the line at `y`, clamped to the first and last line.
    pub fn line_index_at_y(&self, y: f32) -> usize {
        self.lines
            .iter()
            .position(|line| y < line.bottom())
            .unwrap_or(self.lines.len().saturating_sub(1))
    }

    /// Position at the start of the line containing `offset`.
    pub fn line_start_at(&self, offset: usize) -> TextPosition {
        let start = self
            .lines
            .get(self.line_index_at(offset))
            .map(|line| line.text_range.start)
            .unwrap_or(0);
        TextPosition::new(start, Affinity::StartOfLine)
    }

    /// Position at the end of the line containing `offset`, before any line break.
    pub fn line_end_at(&self, offset: usize) -> TextPosition {
        let line_ix = self.line_index_at(offset);
        let Some(line) = self.lines.get(line_ix) else {
            return TextPosition::leading(0);
        };
        let end = line.text_range.end;
        if end > line.text_range.start && self.properties[end - 1].is_must_line_break() {
            TextPosition::leading(self.grapheme_start_at(end - 1))
        } else if line_ix + 1 == self.lines.len() || line.text_range.is_empty() {
            TextPosition::leading(end)
        } else {
            TextPosition::new(line.last_grapheme_offset, Affinity::EndOfLine)
        }
    }

    /// Offset where text is inserted for `pos`.
    pub fn insert_offset(&self, pos: TextPosition) -> usize {
        if pos.is_after() {
            self.next_grapheme_offset(pos.offset)
        } else {
            pos.offset.min(self.text.len())
        }
    }

    fn is_line_break_cluster(&self, cluster: &Cluster) -> bool {
        cluster.text_range.end > cluster.text_range.start
            && self.properties[cluster.text_range.end - 1].is_must_line_break()
    }

    fn cluster_is_rtl(&self, cluster: &Cluster) -> bool {
        self.runs
            .get(cluster.run_idx as usize)
            .is_some_and(|run| run.is_rtl())
    }

    /// Visual clusters of a line that carry content and can hold the caret.
    fn caret_clusters(&self, line: &Line) -> impl Iterator<Item = &Cluster> + '_ {
        self.clusters[line.cluster_range.clone()]
            .iter()
            .filter(move |cluster| {
                self.runs
                    .get(cluster.run_idx as usize)
                    .is_some_and(|run| run.role == RunRole::Content)
                    && !cluster.text_range.is_empty()
                    && !self.is_line_break_cluster(cluster)
            })
    }

    /// Grapheme starts inside `cluster`, in logical order.
    fn cluster_graphemes(&self, cluster: &Cluster, out: &mut Vec<usize>) {
        out.clear();
        let mut offset = cluster.text_range.start;
        while offset < cluster.text_range.end {
            out.push(offset);
            offset = self.next_grapheme_offset(offset);
        }
    }

    /// X of the edge of grapheme `index` of `count` inside `cluster`.
    fn cluster_edge(&self, cluster: &Cluster, index: usize, count: usize, trailing: bool) -> f32 {
        let count = count.max(1);
        let step = if trailing { index + 1 } else { index };
        let fraction = step.min(count) as f32 / count as f32;
        if self.cluster_is_rtl(cluster) {
            cluster.x + cluster.advance * (1.0 - fraction)
        } else {
            cluster.x + cluster.advance * fraction
        }
    }

    /// Visual caret stops of line `line_idx`, left to right.
    ///
    /// Line break characters have no stops of their own.
    pub fn caret_iterator(&self, line_idx: usize) -> impl Iterator<Item = CaretStep> + '_ {
        let mut steps = Vec::new();
        if let Some(line) = self.lines.get(line_idx) {
            let mut graphemes = Vec::new();
            // Right edge of the previous grapheme, the left side of the next stop.
            let mut prev: Option<(TextPosition, bool)> = None;
            let mut end_x = 0.0;
            for cluster in self.caret_clusters(line) {
                let rtl = self.cluster_is_rtl(cluster);
                self.cluster_graphemes(cluster, &mut graphemes);
                let count = graphemes.len();
                for k in 0..count {
                    let index = if rtl { count - 1 - k } else { k };
                    let offset = graphemes[index];
                    let (left_edge, right_edge) = if rtl {
                        (TextPosition::trailing(offset), TextPosition::leading(offset))
                    } else {
                        (TextPosition::leading(offset), TextPosition::trailing(offset))
                    };
                    let (left, left_is_rtl) = prev.unwrap_or((left_edge, rtl));
                    steps.push(CaretStep {
                        x: self.cluster_edge(cluster, index, count, rtl),
                        left,
                        left_is_rtl,
                        right: left_edge,
                        right_is_rtl: rtl,
                    });
                    prev = Some((right_edge, rtl));
                    end_x = self.cluster_edge(cluster, index, count, !rtl);
                }
            }
            if let Some((right_edge, rtl)) = prev {
                steps.push(CaretStep {
                    x: end_x,
                    left: right_edge,
                    left_is_rtl: rtl,
                    right: right_edge,
                    right_is_rtl: rtl,
                });
            }
        }
        steps.into_iter()
    }

    /// Resolve a point to a text position.
    pub fn hit_test(&self, movement: MovementType, x: f32, y: f32) -> TextPosition {
        self.hit_test_at_line(movement, self.line_index_at_y(y), x)
    }

    /// Resolve a horizontal position on line `line_idx` to a text position.
    pub fn hit_test_at_line(
        &self,
        movement: MovementType,
        line_idx: usize,
        x: f32,
    ) -> TextPosition {
        let Some(line) = self.lines.get(line_idx) else {
            return TextPosition::leading(self.text.len());
        };
        let steps: Vec<CaretStep> = self.caret_iterator(line_idx).collect();
        if steps.is_empty() {
            return TextPosition::leading(line.text_range.start);
        }
        // Nearest stop; between two stops the one on the hit side wins.
        let mut best = 0;
        for (ix, step) in steps.iter().enumerate() {
            if (step.x - x).abs() < (steps[best].x - x).abs() {
                best = ix;
            }
        }
        let step = steps[best];
        let pos = if best == 0 {
            step.right
        } else if best + 1 == steps.len() {
            step.left
        } else if x < step.x {
            step.left
        } else {
            step.right
        };
        match movement {
            MovementType::Caret => self.canonical_caret(pos, line_idx),
            MovementType::Selection => pos,
        }
    }

    /// Move a trailing position to the leading edge of the next grapheme when both are
    /// shown at the same place.
    fn canonical_caret(&self, pos: TextPosition, line_idx: usize) -> TextPosition {
        if pos.affinity != Affinity::Trailing {
            return pos;
        }
        let next = self.next_grapheme_offset(pos.offset);
        let Some(line) = self.lines.get(line_idx) else {
            return pos;
        };
        if next >= line.text_range.end || next >= self.text.len() {
            if next >= self.text.len() {
                return TextPosition::leading(self.text.len());
            }
            return pos;
        }
        if self.properties[pos.offset].is_rtl() == self.properties[next].is_rtl() {
            TextPosition::leading(next)
        } else {
            pos
        }
    }

    /// Line a position is shown on.
    fn caret_line(&self, pos: TextPosition) -> usize {
        let len = self.text.len();
        if pos.offset >= len {
            return self.lines.len().saturating_sub(1);
        }
        self.line_index_for_offset(pos.offset)
    }

    /// Caret geometry of `pos`.
    pub fn caret_info(&self, pos: TextPosition) -> VisualCaret {
        let len = self.text.len();
        let (offset, trailing) = if pos.offset >= len {
            match len {
                0 => (0, false),
                _ => (self.grapheme_start_at(len - 1), true),
            }
        } else {
            (self.grapheme_start_at(pos.offset), pos.is_after())
        };
        let line_idx = if pos.offset >= len {
            self.lines.len().saturating_sub(1)
        } else {
            self.caret_line(TextPosition::new(offset, pos.affinity))
        };
        let Some(line) = self.lines.get(line_idx) else {
            return VisualCaret::default();
        };
        let mut caret = VisualCaret {
            x: if self.is_rtl {
                line.bounds.x1 as f32
            } else {
                line.bounds.x0 as f32
            },
            y: line.top(),
            height: line.height(),
            line_idx,
            is_rtl: self.is_rtl,
        };
        if len == 0 {
            return caret;
        }
        let mut graphemes = Vec::new();
        for cluster in &self.clusters[line.cluster_range.clone()] {
            if !cluster.text_range.contains(&offset) {
                continue;
            }
            let is_content = self
                .runs
                .get(cluster.run_idx as usize)
                .is_some_and(|run| run.role == RunRole::Content);
            if !is_content {
                continue;
            }
            self.cluster_graphemes(cluster, &mut graphemes);
            let index = graphemes.iter().position(|&g| g == offset).unwrap_or(0);
            caret.x = self.cluster_edge(cluster, index, graphemes.len(), trailing);
            caret.is_rtl = self.cluster_is_rtl(cluster);
            break;
        }
        caret
    }

    /// Move `pos` one caret stop visually to the left.
    pub fn move_position_left(&self, pos: TextPosition) -> TextPosition {
        self.move_position(pos, false)
    }

    /// Move `pos` one caret stop visually to the right.
    pub fn move_position_right(&self, pos: TextPosition) -> TextPosition {
        self.move_position(pos, true)
    }

    fn move_position(&self, pos: TextPosition, right: bool) -> TextPosition {
        let caret = self.caret_info(pos);
        let line_idx = caret.line_idx;
        let steps: Vec<CaretStep> = self.caret_iterator(line_idx).collect();
        if steps.is_empty() {
            return self.move_across_line(pos, line_idx, right);
        }
        let mut current = 0;
        for (ix, step) in steps.iter().enumerate() {
            if (step.x - caret.x).abs() < (steps[current].x - caret.x).abs() {
                current = ix;
            }
        }
        if right {
            if current + 1 < steps.len() {
                let next = steps[current + 1].left;
                return self.canonical_caret(next, line_idx);
            }
        } else if current > 0 {
            let next = steps[current - 1].right;
            return self.canonical_caret(next, line_idx);
        }
        self.move_across_line(pos, line_idx, right)
    }

    fn move_across_line(&self, pos: TextPosition, line_idx: usize, right: bool) -> TextPosition {
        // Moving towards the end of the paragraph goes to the next line.
        let forward = right != self.is_rtl;
        let target = if forward {
            line_idx + 1
        } else {
            match line_idx.checked_sub(1) {
                Some(ix) => ix,
                None => return pos,
            }
        };
        let Some(line) = self.lines.get(target) else {
            return pos;
        };
        let steps: Vec<CaretStep> = self.caret_iterator(target).collect();
        let step = if right { steps.first() } else { steps.last() };
        match step {
            Some(step) if right => self.canonical_caret(step.right, target),
            Some(step) => self.canonical_caret(step.left, target),
            None => TextPosition::leading(line.text_range.start),
        }
    }

    /// Call `f` with the rectangles covering `range`, one per contiguous visual span.
    pub fn selection_bounds(&self, range: Range<usize>, mut f: impl FnMut(Rect)) {
        if range.is_empty() {
            return;
        }
        let mut graphemes = Vec::new();
        for line in &self.lines {
            if line.text_range.end <= range.start || line.text_range.start >= range.end {
                continue;
            }
            let mut span: Option<(f32, f32)> = None;
            let top = to_f64(line.top());
            let bottom = to_f64(line.bottom());
            for cluster in self.caret_clusters(line) {
                self.cluster_graphemes(cluster, &mut graphemes);
                let count = graphemes.len();
                let selected: Vec<usize> = (0..count)
                    .filter(|&ix| range.contains(&graphemes[ix]))
                    .collect();
                let (Some(&first), Some(&last)) = (selected.first(), selected.last()) else {
                    if let Some((x0, x1)) = span.take() {
                        f(Rect::new(to_f64(x0), top, to_f64(x1), bottom));
                    }
                    continue;
                };
                let a = self.cluster_edge(cluster, first, count, false);
                let b = self.cluster_edge(cluster, last, count, true);
                let (x0, x1) = (a.min(b), a.max(b));
                span = match span {
                    Some((s0, s1)) if (s1 - x0).abs() < 0.01 => Some((s0, x1)),
                    Some((s0, s1)) => {
                        f(Rect::new(to_f64(s0), top, to_f64(s1), bottom));
                        Some((x0, x1))
                    }
                    None => Some((x0, x1)),
                };
            }
            if let Some((x0, x1)) = span {
                f(Rect::new(to_f64(x0), top, to_f64(x1), bottom));
            }
        }
    }
}
