// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute-based segmentation for [`RichText`].
//!
//! Given a [`RichText`] with overlapping attribute spans, this module produces
//! non-overlapping, contiguous segments and provides a view of spans active over each segment.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::Range;

use crate::{AttributeSpan, RichText};

/// Reusable allocation workspace for attribute segmentation.
///
/// Reusing a workspace amortizes setup allocations when processing many pieces of text.
#[derive(Clone, Debug, Default)]
pub struct SegmentsWorkspace {
    boundaries: Vec<usize>,
    active: Vec<usize>,
}

impl SegmentsWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an iterator using this workspace's retained allocations.
    pub fn segments<'w, 'a, A: Clone + Debug>(
        &'w mut self,
        text: &'a RichText<A>,
    ) -> Segments<'w, 'a, A> {
        self.boundaries.clear();
        self.active.clear();
        if !text.is_empty() {
            self.boundaries.push(0);
            self.boundaries.push(text.len());
            for span in text.spans() {
                if span.range.start < span.range.end {
                    self.boundaries.push(span.range.start.min(text.len()));
                    self.boundaries.push(span.range.end.min(text.len()));
                }
            }
            self.boundaries.sort_unstable();
            self.boundaries.dedup();
        }
        Segments {
            text,
            workspace: self,
            index: 0,
        }
    }
}

/// Iterator over contiguous attribute segments produced from a [`RichText`].
///
/// Each yielded item is a non-empty, non-overlapping codepoint range. The spans active
/// over the yielded range are exposed through [`Segments::active_spans`], in
/// application order, so the last matching span is the one that wins.
#[derive(Debug)]
pub struct Segments<'w, 'a, A> {
    text: &'a RichText<A>,
    workspace: &'w mut SegmentsWorkspace,
    index: usize,
}

impl<'a, A: Clone + Debug> Segments<'_, 'a, A> {
    /// Returns the spans active for the most recently yielded segment.
    pub fn active_spans(&self) -> impl DoubleEndedIterator<Item = &'a AttributeSpan<A>> + '_ {
        let spans = self.text.spans();
        self.workspace.active.iter().map(move |&ix| &spans[ix])
    }
}

impl<A: Clone + Debug> Iterator for Segments<'_, '_, A> {
    type Item = Range<usize>;

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .workspace
            .boundaries
            .len()
            .saturating_sub(self.index + 1);
        (remaining, Some(remaining))
    }

    fn next(&mut self) -> Option<Self::Item> {
        self.workspace.active.clear();
        if self.index + 1 >= self.workspace.boundaries.len() {
            return None;
        }
        let start = self.workspace.boundaries[self.index];
        let end = self.workspace.boundaries[self.index + 1];
        self.index += 1;
        debug_assert!(start < end, "boundaries are sorted + deduped");
        for (ix, span) in self.text.spans().iter().enumerate() {
            if span.range.start <= start && span.range.end >= end {
                self.workspace.active.push(ix);
            }
        }
        Some(start..end)
    }
}

impl<A: Clone + Debug> ExactSizeIterator for Segments<'_, '_, A> {}
