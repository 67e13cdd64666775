// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context for layout.

use core::ops::{Deref, DerefMut};

use rich_text::SegmentsWorkspace;

use crate::analysis::Analyzer;
use crate::layout::Scratch;

/// Reusable state for building layouts.
///
/// Holds the Unicode segmenters and the scratch buffers of the build pipeline. Buffers
/// grow as needed and keep their capacity between builds. A context is used by one
/// thread at a time; create one per thread for parallel layout.
#[derive(Debug, Default)]
pub struct LayoutContext {
    pub(crate) scratch: Scratch,
    pub(crate) analyzer: Analyzer,
    pub(crate) segments: SegmentsWorkspace,
}

impl LayoutContext {
    /// Create a new layout context.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scoped access to the scratch buffers, cleared when dropped.
pub(crate) struct ScratchScope<'a> {
    scratch: &'a mut Scratch,
}

impl Scratch {
    pub(crate) fn scope(&mut self) -> ScratchScope<'_> {
        ScratchScope { scratch: self }
    }
}

impl Deref for ScratchScope<'_> {
    type Target = Scratch;

    fn deref(&self) -> &Scratch {
        self.scratch
    }
}

impl DerefMut for ScratchScope<'_> {
    fn deref_mut(&mut self) -> &mut Scratch {
        self.scratch
    }
}

impl Drop for ScratchScope<'_> {
    fn drop(&mut self) {
        self.scratch.reset();
    }
}

