// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interface to the shaping backend.

use alloc::vec::Vec;

use icu_properties::props::Script;

use crate::attribute::{FontFeature, TextDirection};
use crate::font::{FontCollection, FontHandle};

/// One run of text to shape with a single font.
#[derive(Copy, Clone, Debug)]
pub struct ShapeRequest<'a> {
    /// Codepoints of the run.
    pub text: &'a [char],
    /// Font to shape with.
    pub font: FontHandle,
    /// Font size in layout units.
    pub size: f32,
    /// Direction of the run, never [`TextDirection::Auto`].
    pub direction: TextDirection,
    /// Script of the run.
    pub script: Script,
    /// Language of the run.
    pub lang: Option<&'a str>,
    /// Feature settings, later entries override earlier ones.
    pub features: &'a [FontFeature],
}

/// A glyph produced by the shaping backend.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph id in the font.
    pub gid: u32,
    /// Index into [`ShapeRequest::text`] of the first codepoint this glyph belongs to.
    pub cluster: u32,
    /// Horizontal advance in layout units.
    pub advance_x: f32,
    /// Horizontal offset from the pen position.
    pub offset_x: f32,
    /// Vertical offset from the baseline, y-down.
    pub offset_y: f32,
}

/// A shaping backend.
pub trait Shaper {
    /// Shape `request`, appending glyphs to `out` in visual order.
    ///
    /// For right-to-left runs the glyph of the last cluster comes first.
    fn shape(
        &mut self,
        fonts: &dyn FontCollection,
        request: &ShapeRequest<'_>,
        out: &mut Vec<ShapedGlyph>,
    );
}
