// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font services consumed by the layout engine.
//!
//! Parsing font files, matching and shaping live outside this crate. The layout engine
//! talks to them through the [`FontCollection`], [`FontFallback`], [`IconCollection`] and
//! [`Shaper`] traits, all owned by a [`FontContext`].

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use icu_properties::props::Script;
use peniko::kurbo::Rect;

use crate::attribute::{FontFamily, FontStretch, FontStyle, FontWeight, TextDirection};
use crate::shape::Shaper;

/// Identifies a font within a [`FontCollection`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontHandle(pub u32);

/// Identifies an icon within an [`IconCollection`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IconHandle(pub u32);

/// Font metrics in em units.
///
/// Coordinates are y-down: `ascender` and `descender` are both positive distances
/// from the baseline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the tallest glyphs.
    pub ascender: f32,
    /// Distance from the baseline to the bottom of the lowest glyphs.
    pub descender: f32,
    /// Recommended additional space between lines.
    pub line_gap: f32,
    /// Height of lowercase letters.
    pub x_height: f32,
    /// Height of capital letters.
    pub cap_height: f32,
    /// Distance of the underline below the baseline.
    pub underline_offset: f32,
    /// Thickness of the underline.
    pub underline_size: f32,
    /// Distance of the strike-through above the baseline.
    pub strikeout_offset: f32,
    /// Thickness of the strike-through.
    pub strikeout_size: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            ascender: 0.8,
            descender: 0.2,
            line_gap: 0.0,
            x_height: 0.5,
            cap_height: 0.7,
            underline_offset: 0.1,
            underline_size: 0.05,
            strikeout_offset: 0.3,
            strikeout_size: 0.05,
        }
    }
}

/// Baseline positions relative to the alphabetic baseline, in layout units, y-down.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BaselineSet {
    /// The alphabetic baseline, always `0.0`.
    pub alphabetic: f32,
    /// Ideographic bottom baseline.
    pub ideographic: f32,
    /// Hanging baseline used by Indic scripts.
    pub hanging: f32,
    /// Center of the em box.
    pub central: f32,
    /// Middle of lowercase letters.
    pub middle: f32,
}

impl BaselineSet {
    /// Derive a baseline set from font metrics.
    pub fn from_metrics(metrics: &FontMetrics, size: f32) -> Self {
        Self {
            alphabetic: 0.0,
            ideographic: metrics.descender * size,
            hanging: -metrics.ascender * 0.8 * size,
            central: (metrics.descender - metrics.ascender) * 0.5 * size,
            middle: -metrics.x_height * 0.5 * size,
        }
    }
}

/// Font selection query.
#[derive(Copy, Clone, Debug)]
pub struct FontQuery<'a> {
    /// Requested family.
    pub family: &'a FontFamily,
    /// Requested weight.
    pub weight: FontWeight,
    /// Requested style.
    pub style: FontStyle,
    /// Requested stretch.
    pub stretch: FontStretch,
    /// Script of the text being set.
    pub script: Script,
    /// Language of the text being set.
    pub lang: Option<&'a str>,
}

/// A set of fonts the layout engine can select from.
pub trait FontCollection {
    /// Append fonts matching `query` to `out`, best match first.
    fn match_fonts(&self, query: &FontQuery<'_>, out: &mut Vec<FontHandle>);

    /// Returns `true` if `font` has a glyph for `ch`.
    fn covers(&self, font: FontHandle, ch: char) -> bool;

    /// Metrics of `font` in em units.
    fn metrics(&self, font: FontHandle) -> FontMetrics;

    /// Ink bounds of glyph `gid` at `size`, relative to the glyph origin, y-down.
    fn glyph_bounds(&self, font: FontHandle, gid: u32, size: f32) -> Rect;

    /// Baselines of `font` for the given direction and script.
    fn baseline_set(
        &self,
        font: FontHandle,
        direction: TextDirection,
        script: Script,
        size: f32,
    ) -> BaselineSet {
        let _ = (direction, script);
        BaselineSet::from_metrics(&self.metrics(font), size)
    }

    /// Register font data under `family`. Collections that cannot load fonts return `None`.
    fn add_font(&mut self, data: Arc<[u8]>, family: FontFamily) -> Option<FontHandle> {
        let _ = (data, family);
        None
    }
}

/// What the layout engine was looking for when no font covered some text.
#[derive(Copy, Clone, Debug)]
pub struct FallbackRequest<'a> {
    /// Script of the uncovered text.
    pub script: Script,
    /// Requested family.
    pub family: &'a FontFamily,
    /// Language of the uncovered text.
    pub lang: Option<&'a str>,
}

/// Strategy invoked when no font covers a piece of text.
pub trait FontFallback {
    /// Try to make fonts available for `request`.
    ///
    /// Returning `true` tells the layout engine that `fonts` changed and matching should
    /// be retried, once.
    fn on_font_fallback(
        &mut self,
        fonts: &mut dyn FontCollection,
        request: &FallbackRequest<'_>,
    ) -> bool;
}

/// Resolves icons used in icon content runs.
pub trait IconCollection {
    /// Intrinsic width and height of `icon`.
    fn icon_size(&self, icon: IconHandle) -> Option<(f32, f32)>;
}

/// Font services shared by layouts and editors.
pub struct FontContext {
    /// Fonts to select from.
    pub collection: Box<dyn FontCollection>,
    /// Shaping backend.
    pub shaper: Box<dyn Shaper>,
    /// Optional fallback strategy.
    pub fallback: Option<Box<dyn FontFallback>>,
    /// Optional icon collection.
    pub icons: Option<Box<dyn IconCollection>>,
}

impl FontContext {
    /// Create a font context from a collection and a shaper.
    pub fn new(collection: Box<dyn FontCollection>, shaper: Box<dyn Shaper>) -> Self {
        Self {
            collection,
            shaper,
            fallback: None,
            icons: None,
        }
    }

    /// Set the fallback strategy.
    pub fn with_fallback(mut self, fallback: Box<dyn FontFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Set the icon collection.
    pub fn with_icons(mut self, icons: Box<dyn IconCollection>) -> Self {
        self.icons = Some(icons);
        self
    }

    /// Run the fallback strategy for `request`, returning `true` if matching should be retried.
    pub(crate) fn run_fallback(&mut self, request: &FallbackRequest<'_>) -> bool {
        match self.fallback.as_mut() {
            Some(fallback) => fallback.on_font_fallback(self.collection.as_mut(), request),
            None => false,
        }
    }
}

impl fmt::Debug for FontContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontContext")
            .field("fallback", &self.fallback.is_some())
            .field("icons", &self.icons.is_some())
            .finish_non_exhaustive()
    }
}
