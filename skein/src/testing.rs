// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic font backend for tests and examples.
//!
//! Every glyph id is its codepoint, every visible glyph advances half an em, and all
//! fonts share the same metrics: ascender 0.8 em, descender 0.2 em, no line gap.
//! Layout geometry is therefore easy to predict: at font size 20 the string `"abc"`
//! is 30 units wide and one line is 20 units tall.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use peniko::kurbo::Rect;

use crate::attribute::{FontFamily, TextDirection};
use crate::font::{
    FallbackRequest, FontCollection, FontContext, FontFallback, FontHandle, FontMetrics,
    FontQuery, IconCollection, IconHandle,
};
use crate::shape::{ShapeRequest, ShapedGlyph, Shaper};
use crate::util::to_f64;

/// Advance of visible glyphs in em units.
pub const ADVANCE: f32 = 0.5;

#[derive(Clone, Debug)]
struct TestFont {
    family: FontFamily,
    /// The default font leaves Hebrew uncovered so fallback can be exercised.
    skips_hebrew: bool,
}

/// A font collection with a default font and an emoji font.
#[derive(Clone, Debug)]
pub struct TestFonts {
    fonts: Vec<TestFont>,
}

impl Default for TestFonts {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFonts {
    /// The default font (handle 0) and the emoji font (handle 1).
    pub fn new() -> Self {
        Self {
            fonts: vec![
                TestFont {
                    family: FontFamily::Default,
                    skips_hebrew: true,
                },
                TestFont {
                    family: FontFamily::Emoji,
                    skips_hebrew: false,
                },
            ],
        }
    }

    /// Number of fonts in the collection.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Returns `true` if the collection has no fonts.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn is_hebrew(ch: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&ch)
}

/// Codepoints the test shaper gives no advance.
pub fn is_zero_width(ch: char) -> bool {
    matches!(ch,
        '\u{0300}'..='\u{036F}'
        | '\u{200B}'..='\u{200F}'
        | '\u{FE00}'..='\u{FE0F}'
        | '\u{1F3FB}'..='\u{1F3FF}'
        | '\u{E0020}'..='\u{E007F}'
        | '\u{20E3}')
        || ch.is_control()
}

impl FontCollection for TestFonts {
    fn match_fonts(&self, query: &FontQuery<'_>, out: &mut Vec<FontHandle>) {
        let start = out.len();
        for (ix, font) in self.fonts.iter().enumerate() {
            if &font.family == query.family {
                out.push(FontHandle(ix as u32));
            }
        }
        // Unknown families resolve to the default font.
        if out.len() == start {
            for (ix, font) in self.fonts.iter().enumerate() {
                if font.family == FontFamily::Default {
                    out.push(FontHandle(ix as u32));
                }
            }
        }
    }

    fn covers(&self, font: FontHandle, ch: char) -> bool {
        match self.fonts.get(font.0 as usize) {
            Some(font) => !(font.skips_hebrew && is_hebrew(ch)),
            None => false,
        }
    }

    fn metrics(&self, _font: FontHandle) -> FontMetrics {
        FontMetrics {
            ascender: 0.8,
            descender: 0.2,
            line_gap: 0.0,
            ..FontMetrics::default()
        }
    }

    fn glyph_bounds(&self, _font: FontHandle, gid: u32, size: f32) -> Rect {
        match char::from_u32(gid) {
            Some(ch) if ch.is_whitespace() || is_zero_width(ch) => Rect::ZERO,
            _ => Rect::new(
                0.0,
                to_f64(-0.7 * size),
                to_f64(ADVANCE * size),
                to_f64(0.1 * size),
            ),
        }
    }

    fn add_font(&mut self, _data: Arc<[u8]>, family: FontFamily) -> Option<FontHandle> {
        self.fonts.push(TestFont {
            family,
            skips_hebrew: false,
        });
        Some(FontHandle((self.fonts.len() - 1) as u32))
    }
}

/// Shapes one glyph per codepoint.
#[derive(Copy, Clone, Debug, Default)]
pub struct TestShaper;

impl Shaper for TestShaper {
    fn shape(
        &mut self,
        _fonts: &dyn FontCollection,
        request: &ShapeRequest<'_>,
        out: &mut Vec<ShapedGlyph>,
    ) {
        let start = out.len();
        for (ix, &ch) in request.text.iter().enumerate() {
            let advance = if is_zero_width(ch) {
                0.0
            } else {
                ADVANCE * request.size
            };
            out.push(ShapedGlyph {
                gid: u32::from(ch),
                cluster: ix as u32,
                advance_x: advance,
                offset_x: 0.0,
                offset_y: 0.0,
            });
        }
        if request.direction == TextDirection::Rtl {
            out[start..].reverse();
        }
    }
}

/// Loads a font covering everything whenever fallback is requested.
#[derive(Clone, Debug, Default)]
pub struct AddFontFallback {
    /// Number of times the fallback ran.
    pub calls: usize,
}

impl FontFallback for AddFontFallback {
    fn on_font_fallback(
        &mut self,
        fonts: &mut dyn FontCollection,
        request: &FallbackRequest<'_>,
    ) -> bool {
        self.calls += 1;
        fonts
            .add_font(Arc::from(Vec::new()), request.family.clone())
            .is_some()
    }
}

/// Icons with fixed intrinsic sizes, indexed by handle.
#[derive(Clone, Debug, Default)]
pub struct TestIcons {
    /// Width and height of each icon.
    pub sizes: Vec<(f32, f32)>,
}

impl IconCollection for TestIcons {
    fn icon_size(&self, icon: IconHandle) -> Option<(f32, f32)> {
        self.sizes.get(icon.0 as usize).copied()
    }
}

/// A font context over [`TestFonts`] and [`TestShaper`].
pub fn font_context() -> FontContext {
    FontContext::new(Box::new(TestFonts::new()), Box::new(TestShaper))
}
