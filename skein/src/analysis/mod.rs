// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-codepoint text analysis: scripts, bidi levels and break opportunities.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use icu_properties::props::{EmojiPresentation, ExtendedPictographic, RegionalIndicator, Script};
use icu_properties::{
    CodePointMapData, CodePointMapDataBorrowed, CodePointSetData, CodePointSetDataBorrowed,
};
use icu_segmenter::options::{LineBreakOptions, WordBreakInvariantOptions};
use icu_segmenter::{
    GraphemeClusterSegmenter, GraphemeClusterSegmenterBorrowed, LineSegmenter,
    LineSegmenterBorrowed, WordSegmenter, WordSegmenterBorrowed,
};
use unicode_bidi::{BidiInfo, Level};

use crate::attribute::TextDirection;

pub(crate) type BidiLevel = u8;

/// Analysis result for one codepoint.
///
/// Break flags describe the boundary *after* the codepoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextProperty {
    /// Script, with Common and Inherited resolved from the surrounding text.
    pub script: Script,
    /// Resolved bidi embedding level (even = LTR, odd = RTL).
    pub level: BidiLevel,
    flags: u16,
}

impl TextProperty {
    const GRAPHEME_BREAK: u16 = 1 << 0;
    const WORD_BREAK: u16 = 1 << 1;
    const LINE_BREAK: u16 = 1 << 2;
    const MUST_LINE_BREAK: u16 = 1 << 3;
    const EMOJI: u16 = 1 << 4;
    const WHITESPACE: u16 = 1 << 5;
    const PARAGRAPH_SEPARATOR: u16 = 1 << 6;
    const CONTROL: u16 = 1 << 7;

    fn new(script: Script) -> Self {
        Self {
            script,
            level: 0,
            flags: 0,
        }
    }

    fn set(&mut self, flag: u16) {
        self.flags |= flag;
    }

    fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    /// A grapheme cluster ends after this codepoint.
    pub fn is_grapheme_break(&self) -> bool {
        self.has(Self::GRAPHEME_BREAK)
    }

    /// A word boundary follows this codepoint.
    pub fn is_word_break(&self) -> bool {
        self.has(Self::WORD_BREAK)
    }

    /// A line may be broken after this codepoint.
    pub fn is_line_break(&self) -> bool {
        self.has(Self::LINE_BREAK)
    }

    /// A line must be broken after this codepoint.
    pub fn is_must_line_break(&self) -> bool {
        self.has(Self::MUST_LINE_BREAK)
    }

    /// The codepoint is part of an emoji grapheme.
    pub fn is_emoji(&self) -> bool {
        self.has(Self::EMOJI)
    }

    /// The codepoint is whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.has(Self::WHITESPACE)
    }

    /// The codepoint ends a paragraph.
    pub fn is_paragraph_separator(&self) -> bool {
        self.has(Self::PARAGRAPH_SEPARATOR)
    }

    /// The codepoint is a control character.
    pub fn is_control(&self) -> bool {
        self.has(Self::CONTROL)
    }

    /// The codepoint has an odd (right-to-left) bidi level.
    pub fn is_rtl(&self) -> bool {
        self.level & 1 != 0
    }
}

/// Segmenters and property tables, created once per [`LayoutContext`](crate::LayoutContext).
pub(crate) struct Analyzer {
    grapheme: GraphemeClusterSegmenterBorrowed<'static>,
    word: WordSegmenterBorrowed<'static>,
    line: LineSegmenterBorrowed<'static>,
    script: CodePointMapDataBorrowed<'static, Script>,
    pictographic: CodePointSetDataBorrowed<'static>,
    emoji_presentation: CodePointSetDataBorrowed<'static>,
    regional_indicator: CodePointSetDataBorrowed<'static>,
    utf8: String,
    byte_to_char: Vec<u32>,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").finish_non_exhaustive()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub(crate) fn new() -> Self {
        Self {
            grapheme: GraphemeClusterSegmenter::new(),
            word: WordSegmenter::new_auto(WordBreakInvariantOptions::default()),
            line: LineSegmenter::new_auto(LineBreakOptions::default()),
            script: CodePointMapData::<Script>::new(),
            pictographic: CodePointSetData::new::<ExtendedPictographic>(),
            emoji_presentation: CodePointSetData::new::<EmojiPresentation>(),
            regional_indicator: CodePointSetData::new::<RegionalIndicator>(),
            utf8: String::new(),
            byte_to_char: Vec::new(),
        }
    }

    /// Analyze `text`, filling `out` with one property per codepoint.
    ///
    /// Returns `true` if the resolved base direction of the first paragraph is RTL.
    pub(crate) fn analyze(
        &mut self,
        text: &[char],
        direction: TextDirection,
        ignore_must_breaks: bool,
        out: &mut Vec<TextProperty>,
    ) -> bool {
        out.clear();
        self.utf8.clear();
        self.byte_to_char.clear();
        if text.is_empty() {
            return direction.is_rtl();
        }
        for (index, &ch) in text.iter().enumerate() {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            let start = self.utf8.len();
            self.utf8.push(ch);
            self.byte_to_char
                .extend(core::iter::repeat_n(index, self.utf8.len() - start));
            let mut prop = TextProperty::new(self.script.get(ch));
            if ch.is_whitespace() {
                prop.set(TextProperty::WHITESPACE);
            }
            if ch.is_control() {
                prop.set(TextProperty::CONTROL);
            }
            if crate::util::is_paragraph_separator(ch) {
                prop.set(TextProperty::PARAGRAPH_SEPARATOR);
            }
            out.push(prop);
        }
        let len = u32::try_from(text.len()).unwrap_or(u32::MAX);
        self.byte_to_char.push(len);

        resolve_scripts(out);

        let char_index = |byte: usize, map: &[u32]| map[byte] as usize;
        for byte in self.grapheme.segment_str(&self.utf8) {
            if byte > 0 {
                let ix = char_index(byte, &self.byte_to_char);
                out[ix - 1].set(TextProperty::GRAPHEME_BREAK);
            }
        }
        for byte in self.word.segment_str(&self.utf8) {
            if byte > 0 {
                let ix = char_index(byte, &self.byte_to_char);
                out[ix - 1].set(TextProperty::WORD_BREAK);
            }
        }
        for byte in self.line.segment_str(&self.utf8) {
            if byte > 0 {
                let ix = char_index(byte, &self.byte_to_char);
                out[ix - 1].set(TextProperty::LINE_BREAK);
            }
        }
        if !ignore_must_breaks {
            for (ix, &ch) in text.iter().enumerate() {
                let must = match ch {
                    '\r' => text.get(ix + 1) != Some(&'\n'),
                    '\n' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}' => true,
                    _ => false,
                };
                if must && out[ix].is_line_break() {
                    out[ix].set(TextProperty::MUST_LINE_BREAK);
                }
            }
        }

        self.mark_emoji(text, out);

        let default_level = match direction {
            TextDirection::Auto => None,
            TextDirection::Ltr => Some(Level::ltr()),
            TextDirection::Rtl => Some(Level::rtl()),
        };
        let bidi = BidiInfo::new(&self.utf8, default_level);
        for (byte, level) in bidi.levels.iter().enumerate() {
            if self.utf8.is_char_boundary(byte) {
                let ix = self.byte_to_char[byte] as usize;
                out[ix].level = level.number();
            }
        }
        bidi.paragraphs
            .first()
            .map(|p| p.level.is_rtl())
            .unwrap_or(direction.is_rtl())
    }

    fn mark_emoji(&self, text: &[char], out: &mut [TextProperty]) {
        let mut start = 0;
        while start < text.len() {
            let mut end = start;
            while end < text.len() && !out[end].is_grapheme_break() {
                end += 1;
            }
            let end = (end + 1).min(text.len());
            let cluster = &text[start..end];
            let first = cluster[0];
            let emoji = self.regional_indicator.contains(first)
                || (self.pictographic.contains(first)
                    && (self.emoji_presentation.contains(first)
                        || cluster.contains(&'\u{FE0F}')
                        || cluster.len() > 1 && cluster.contains(&'\u{200D}')))
                || cluster.contains(&'\u{20E3}');
            if emoji {
                for prop in &mut out[start..end] {
                    prop.set(TextProperty::EMOJI);
                }
            }
            start = end;
        }
    }
}

/// Replace Common and Inherited scripts with the script of the surrounding text.
fn resolve_scripts(props: &mut [TextProperty]) {
    let is_weak = |s: Script| s == Script::Common || s == Script::Inherited || s == Script::Unknown;
    let mut last = None;
    for prop in props.iter_mut() {
        if is_weak(prop.script) {
            if let Some(script) = last {
                prop.script = script;
            }
        } else {
            last = Some(prop.script);
        }
    }
    // Leading weak codepoints take the first real script.
    if let Some(first) = props.iter().map(|p| p.script).find(|s| !is_weak(*s)) {
        for prop in props.iter_mut() {
            if !is_weak(prop.script) {
                break;
            }
            prop.script = first;
        }
    }
}

/// Resolve the base direction of `text` from its first strong character.
pub fn first_strong_direction(text: &[char]) -> Option<TextDirection> {
    use unicode_bidi::BidiClass;
    text.iter().find_map(|&ch| match unicode_bidi::bidi_class(ch) {
        BidiClass::L => Some(TextDirection::Ltr),
        BidiClass::R | BidiClass::AL => Some(TextDirection::Rtl),
        _ => None,
    })
}
