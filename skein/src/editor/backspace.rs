// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! How much text a backspace removes.
//!
//! Backspace does not delete whole grapheme clusters: after typing `e` and a combining
//! accent, backspace removes just the accent. Emoji sequences are different, removing
//! part of a flag, keycap, tag or ZWJ sequence leaves a broken glyph, so they go as a
//! unit. The state table matches Android's `BaseKeyListener`.

use icu_properties::props::{
    CanonicalCombiningClass, Emoji, EmojiModifier, EmojiModifierBase, RegionalIndicator,
    VariationSelector,
};
use icu_properties::{
    CodePointMapData, CodePointMapDataBorrowed, CodePointSetData, CodePointSetDataBorrowed,
};

const ZWJ: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';
const CANCEL_TAG: char = '\u{E007F}';

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Start,
    LineFeed,
    BeforeKeycap,
    BeforeVsAndKeycap,
    BeforeEmojiModifier,
    BeforeVsAndEmojiModifier,
    BeforeVs,
    BeforeEmoji,
    BeforeZwj,
    BeforeVsAndZwj,
    OddNumberedRis,
    EvenNumberedRis,
    InTagSequence,
    Finished,
}

/// Emoji property tables used by [`Backspace::start_offset`].
pub(crate) struct Backspace {
    emoji: CodePointSetDataBorrowed<'static>,
    modifier: CodePointSetDataBorrowed<'static>,
    modifier_base: CodePointSetDataBorrowed<'static>,
    regional_indicator: CodePointSetDataBorrowed<'static>,
    variation_selector: CodePointSetDataBorrowed<'static>,
    combining_class: CodePointMapDataBorrowed<'static, CanonicalCombiningClass>,
}

impl core::fmt::Debug for Backspace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Backspace").finish_non_exhaustive()
    }
}

impl Default for Backspace {
    fn default() -> Self {
        Self::new()
    }
}

fn is_keycap_base(ch: char) -> bool {
    matches!(ch, '0'..='9' | '#' | '*')
}

fn is_tag_spec(ch: char) -> bool {
    ('\u{E0020}'..='\u{E007E}').contains(&ch)
}

impl Backspace {
    pub(crate) fn new() -> Self {
        Self {
            emoji: CodePointSetData::new::<Emoji>(),
            modifier: CodePointSetData::new::<EmojiModifier>(),
            modifier_base: CodePointSetData::new::<EmojiModifierBase>(),
            regional_indicator: CodePointSetData::new::<RegionalIndicator>(),
            variation_selector: CodePointSetData::new::<VariationSelector>(),
            combining_class: CodePointMapData::<CanonicalCombiningClass>::new(),
        }
    }

    /// Start of the text a backspace at `offset` removes.
    pub(crate) fn start_offset(&self, text: &[char], offset: usize) -> usize {
        let offset = offset.min(text.len());
        if offset == 0 {
            return 0;
        }
        let mut delete = 0_usize;
        let mut last_vs = 0_usize;
        let mut state = State::Start;
        let mut cursor = offset;
        loop {
            cursor -= 1;
            let ch = text[cursor];
            state = match state {
                State::Start => {
                    delete = 1;
                    if ch == '\n' {
                        State::LineFeed
                    } else if self.variation_selector.contains(ch) {
                        State::BeforeVs
                    } else if self.regional_indicator.contains(ch) {
                        State::OddNumberedRis
                    } else if self.modifier.contains(ch) {
                        State::BeforeEmojiModifier
                    } else if ch == KEYCAP {
                        State::BeforeKeycap
                    } else if self.emoji.contains(ch) {
                        State::BeforeEmoji
                    } else if ch == CANCEL_TAG {
                        State::InTagSequence
                    } else {
                        State::Finished
                    }
                }
                State::LineFeed => {
                    if ch == '\r' {
                        delete += 1;
                    }
                    State::Finished
                }
                State::OddNumberedRis => {
                    if self.regional_indicator.contains(ch) {
                        delete += 1;
                        State::EvenNumberedRis
                    } else {
                        State::Finished
                    }
                }
                State::EvenNumberedRis => {
                    if self.regional_indicator.contains(ch) {
                        // An odd run: the last indicator pairs with the one before.
                        delete -= 1;
                        State::OddNumberedRis
                    } else {
                        State::Finished
                    }
                }
                State::BeforeKeycap => {
                    if self.variation_selector.contains(ch) {
                        last_vs = 1;
                        State::BeforeVsAndKeycap
                    } else {
                        if is_keycap_base(ch) {
                            delete += 1;
                        }
                        State::Finished
                    }
                }
                State::BeforeVsAndKeycap => {
                    if is_keycap_base(ch) {
                        delete += last_vs + 1;
                    }
                    State::Finished
                }
                State::BeforeEmojiModifier => {
                    if self.variation_selector.contains(ch) {
                        last_vs = 1;
                        State::BeforeVsAndEmojiModifier
                    } else if self.modifier_base.contains(ch) {
                        delete += 1;
                        State::BeforeEmoji
                    } else {
                        State::Finished
                    }
                }
                State::BeforeVsAndEmojiModifier => {
                    if self.modifier_base.contains(ch) {
                        delete += last_vs + 1;
                    }
                    State::Finished
                }
                State::BeforeVs => {
                    if self.emoji.contains(ch) {
                        delete += 1;
                        State::BeforeEmoji
                    } else {
                        if !self.variation_selector.contains(ch)
                            && self.combining_class.get(ch) == CanonicalCombiningClass::NotReordered
                        {
                            delete += 1;
                        }
                        State::Finished
                    }
                }
                State::BeforeEmoji => {
                    if ch == ZWJ {
                        State::BeforeZwj
                    } else {
                        State::Finished
                    }
                }
                State::BeforeZwj => {
                    if self.emoji.contains(ch) {
                        // The emoji and the joiner.
                        delete += 2;
                        if self.modifier.contains(ch) {
                            State::BeforeEmojiModifier
                        } else {
                            State::BeforeEmoji
                        }
                    } else if self.variation_selector.contains(ch) {
                        last_vs = 1;
                        State::BeforeVsAndZwj
                    } else {
                        State::Finished
                    }
                }
                State::BeforeVsAndZwj => {
                    if self.emoji.contains(ch) {
                        delete += last_vs + 2;
                        last_vs = 0;
                        State::BeforeEmoji
                    } else {
                        State::Finished
                    }
                }
                State::InTagSequence => {
                    if is_tag_spec(ch) {
                        delete += 1;
                        State::InTagSequence
                    } else if self.emoji.contains(ch) {
                        delete += 1;
                        State::Finished
                    } else {
                        // Malformed tag sequence, only the cancel tag goes.
                        delete = 1;
                        State::Finished
                    }
                }
                State::Finished => State::Finished,
            };
            if cursor == 0 || state == State::Finished {
                break;
            }
        }
        offset - delete.min(offset)
    }
}
