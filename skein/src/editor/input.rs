// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keys, modifiers and click counting.

use core::ops::{BitOr, BitOrAssign, Range};

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

/// Keys the editor reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home.
    Home,
    /// End.
    End,
    /// Backspace.
    Backspace,
    /// Forward delete.
    Delete,
    /// Enter or return.
    Enter,
    /// Tab.
    Tab,
    /// Escape.
    Escape,
    /// A character key, used for shortcuts. Typed text goes through
    /// [`EditorDriver::insert_text_utf8`](super::EditorDriver::insert_text_utf8).
    Character(char),
}

/// Keyboard modifier state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self(0);
    /// Shift.
    pub const SHIFT: Self = Self(1 << 0);
    /// Control.
    pub const CONTROL: Self = Self(1 << 1);
    /// Alt or option.
    pub const ALT: Self = Self(1 << 2);
    /// Command or super.
    pub const COMMAND: Self = Self(1 << 3);

    /// Returns `true` if every modifier in `other` is held.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if shift is held.
    pub const fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    /// Returns `true` if control or command is held.
    pub const fn shortcut(self) -> bool {
        self.0 & (Self::CONTROL.0 | Self::COMMAND.0) != 0
    }

    /// The modifiers without shift.
    pub const fn without_shift(self) -> Self {
        Self(self.0 & !Self::SHIFT.0)
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Unit a mouse selection snaps to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum Granularity {
    #[default]
    Grapheme,
    Word,
    Line,
}

impl Granularity {
    fn from_click_count(count: u32) -> Self {
        match count {
            0 | 1 => Self::Grapheme,
            2 => Self::Word,
            _ => Self::Line,
        }
    }
}

/// Counts consecutive clicks that are close in time and space.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClickTracker {
    last: Option<(f32, f32, u64)>,
    count: u32,
}

impl ClickTracker {
    /// Register a click, returning the granularity it selects.
    ///
    /// The count cycles back to a single click after a triple click.
    pub(crate) fn click(
        &mut self,
        x: f32,
        y: f32,
        time_ms: u64,
        max_time_ms: u64,
        max_distance: f32,
    ) -> Granularity {
        let repeated = self.last.is_some_and(|(lx, ly, lt)| {
            time_ms >= lt
                && time_ms - lt <= max_time_ms
                && (x - lx).abs() <= max_distance
                && (y - ly).abs() <= max_distance
        });
        self.count = if repeated { self.count % 3 + 1 } else { 1 };
        self.last = Some((x, y, time_ms));
        Granularity::from_click_count(self.count)
    }

    pub(crate) fn reset(&mut self) {
        self.last = None;
        self.count = 0;
    }
}

/// State of a mouse drag started by a click.
#[derive(Clone, Debug)]
pub(crate) struct DragState {
    /// The range selected by the click, drags never shrink below it.
    pub(crate) anchor: Range<usize>,
    pub(crate) granularity: Granularity,
}

#[cfg(test)]
mod tests {
    use super::{ClickTracker, Granularity, Modifiers};

    #[test]
    fn click_counting() {
        let mut clicks = ClickTracker::default();
        assert_eq!(clicks.click(10.0, 10.0, 1000, 400, 4.0), Granularity::Grapheme);
        assert_eq!(clicks.click(11.0, 10.0, 1200, 400, 4.0), Granularity::Word);
        assert_eq!(clicks.click(11.0, 12.0, 1500, 400, 4.0), Granularity::Line);
        assert_eq!(clicks.click(11.0, 12.0, 1600, 400, 4.0), Granularity::Grapheme);
        // Too slow.
        assert_eq!(clicks.click(11.0, 12.0, 2100, 400, 4.0), Granularity::Grapheme);
        // Too far.
        assert_eq!(clicks.click(20.0, 12.0, 2200, 400, 4.0), Granularity::Grapheme);
    }

    #[test]
    fn modifier_queries() {
        let mods = Modifiers::CONTROL | Modifiers::SHIFT;
        assert!(mods.shift());
        assert!(mods.shortcut());
        assert_eq!(mods.without_shift(), Modifiers::CONTROL);
        assert!(!Modifiers::NONE.shortcut());
        assert!(Modifiers::COMMAND.shortcut());
    }
}
