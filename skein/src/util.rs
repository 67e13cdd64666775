// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Misc helpers.

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

pub(crate) fn nearly_eq(x: f32, y: f32) -> bool {
    (x - y).abs() < f32::EPSILON
}

/// Converts a layout coordinate to the `f64` used by geometry types.
pub(crate) fn to_f64(x: f32) -> f64 {
    f64::from(x)
}

/// Returns `true` for codepoints that end a paragraph.
pub(crate) fn is_paragraph_separator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2029}')
}
