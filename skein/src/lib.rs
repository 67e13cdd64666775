// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rich text layout and editing.
//!
//! Text is styled with [`Attribute`](attribute::Attribute) values collected in
//! [`AttributeSet`](attribute::AttributeSet)s, laid out into a [`Layout`] of positioned
//! glyphs and lines, and edited through an [`Editor`](editor::Editor) that keeps one
//! layout per paragraph.
//!
//! Fonts and shaping are provided by the host through the traits in [`font`] and
//! [`shape`]; [`testing`] has a deterministic implementation.
//!
//! ## Features
//!
//! - `std` (enabled by default): Use the standard library.
//! - `libm`: Use floating point functions from `libm` when building without `std`.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("skein requires either the `std` or `libm` feature to be enabled");

extern crate alloc;

mod analysis;
mod util;

pub mod attribute;
pub mod cache;
pub mod context;
pub mod editor;
pub mod font;
pub mod layout;
pub mod rules;
pub mod shape;
pub mod testing;

#[cfg(test)]
mod tests;

pub use rich_text::RichText;

pub use analysis::{first_strong_direction, TextProperty};
pub use cache::LayoutCache;
pub use context::LayoutContext;
pub use font::FontContext;
pub use layout::Layout;
