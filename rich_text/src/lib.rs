// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rich Text is a codepoint buffer with attribute spans applied over ranges.
//!
//! Text is stored as UTF-32 (`char`) so that offsets are codepoint indices, which is
//! what the layout and editing code address positions with. Spans may overlap and
//! are kept in application order; consumers resolve conflicts by letting the span
//! applied last win.
//!
//! ## Features
//!
//! - `std` (enabled by default): This is currently unused and is provided for forward compatibility.
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
#![no_std]

extern crate alloc;

mod error;
mod rich_text;
mod segments;

pub use crate::error::{Error, ErrorKind};
pub use crate::rich_text::{AttributeSpan, Payload, RichText};
pub use crate::segments::{Segments, SegmentsWorkspace};
