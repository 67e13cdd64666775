// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactive editing of rich text split into paragraphs.

mod backspace;
#[allow(clippy::module_inception, reason = "the editor type lives in its own file")]
mod editor;
mod input;
mod selection;
mod undo;

pub use editor::{Editor, EditorDriver, EditorParams, Paragraph};
pub use input::{Key, Modifiers};
pub use selection::TextSelection;
