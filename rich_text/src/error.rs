// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use core::ops::Range;

/// A codepoint range rejected by a [`RichText`](crate::RichText) operation.
///
/// Records what went wrong, the range that was passed in and how long the text was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    range: Range<usize>,
    text_len: usize,
}

impl Error {
    /// Validate `start..end` against a text of `text_len` codepoints.
    pub(crate) fn check(start: usize, end: usize, text_len: usize) -> Result<(), Self> {
        let kind = if start > end {
            ErrorKind::InvalidRange
        } else if end > text_len {
            ErrorKind::InvalidBounds
        } else {
            return Ok(());
        };
        Err(Self {
            kind,
            range: start..end,
            text_len,
        })
    }

    /// What went wrong.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The range that was rejected, in codepoints.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Number of codepoints in the text when the range was rejected.
    pub fn text_len(&self) -> usize {
        self.text_len
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Range { start, end } = self.range;
        match self.kind {
            ErrorKind::InvalidBounds => write!(
                f,
                "codepoint range {start}..{end} exceeds text of {} codepoints",
                self.text_len
            ),
            ErrorKind::InvalidRange => write!(f, "codepoint range {start}..{end} is reversed"),
        }
    }
}

impl core::error::Error for Error {}

/// Category of an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The range ends past the end of the text.
    InvalidBounds,
    /// The range starts after it ends.
    InvalidRange,
}
