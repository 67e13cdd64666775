// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::Range;

use crate::Error;

/// Opaque data attached to one attribute occurrence, for example a hyperlink target.
pub type Payload = Arc<[u8]>;

/// An attribute applied to a range of codepoints.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeSpan<A> {
    /// Codepoint range the attribute applies to.
    pub range: Range<usize>,
    /// The applied attribute.
    pub attribute: A,
    /// Optional data owned by this occurrence of the attribute.
    pub payload: Option<Payload>,
}

/// A mutable codepoint buffer with attribute spans applied to ranges within it.
///
/// Spans are neither sorted nor deduplicated. When spans of conflicting attributes
/// overlap, the one applied later wins.
#[derive(Clone, Debug, PartialEq)]
pub struct RichText<A> {
    text: Vec<char>,
    spans: Vec<AttributeSpan<A>>,
}

impl<A> Default for RichText<A> {
    fn default() -> Self {
        Self {
            text: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<A: Clone + Debug> From<&str> for RichText<A> {
    fn from(text: &str) -> Self {
        let mut rich = Self::new();
        rich.append_str(text, &[]);
        rich
    }
}

impl<A: Clone + Debug> RichText<A> {
    /// Create an empty `RichText`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the codepoints.
    pub fn text(&self) -> &[char] {
        &self.text
    }

    /// Returns the length of the text, in codepoints.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the codepoint at `index`, if any.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.text.get(index).copied()
    }

    /// Encode the whole text as UTF-8.
    pub fn to_utf8(&self) -> String {
        self.text.iter().collect()
    }

    /// Append the UTF-8 encoding of `range` to `out`.
    pub fn write_utf8(&self, range: Range<usize>, out: &mut String) {
        let end = range.end.min(self.text.len());
        let start = range.start.min(end);
        out.extend(&self.text[start..end]);
    }

    /// All spans, in application order.
    pub fn spans(&self) -> &[AttributeSpan<A>] {
        &self.spans
    }

    /// Returns the number of attribute spans applied to the text.
    pub fn spans_len(&self) -> usize {
        self.spans.len()
    }

    /// Append `text`, covering it with one span per attribute in `attributes`.
    ///
    /// Returns the range of the appended codepoints.
    pub fn append(&mut self, text: &[char], attributes: &[A]) -> Range<usize> {
        let start = self.text.len();
        self.text.extend_from_slice(text);
        let range = start..self.text.len();
        if !range.is_empty() {
            self.push_spans(range.clone(), attributes);
        }
        range
    }

    /// Append UTF-8 `text`, covering it with one span per attribute in `attributes`.
    pub fn append_str(&mut self, text: &str, attributes: &[A]) -> Range<usize> {
        let start = self.text.len();
        self.text.extend(text.chars());
        let range = start..self.text.len();
        if !range.is_empty() {
            self.push_spans(range.clone(), attributes);
        }
        range
    }

    /// Append another rich text, keeping its spans and their order.
    pub fn append_rich(&mut self, other: &Self) {
        let offset = self.text.len();
        self.text.extend_from_slice(&other.text);
        self.spans.extend(other.spans.iter().map(|span| AttributeSpan {
            range: span.range.start + offset..span.range.end + offset,
            attribute: span.attribute.clone(),
            payload: span.payload.clone(),
        }));
    }

    /// Apply an `attribute` to a `range` within the text.
    ///
    /// Existing spans are left alone, so a later span of the same kind overrides
    /// earlier ones where they overlap.
    pub fn add_attribute(&mut self, range: Range<usize>, attribute: A) -> Result<(), Error> {
        Error::check(range.start, range.end, self.text.len())?;
        self.spans.push(AttributeSpan {
            range,
            attribute,
            payload: None,
        });
        Ok(())
    }

    /// Apply an `attribute` carrying `payload` to a `range` within the text.
    pub fn add_attribute_with_payload(
        &mut self,
        range: Range<usize>,
        attribute: A,
        payload: Payload,
    ) -> Result<(), Error> {
        Error::check(range.start, range.end, self.text.len())?;
        self.spans.push(AttributeSpan {
            range,
            attribute,
            payload: Some(payload),
        });
        Ok(())
    }

    /// Remove every codepoint for which `predicate(index, ch)` returns `true`.
    ///
    /// Span ranges are remapped to the new offsets and spans that end up empty are
    /// dropped. Returns the number of removed codepoints.
    pub fn remove_if(&mut self, mut predicate: impl FnMut(usize, char) -> bool) -> usize {
        // `kept_before[i]` is the new offset of old offset `i`.
        let mut kept_before = Vec::with_capacity(self.text.len() + 1);
        let mut kept = Vec::with_capacity(self.text.len());
        for (index, &ch) in self.text.iter().enumerate() {
            kept_before.push(kept.len());
            if !predicate(index, ch) {
                kept.push(ch);
            }
        }
        kept_before.push(kept.len());
        let removed = self.text.len() - kept.len();
        if removed == 0 {
            return 0;
        }
        self.text = kept;
        let new_len = self.text.len();
        self.spans.retain_mut(|span| {
            let start = kept_before[span.range.start.min(kept_before.len() - 1)].min(new_len);
            let end = kept_before[span.range.end.min(kept_before.len() - 1)].min(new_len);
            span.range = start..end.max(start);
            !span.range.is_empty()
        });
        removed
    }

    /// Insert `text` at `at`, covering it with exactly `attributes`.
    ///
    /// Spans that strictly contain `at` are split around the inserted text so that
    /// it does not inherit them. Spans starting at or after `at` are shifted.
    pub fn insert(
        &mut self,
        at: usize,
        text: &[char],
        attributes: &[A],
    ) -> Result<Range<usize>, Error> {
        Error::check(at, at, self.text.len())?;
        let count = text.len();
        let range = at..at + count;
        if count == 0 {
            return Ok(range);
        }
        self.text.splice(at..at, text.iter().copied());

        let mut index = 0;
        while index < self.spans.len() {
            let span = &mut self.spans[index];
            if span.range.start >= at {
                span.range.start += count;
                span.range.end += count;
            } else if span.range.end > at {
                let tail = AttributeSpan {
                    range: at + count..span.range.end + count,
                    attribute: span.attribute.clone(),
                    payload: span.payload.clone(),
                };
                span.range.end = at;
                index += 1;
                self.spans.insert(index, tail);
            }
            index += 1;
        }
        self.push_spans(range.clone(), attributes);
        Ok(range)
    }

    /// Remove the codepoints in `range`, remapping spans.
    ///
    /// Spans that lie entirely inside `range` are dropped.
    pub fn remove(&mut self, range: Range<usize>) -> Result<(), Error> {
        Error::check(range.start, range.end, self.text.len())?;
        if range.is_empty() {
            return Ok(());
        }
        let count = range.len();
        self.text.drain(range.clone());
        let map = |offset: usize| {
            if offset <= range.start {
                offset
            } else if offset >= range.end {
                offset - count
            } else {
                range.start
            }
        };
        self.spans.retain_mut(|span| {
            let was_empty = span.range.is_empty();
            span.range = map(span.range.start)..map(span.range.end);
            was_empty || !span.range.is_empty()
        });
        Ok(())
    }

    /// Copy `range` into a new `RichText`, clipping spans to it.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, Error> {
        Error::check(range.start, range.end, self.text.len())?;
        let text = self.text[range.clone()].to_vec();
        let spans = self
            .spans
            .iter()
            .filter_map(|span| {
                let start = span.range.start.max(range.start);
                let end = span.range.end.min(range.end);
                (start < end).then(|| AttributeSpan {
                    range: start - range.start..end - range.start,
                    attribute: span.attribute.clone(),
                    payload: span.payload.clone(),
                })
            })
            .collect();
        Ok(Self { text, spans })
    }

    /// Cut every span matching `predicate` out of `range`.
    ///
    /// Spans partially overlapping the range are trimmed, spans strictly containing
    /// it are split in two.
    pub fn clear_attribute(
        &mut self,
        range: Range<usize>,
        mut predicate: impl FnMut(&A) -> bool,
    ) -> Result<(), Error> {
        Error::check(range.start, range.end, self.text.len())?;
        if range.is_empty() {
            return Ok(());
        }
        let mut index = 0;
        while index < self.spans.len() {
            let span = &mut self.spans[index];
            let overlaps = span.range.start < range.end && span.range.end > range.start;
            if !overlaps || !predicate(&span.attribute) {
                index += 1;
                continue;
            }
            let keep_head = span.range.start < range.start;
            let keep_tail = span.range.end > range.end;
            match (keep_head, keep_tail) {
                (false, false) => {
                    self.spans.remove(index);
                    continue;
                }
                (true, false) => span.range.end = range.start,
                (false, true) => span.range.start = range.end,
                (true, true) => {
                    let tail = AttributeSpan {
                        range: range.end..span.range.end,
                        attribute: span.attribute.clone(),
                        payload: span.payload.clone(),
                    };
                    span.range.end = range.start;
                    index += 1;
                    self.spans.insert(index, tail);
                }
            }
            index += 1;
        }
        Ok(())
    }

    /// Get an iterator over the attributes that apply at the given `index`.
    ///
    /// This doesn't handle conflicting attributes, it just reports everything in
    /// application order.
    pub fn attributes_at(&self, index: usize) -> impl DoubleEndedIterator<Item = &A> + '_ {
        self.spans_at(index).map(|span| &span.attribute)
    }

    /// Get an iterator over the spans that apply at the given `index`.
    pub fn spans_at(
        &self,
        index: usize,
    ) -> impl DoubleEndedIterator<Item = &AttributeSpan<A>> + '_ {
        self.spans
            .iter()
            .filter(move |span| span.range.contains(&index))
    }

    /// Get an iterator over the attributes that overlap the given `range`.
    pub fn attributes_for_range(
        &self,
        range: Range<usize>,
    ) -> impl DoubleEndedIterator<Item = &A> + '_ {
        self.spans.iter().filter_map(move |span| {
            (span.range.start < range.end && span.range.end > range.start)
                .then_some(&span.attribute)
        })
    }

    /// Returns `true` if every codepoint of a non-empty `range` is covered by a span
    /// whose attribute matches `predicate`.
    pub fn covers(&self, range: Range<usize>, mut predicate: impl FnMut(&A) -> bool) -> bool {
        if range.is_empty() {
            return false;
        }
        let mut covering: Vec<Range<usize>> = self
            .spans
            .iter()
            .filter(|span| {
                span.range.start < range.end
                    && span.range.end > range.start
                    && predicate(&span.attribute)
            })
            .map(|span| span.range.clone())
            .collect();
        covering.sort_unstable_by_key(|r| r.start);
        let mut reached = range.start;
        for r in covering {
            if r.start > reached {
                break;
            }
            reached = reached.max(r.end);
            if reached >= range.end {
                return true;
            }
        }
        false
    }

    /// Remove all text and spans.
    pub fn clear(&mut self) {
        self.text.clear();
        self.spans.clear();
    }

    /// Remove all applied attribute spans.
    pub fn clear_attributes(&mut self) {
        self.spans.clear();
    }

    fn push_spans(&mut self, range: Range<usize>, attributes: &[A]) {
        self.spans
            .extend(attributes.iter().map(|attribute| AttributeSpan {
                range: range.clone(),
                attribute: attribute.clone(),
                payload: None,
            }));
    }
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, RichText};
    use alloc::format;
    use alloc::vec::Vec;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAttribute {
        Bold,
        Italic,
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn append_covers_appended_range() {
        let mut rt = RichText::new();
        rt.append_str("Hello", &[]);
        let range = rt.append_str(" world", &[TestAttribute::Bold]);
        assert_eq!(range, 5..11);
        assert_eq!(rt.spans_len(), 1);
        assert_eq!(rt.spans()[0].range, 5..11);
        assert_eq!(rt.to_utf8(), "Hello world");
    }

    #[expect(
        clippy::reversed_empty_ranges,
        reason = "We want an invalid range for testing."
    )]
    #[test]
    fn bad_range_for_add_attribute() {
        let mut rt = RichText::<TestAttribute>::from("Hello!");
        assert!(rt.add_attribute(0..6, TestAttribute::Bold).is_ok());
        match rt.add_attribute(4..3, TestAttribute::Bold) {
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::InvalidRange);
                let msg = format!("{}", e);
                assert!(msg.contains("4..3"));
                assert!(msg.contains("reversed"));
            }
            _ => panic!("expected InvalidRange"),
        }
        match rt.add_attribute(2..7, TestAttribute::Bold) {
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::InvalidBounds);
                assert_eq!(e.text_len(), 6);
                assert_eq!(e.range(), 2..7);
                assert!(format!("{}", e).contains("6 codepoints"));
            }
            _ => panic!("expected InvalidBounds"),
        }
    }

    #[test]
    fn remove_if_remaps_and_drops_empty_spans() {
        let mut rt = RichText::<TestAttribute>::from("-12-34");
        rt.add_attribute(0..1, TestAttribute::Bold).unwrap();
        rt.add_attribute(1..6, TestAttribute::Italic).unwrap();
        let removed = rt.remove_if(|_, ch| ch == '-');
        assert_eq!(removed, 2);
        assert_eq!(rt.to_utf8(), "1234");
        assert_eq!(rt.spans_len(), 1);
        assert_eq!(rt.spans()[0].attribute, TestAttribute::Italic);
        assert_eq!(rt.spans()[0].range, 0..4);
    }

    #[test]
    fn remove_if_everything_leaves_no_spans() {
        let mut rt = RichText::new();
        rt.append_str("abc", &[TestAttribute::Bold]);
        rt.remove_if(|_, _| true);
        assert!(rt.is_empty());
        assert_eq!(rt.spans_len(), 0);
    }

    #[test]
    fn insert_splits_containing_span() {
        let mut rt = RichText::new();
        rt.append_str("abcd", &[TestAttribute::Bold]);
        let range = rt.insert(2, &chars("XY"), &[TestAttribute::Italic]).unwrap();
        assert_eq!(range, 2..4);
        assert_eq!(rt.to_utf8(), "abXYcd");
        assert_eq!(rt.attributes_at(2).collect::<Vec<_>>(), [&TestAttribute::Italic]);
        assert_eq!(rt.attributes_at(1).collect::<Vec<_>>(), [&TestAttribute::Bold]);
        assert_eq!(rt.attributes_at(4).collect::<Vec<_>>(), [&TestAttribute::Bold]);
        // Split halves keep their original position in application order.
        assert_eq!(rt.spans()[0].range, 0..2);
        assert_eq!(rt.spans()[1].range, 4..6);
    }

    #[test]
    fn insert_at_span_end_does_not_extend() {
        let mut rt = RichText::new();
        rt.append_str("ab", &[TestAttribute::Bold]);
        rt.insert(2, &chars("c"), &[]).unwrap();
        assert_eq!(rt.attributes_at(2).count(), 0);
        assert!(rt.insert(9, &chars("c"), &[]).is_err());
    }

    #[test]
    fn remove_range_remaps_spans() {
        let mut rt = RichText::<TestAttribute>::from("abcdef");
        rt.add_attribute(1..3, TestAttribute::Bold).unwrap();
        rt.add_attribute(2..5, TestAttribute::Italic).unwrap();
        rt.remove(1..3).unwrap();
        assert_eq!(rt.to_utf8(), "adef");
        assert_eq!(rt.spans_len(), 1);
        assert_eq!(rt.spans()[0].range, 1..3);
    }

    #[test]
    fn clear_attribute_splits_and_trims() {
        let mut rt = RichText::<TestAttribute>::from("abcdefgh");
        rt.add_attribute(0..8, TestAttribute::Bold).unwrap();
        rt.add_attribute(0..4, TestAttribute::Italic).unwrap();
        rt.clear_attribute(2..6, |a| *a == TestAttribute::Bold).unwrap();
        let bold: Vec<_> = rt
            .spans()
            .iter()
            .filter(|s| s.attribute == TestAttribute::Bold)
            .map(|s| s.range.clone())
            .collect();
        assert_eq!(bold, [0..2, 6..8]);
        rt.clear_attribute(0..8, |a| *a == TestAttribute::Italic).unwrap();
        assert!(rt.spans().iter().all(|s| s.attribute == TestAttribute::Bold));
    }

    #[test]
    fn covers_requires_whole_range() {
        let mut rt = RichText::<TestAttribute>::from("abcdef");
        rt.add_attribute(0..3, TestAttribute::Bold).unwrap();
        rt.add_attribute(3..5, TestAttribute::Bold).unwrap();
        assert!(rt.covers(0..5, |a| *a == TestAttribute::Bold));
        assert!(!rt.covers(0..6, |a| *a == TestAttribute::Bold));
        assert!(!rt.covers(2..2, |a| *a == TestAttribute::Bold));
    }

    #[test]
    fn slice_and_append_rich() {
        let mut rt = RichText::new();
        rt.append_str("ab", &[]);
        rt.append_str("cd", &[TestAttribute::Bold]);
        let tail = rt.slice(1..4).unwrap();
        assert_eq!(tail.to_utf8(), "bcd");
        assert_eq!(tail.spans()[0].range, 1..3);

        let mut joined = RichText::<TestAttribute>::from("x");
        joined.append_rich(&tail);
        assert_eq!(joined.to_utf8(), "xbcd");
        assert_eq!(joined.spans()[0].range, 2..4);
    }
}
