// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A cache of built layouts.

use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use core::ops::Range;

use hashbrown::HashMap;
use rich_text::RichText;

use crate::attribute::{Attribute, AttributeCollection, AttributeSet};
use crate::context::LayoutContext;
use crate::font::FontContext;
use crate::layout::{Layout, LayoutParams};

/// References nested deeper than this are not expanded into cache keys.
const MAX_REFERENCE_DEPTH: u32 = 8;

/// Everything a layout depends on besides the font collection.
///
/// References are expanded through the attribute collection, so changing a named set
/// in the collection changes the key.
#[derive(Clone, Debug, PartialEq, Hash)]
struct CacheKey {
    text: Vec<char>,
    spans: Vec<(Range<usize>, Attribute)>,
    attributes: Vec<Attribute>,
    layout_attributes: Vec<Attribute>,
    layout_width: u32,
    layout_height: u32,
    ignore_must_line_breaks: bool,
    list_marker_counter: u32,
}

impl CacheKey {
    fn new(params: &LayoutParams<'_>, text: Vec<char>, attributes: &AttributeSet<'_>) -> Self {
        let collection = params.attribute_collection;
        Self {
            text,
            spans: Vec::new(),
            attributes: expand(attributes, collection),
            layout_attributes: expand(&params.layout_attributes, collection),
            layout_width: params.layout_width.to_bits(),
            layout_height: params.layout_height.to_bits(),
            ignore_must_line_breaks: params.ignore_must_line_breaks,
            list_marker_counter: params.list_marker_counter,
        }
    }
}

fn expand(set: &AttributeSet<'_>, collection: Option<&AttributeCollection>) -> Vec<Attribute> {
    let mut out = Vec::new();
    expand_items(&set.copy_flat(), collection, 0, &mut out);
    out
}

fn expand_items(
    items: &[Attribute],
    collection: Option<&AttributeCollection>,
    depth: u32,
    out: &mut Vec<Attribute>,
) {
    for item in items {
        out.push(item.clone());
        if let Attribute::Reference(handle) = item {
            if depth >= MAX_REFERENCE_DEPTH {
                continue;
            }
            if let Some(referenced) = collection.and_then(|c| c.items(*handle)) {
                expand_items(referenced, collection, depth + 1, out);
            }
        }
    }
}

#[derive(Debug)]
struct Entry {
    key: CacheKey,
    layout: Layout,
    last_used: u64,
}

/// Memoizes layouts by their text, attributes and parameters.
///
/// Each lookup marks the entry as used in the current epoch. [`LayoutCache::compact`]
/// evicts everything not used since the previous compaction and starts a new epoch,
/// so calling it once per frame keeps exactly the layouts the last frame needed.
/// Returned layouts borrow the cache, which keeps them alive until the next mutable use.
#[derive(Debug)]
pub struct LayoutCache {
    entries: HashMap<u64, Vec<Entry>>,
    len: usize,
    epoch: u64,
    max_entries: usize,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl LayoutCache {
    /// Create a cache holding at most `max_entries` layouts.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            len: 0,
            epoch: 0,
            max_entries: max_entries.max(1),
        }
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the cache holds no layouts.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get or build the layout of UTF-8 `text`.
    pub fn get_utf8(
        &mut self,
        lcx: &mut LayoutContext,
        fcx: &mut FontContext,
        params: &LayoutParams<'_>,
        text: &str,
        attributes: &AttributeSet<'_>,
    ) -> &Layout {
        let key = CacheKey::new(params, text.chars().collect(), attributes);
        self.get_or_build(key, || Layout::build_utf8(lcx, fcx, params, text, attributes))
    }

    /// Get or build the layout of UTF-32 `text`.
    pub fn get_utf32(
        &mut self,
        lcx: &mut LayoutContext,
        fcx: &mut FontContext,
        params: &LayoutParams<'_>,
        text: &[char],
        attributes: &AttributeSet<'_>,
    ) -> &Layout {
        let key = CacheKey::new(params, text.to_vec(), attributes);
        self.get_or_build(key, || Layout::build_utf32(lcx, fcx, params, text, attributes))
    }

    /// Get or build the layout of rich text.
    pub fn get_rich_text(
        &mut self,
        lcx: &mut LayoutContext,
        fcx: &mut FontContext,
        params: &LayoutParams<'_>,
        text: &RichText<Attribute>,
        attributes: &AttributeSet<'_>,
    ) -> &Layout {
        let mut key = CacheKey::new(params, text.text().to_vec(), attributes);
        key.spans = text
            .spans()
            .iter()
            .map(|span| (span.range.clone(), span.attribute.clone()))
            .collect();
        self.get_or_build(key, || {
            Layout::build_rich_text(lcx, fcx, params, text, attributes)
        })
    }

    fn get_or_build(&mut self, key: CacheKey, build: impl FnOnce() -> Layout) -> &Layout {
        let hash = self.entries.hasher().hash_one(&key);
        let found = self
            .entries
            .get(&hash)
            .and_then(|bucket| bucket.iter().position(|entry| entry.key == key));
        if found.is_none() && self.len >= self.max_entries {
            self.evict_oldest();
        }
        let epoch = self.epoch;
        let bucket = self.entries.entry(hash).or_default();
        let index = match found {
            Some(index) => {
                log::trace!("layout cache hit ({} codepoints)", key.text.len());
                index
            }
            None => {
                log::debug!("layout cache miss ({} codepoints)", key.text.len());
                bucket.push(Entry {
                    key,
                    layout: build(),
                    last_used: epoch,
                });
                self.len += 1;
                bucket.len() - 1
            }
        };
        let entry = &mut bucket[index];
        entry.last_used = epoch;
        &entry.layout
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .flat_map(|(hash, bucket)| {
                bucket
                    .iter()
                    .enumerate()
                    .map(move |(ix, entry)| (entry.last_used, *hash, ix))
            })
            .min();
        if let Some((_, hash, ix)) = oldest {
            if let Some(bucket) = self.entries.get_mut(&hash) {
                bucket.swap_remove(ix);
                if bucket.is_empty() {
                    self.entries.remove(&hash);
                }
                self.len -= 1;
            }
        }
    }

    /// Evict layouts not used since the previous call and start a new epoch.
    pub fn compact(&mut self) {
        let epoch = self.epoch;
        let before = self.len;
        self.entries.retain(|_, bucket| {
            bucket.retain(|entry| entry.last_used >= epoch);
            !bucket.is_empty()
        });
        self.len = self.entries.values().map(Vec::len).sum();
        if before != self.len {
            log::debug!("layout cache evicted {} layouts", before - self.len);
        }
        self.epoch += 1;
    }

    /// Remove every cached layout.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::LayoutCache;
    use crate::attribute::{Attribute, AttributeCollection, AttributeSet};
    use crate::layout::LayoutParams;
    use crate::testing::font_context;
    use crate::LayoutContext;

    #[test]
    fn lookup_reuses_layout() {
        let mut lcx = LayoutContext::new();
        let mut fcx = font_context();
        let mut cache = LayoutCache::new(8);
        let params = LayoutParams::default();
        let attrs = [Attribute::FontSize(20.0)];
        let set = AttributeSet::new(&attrs);
        let first = cache
            .get_utf8(&mut lcx, &mut fcx, &params, "hello", &set)
            .clone();
        let second = cache
            .get_utf8(&mut lcx, &mut fcx, &params, "hello", &set)
            .clone();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        cache.get_utf8(&mut lcx, &mut fcx, &params, "world", &set);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn compact_evicts_unused() {
        let mut lcx = LayoutContext::new();
        let mut fcx = font_context();
        let mut cache = LayoutCache::new(8);
        let params = LayoutParams::default();
        let set = AttributeSet::default();
        cache.get_utf8(&mut lcx, &mut fcx, &params, "a", &set);
        cache.get_utf8(&mut lcx, &mut fcx, &params, "b", &set);
        cache.compact();
        assert_eq!(cache.len(), 2);

        // Only "a" is used during this epoch.
        cache.get_utf8(&mut lcx, &mut fcx, &params, "a", &set);
        cache.compact();
        assert_eq!(cache.len(), 1);

        cache.compact();
        assert!(cache.is_empty());
    }

    #[test]
    fn max_entries_evicts_oldest() {
        let mut lcx = LayoutContext::new();
        let mut fcx = font_context();
        let mut cache = LayoutCache::new(2);
        let params = LayoutParams::default();
        let set = AttributeSet::default();
        cache.get_utf8(&mut lcx, &mut fcx, &params, "a", &set);
        cache.get_utf8(&mut lcx, &mut fcx, &params, "b", &set);
        cache.get_utf8(&mut lcx, &mut fcx, &params, "c", &set);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn key_follows_referenced_sets() {
        let mut lcx = LayoutContext::new();
        let mut fcx = font_context();
        let mut cache = LayoutCache::new(8);
        let mut collection = AttributeCollection::default();
        let big = [Attribute::FontSize(40.0)];
        let handle = collection.add("title", &AttributeSet::new(&big));
        let attrs = [Attribute::Reference(handle)];
        let set = AttributeSet::new(&attrs);
        let width = {
            let params = LayoutParams::default().with_collection(&collection);
            cache
                .get_utf8(&mut lcx, &mut fcx, &params, "x", &set)
                .bounds()
                .width()
        };
        let small = [Attribute::FontSize(10.0)];
        collection.add("title", &AttributeSet::new(&small));
        let params = LayoutParams::default().with_collection(&collection);
        let layout = cache.get_utf8(&mut lcx, &mut fcx, &params, "x", &set);
        assert!(layout.bounds().width() < width);
        assert_eq!(cache.len(), 2);
    }
}
