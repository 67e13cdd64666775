// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::attribute::{AttributeCollection, AttributeSet};
use crate::font::IconHandle;

/// Parameters of a layout build.
#[derive(Copy, Clone, Debug)]
pub struct LayoutParams<'a> {
    /// Collection used to resolve [`Attribute::Reference`](crate::attribute::Attribute::Reference).
    pub attribute_collection: Option<&'a AttributeCollection>,
    /// Width of the layout box, `0.0` for unconstrained.
    pub layout_width: f32,
    /// Height of the layout box, `0.0` for unconstrained.
    pub layout_height: f32,
    /// Paragraph level attributes, and the parent of every content run's attributes.
    pub layout_attributes: AttributeSet<'a>,
    /// Treat mandatory line breaks as regular break opportunities.
    pub ignore_must_line_breaks: bool,
    /// Counter value shown by counting list markers.
    pub list_marker_counter: u32,
}

impl Default for LayoutParams<'_> {
    fn default() -> Self {
        Self {
            attribute_collection: None,
            layout_width: 0.0,
            layout_height: 0.0,
            layout_attributes: AttributeSet::default(),
            ignore_must_line_breaks: false,
            list_marker_counter: 1,
        }
    }
}

impl<'a> LayoutParams<'a> {
    /// Parameters for a box of the given size.
    pub fn new(layout_width: f32, layout_height: f32) -> Self {
        Self {
            layout_width,
            layout_height,
            ..Self::default()
        }
    }

    /// Set the paragraph level attributes.
    pub fn with_attributes(mut self, attributes: AttributeSet<'a>) -> Self {
        self.layout_attributes = attributes;
        self
    }

    /// Set the attribute collection.
    pub fn with_collection(mut self, collection: &'a AttributeCollection) -> Self {
        self.attribute_collection = Some(collection);
        self
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum Content<'a> {
    Utf8(&'a str),
    Utf32(&'a [char]),
    Icon(IconHandle),
    Object { width: f32, height: f32 },
}

/// One fragment of layout input: text, an icon or an inline object.
#[derive(Copy, Clone, Debug)]
pub struct ContentRun<'a> {
    pub(crate) content: Content<'a>,
    /// Attributes of this fragment.
    pub attributes: AttributeSet<'a>,
    /// Caller supplied id, reported back on runs and content ranges.
    pub id: u64,
}

impl<'a> ContentRun<'a> {
    /// UTF-8 text.
    pub fn utf8(text: &'a str, attributes: AttributeSet<'a>) -> Self {
        Self {
            content: Content::Utf8(text),
            attributes,
            id: 0,
        }
    }

    /// UTF-32 text.
    pub fn utf32(text: &'a [char], attributes: AttributeSet<'a>) -> Self {
        Self {
            content: Content::Utf32(text),
            attributes,
            id: 0,
        }
    }

    /// An icon, scaled to the font size of `attributes`.
    pub fn icon(icon: IconHandle, attributes: AttributeSet<'a>) -> Self {
        Self {
            content: Content::Icon(icon),
            attributes,
            id: 0,
        }
    }

    /// An inline object of the given size.
    pub fn object(width: f32, height: f32, attributes: AttributeSet<'a>) -> Self {
        Self {
            content: Content::Object { width, height },
            attributes,
            id: 0,
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }
}
