// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use super::{Attribute, AttributeSet};

/// Handle of a named attribute set in an [`AttributeCollection`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeSetHandle(u32);

impl AttributeSetHandle {
    /// Index of the set within its collection.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry {
    name: Arc<str>,
    group: Option<Arc<str>>,
    attributes: Vec<Attribute>,
}

/// Named, optionally grouped attribute sets.
///
/// Sets are stored flattened. Registering a name that already exists replaces the set
/// and keeps its handle, so layouts referring to it pick up the change when rebuilt.
#[derive(Clone, Debug, Default)]
pub struct AttributeCollection {
    entries: Vec<Entry>,
    by_name: HashMap<Arc<str>, AttributeSetHandle>,
}

impl AttributeCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `attributes` under `name`.
    pub fn add(&mut self, name: &str, attributes: &AttributeSet<'_>) -> AttributeSetHandle {
        self.insert(name, None, attributes.copy_flat())
    }

    /// Register `attributes` under `name` as part of `group`.
    ///
    /// Sets in the same group are mutually exclusive when applied by the editor, e.g.
    /// only one paragraph style can be active at a time.
    pub fn add_to_group(
        &mut self,
        name: &str,
        group: &str,
        attributes: &AttributeSet<'_>,
    ) -> AttributeSetHandle {
        self.insert(name, Some(group.into()), attributes.copy_flat())
    }

    fn insert(
        &mut self,
        name: &str,
        group: Option<Arc<str>>,
        attributes: Vec<Attribute>,
    ) -> AttributeSetHandle {
        if let Some(&handle) = self.by_name.get(name) {
            let entry = &mut self.entries[handle.index()];
            entry.group = group;
            entry.attributes = attributes;
            return handle;
        }
        let index = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        let handle = AttributeSetHandle(index);
        let name: Arc<str> = name.into();
        self.entries.push(Entry {
            name: name.clone(),
            group,
            attributes,
        });
        self.by_name.insert(name, handle);
        log::debug!("registered attribute set {handle:?}");
        handle
    }

    /// Look up a set by name.
    pub fn find_by_name(&self, name: &str) -> Option<AttributeSetHandle> {
        self.by_name.get(name).copied()
    }

    /// The attributes of the set identified by `handle`.
    pub fn get(&self, handle: AttributeSetHandle) -> Option<AttributeSet<'_>> {
        self.items(handle).map(AttributeSet::new)
    }

    pub(crate) fn items(&self, handle: AttributeSetHandle) -> Option<&[Attribute]> {
        self.entries
            .get(handle.index())
            .map(|entry| entry.attributes.as_slice())
    }

    /// The name of the set identified by `handle`.
    pub fn name(&self, handle: AttributeSetHandle) -> Option<&str> {
        self.entries.get(handle.index()).map(|e| e.name.as_ref())
    }

    /// The group of the set identified by `handle`.
    pub fn group(&self, handle: AttributeSetHandle) -> Option<&str> {
        self.entries
            .get(handle.index())
            .and_then(|e| e.group.as_deref())
    }

    /// Returns `true` if `a` and `b` are the same set or belong to the same group.
    pub fn same_group(&self, a: AttributeSetHandle, b: AttributeSetHandle) -> bool {
        if a == b {
            return true;
        }
        match (self.group(a), self.group(b)) {
            (Some(ga), Some(gb)) => ga == gb,
            _ => false,
        }
    }

    /// Number of registered sets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no set is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all handles in registration order.
    pub fn handles(&self) -> impl Iterator<Item = AttributeSetHandle> + '_ {
        (0..self.entries.len()).filter_map(|ix| u32::try_from(ix).ok().map(AttributeSetHandle))
    }
}
