// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tag table
//!
//! Maps the dense tag numbers written as `t<N>` markers to the storage they name. A save
//! appends one entry per visited tag-target field; a load assigns entries by the number
//! read from the document and keeps them current while it grows the storage.

use neurograph_schema::StorageView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Name of the field that registered the storage
    pub field: String,
    pub view: StorageView,
}

#[derive(Debug, Default)]
pub struct TagTable {
    entries: Vec<Option<TagEntry>>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its tag.
    pub fn register(&mut self, field: &str, view: StorageView) -> usize {
        self.entries.push(Some(TagEntry {
            field: field.to_string(),
            view,
        }));
        self.entries.len() - 1
    }

    /// Stores an entry under `tag`, growing the table as needed.
    pub fn assign(&mut self, tag: usize, field: &str, view: StorageView) {
        if tag >= self.entries.len() {
            self.entries.resize_with(tag + 1, || None);
        }
        self.entries[tag] = Some(TagEntry {
            field: field.to_string(),
            view,
        });
    }

    /// Replaces the storage view of an existing entry.
    pub fn refresh(&mut self, tag: usize, view: StorageView) {
        if let Some(Some(entry)) = self.entries.get_mut(tag) {
            entry.view = view;
        }
    }

    pub fn get(&self, tag: usize) -> Option<&TagEntry> {
        self.entries.get(tag).and_then(Option::as_ref)
    }

    /// Number of tag slots, assigned or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigned entries in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TagEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(tag, entry)| entry.as_ref().map(|entry| (tag, entry)))
    }
}

/// Parses a `<prefix><number>` marker such as `t3`, `d0` or `i12`.
pub fn parse_marker(token: &str, prefix: char) -> Option<usize> {
    let digits = token.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
