// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Range index
//!
//! Answers "which tag owns the element this link points at" during the reference pass.
//! Built once from the tag table after the value pass: one direct entry per non-empty
//! tagged buffer or pool, one indirect entry per live non-empty pointee of a tagged
//! pointer table. Both sets are sorted by storage id and searched by bisection.

use crate::tag_table::TagTable;
use crate::SaveError;
use neurograph_schema::{Link, ReferenceMode, StorageId, StorageView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEntry {
    pub storage: StorageId,
    pub first: usize,
    pub last: usize,
    pub tag: usize,
    /// Position of the pointee in its table, for indirect entries
    pub pointee: Option<usize>,
}

/// Where a link lands, in the terms written to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub tag: usize,
    pub element: usize,
    pub pointee: Option<usize>,
}

#[derive(Debug, Default)]
pub struct RangeIndex {
    direct: Vec<RangeEntry>,
    indirect: Vec<RangeEntry>,
}

impl RangeIndex {
    pub fn build(tags: &TagTable) -> Result<Self, SaveError> {
        let mut direct = Vec::new();
        let mut indirect = Vec::new();

        for (tag, entry) in tags.iter() {
            match &entry.view {
                StorageView::Direct { id, len } if *len > 0 => direct.push(RangeEntry {
                    storage: *id,
                    first: 0,
                    last: len - 1,
                    tag,
                    pointee: None,
                }),
                StorageView::Direct { .. } => {}
                StorageView::Table { pointees, .. } => {
                    for (position, pointee) in pointees.iter().enumerate() {
                        if let Some((id, len)) = *pointee {
                            if len > 0 {
                                indirect.push(RangeEntry {
                                    storage: id,
                                    first: 0,
                                    last: len - 1,
                                    tag,
                                    pointee: Some(position),
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(Self {
            direct: sorted(direct)?,
            indirect: sorted(indirect)?,
        })
    }

    /// Locates `link` in the set selected by `mode`. `None` when no tagged storage holds it.
    pub fn resolve(&self, link: &Link, mode: ReferenceMode) -> Option<Resolution> {
        let entries = match mode {
            ReferenceMode::Direct => &self.direct,
            ReferenceMode::Indirect => &self.indirect,
        };
        let position = entries
            .binary_search_by_key(&link.storage, |entry| entry.storage)
            .ok()?;
        let entry = &entries[position];
        (entry.first..=entry.last)
            .contains(&link.index)
            .then(|| Resolution {
                tag: entry.tag,
                element: link.index - entry.first,
                pointee: entry.pointee,
            })
    }

    pub fn direct_entries(&self) -> &[RangeEntry] {
        &self.direct
    }

    pub fn indirect_entries(&self) -> &[RangeEntry] {
        &self.indirect
    }
}

fn sorted(mut entries: Vec<RangeEntry>) -> Result<Vec<RangeEntry>, SaveError> {
    entries.sort_by_key(|entry| entry.storage);
    // keys strictly increase; an equal key is one storage registered twice
    if let Some(pair) = entries.windows(2).find(|pair| pair[0].storage >= pair[1].storage) {
        return Err(SaveError::OverlappingRanges {
            storage: pair[1].storage,
            first: pair[0].tag,
            second: pair[1].tag,
        });
    }
    Ok(entries)
}
