// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Growable storage with stable identity.
//!
//! Every growable field (a scalar [`Buffer`], a record [`Pool`] or a [`PointerTable`])
//! carries a [`StorageId`] handed out when it is created. References between records are
//! expressed as [`Link`]s, a storage id plus an element index, so the serializer can tell
//! which storage a reference points into without comparing addresses.
//!
//! Cloning a storage keeps its id: a clone is the same logical storage. Growing or
//! shrinking never changes the id. Equality compares contents only.

use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STORAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one growable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageId(u64);

impl StorageId {
    pub fn fresh() -> Self {
        StorageId(NEXT_STORAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Display for StorageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "storage#{}", self.0)
    }
}

/// A reference to one element of a growable storage.
///
/// # Example
/// ```
/// use neurograph_schema::{Buffer, Link};
///
/// let weights: Buffer<f64> = Buffer::from(vec![0.5, 0.25]);
/// let link = weights.link(1).unwrap();
/// assert_eq!(link, Link::new(weights.id(), 1));
/// assert_eq!(weights.resolve(&link), Some(&0.25));
/// assert!(weights.link(2).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub storage: StorageId,
    pub index: usize,
}

impl Link {
    pub fn new(storage: StorageId, index: usize) -> Self {
        Self { storage, index }
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.storage, self.index)
    }
}

/// Identity and current length of a growable storage.
pub trait Storage {
    fn storage_id(&self) -> StorageId;
    fn storage_len(&self) -> usize;
}

macro_rules! growable_storage {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name<T> {
            id: StorageId,
            items: Vec<T>,
        }

        impl<T> $name<T> {
            pub fn new() -> Self {
                Self {
                    id: StorageId::fresh(),
                    items: Vec::new(),
                }
            }

            pub fn id(&self) -> StorageId {
                self.id
            }

            pub fn push(&mut self, item: T) -> usize {
                self.items.push(item);
                self.items.len() - 1
            }

            pub fn truncate(&mut self, len: usize) {
                self.items.truncate(len);
            }

            pub fn clear(&mut self) {
                self.items.clear();
            }

            /// Link to element `index`, or `None` when out of range.
            pub fn link(&self, index: usize) -> Option<Link> {
                (index < self.items.len()).then(|| Link::new(self.id, index))
            }

            /// True when `link` points into this storage.
            pub fn owns(&self, link: &Link) -> bool {
                link.storage == self.id && link.index < self.items.len()
            }

            pub fn resolve(&self, link: &Link) -> Option<&T> {
                if link.storage != self.id {
                    return None;
                }
                self.items.get(link.index)
            }

            pub fn resolve_mut(&mut self, link: &Link) -> Option<&mut T> {
                if link.storage != self.id {
                    return None;
                }
                self.items.get_mut(link.index)
            }

            pub fn into_vec(self) -> Vec<T> {
                self.items
            }
        }

        impl<T: Default> $name<T> {
            /// Grows or shrinks to `len` elements; new elements are `Default`.
            pub fn resize(&mut self, len: usize) {
                self.items.resize_with(len, T::default);
            }

            pub fn with_len(len: usize) -> Self {
                let mut storage = Self::new();
                storage.resize(len);
                storage
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T> From<Vec<T>> for $name<T> {
            fn from(items: Vec<T>) -> Self {
                Self {
                    id: StorageId::fresh(),
                    items,
                }
            }
        }

        impl<T> FromIterator<T> for $name<T> {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                Self::from(iter.into_iter().collect::<Vec<_>>())
            }
        }

        impl<T> Deref for $name<T> {
            type Target = [T];

            fn deref(&self) -> &[T] {
                &self.items
            }
        }

        impl<T> DerefMut for $name<T> {
            fn deref_mut(&mut self) -> &mut [T] {
                &mut self.items
            }
        }

        impl<T: PartialEq> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.items == other.items
            }
        }

        impl<T> Storage for $name<T> {
            fn storage_id(&self) -> StorageId {
                self.id
            }

            fn storage_len(&self) -> usize {
                self.items.len()
            }
        }
    };
}

growable_storage!(
    /// Growable array of scalars (or of reference slots), the owned replacement for a
    /// pointer to a heap allocated array.
    Buffer
);

growable_storage!(
    /// Growable array of records.
    Pool
);

/// Growable array of nullable pointers, each to a [`Buffer`] or a [`Pool`].
///
/// Links into the pointees are "indirect": they name a pointee's storage, which the
/// serializer traces back to this table and the pointee's position in it.
///
/// # Example
/// ```
/// use neurograph_schema::{Buffer, PointerTable};
///
/// let mut table: PointerTable<Buffer<i32>> = PointerTable::with_len(3);
/// table.set(1, Some(Buffer::from(vec![7, 8])));
/// let link = table.get(1).unwrap().link(1).unwrap();
/// assert_eq!(table.locate(&link), Some(1));
/// assert_eq!(table.live_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PointerTable<P> {
    id: StorageId,
    pointers: Vec<Option<P>>,
}

impl<P> PointerTable<P> {
    pub fn new() -> Self {
        Self {
            id: StorageId::fresh(),
            pointers: Vec::new(),
        }
    }

    /// A table of `len` null pointers.
    pub fn with_len(len: usize) -> Self {
        let mut table = Self::new();
        table.resize(len);
        table
    }

    pub fn id(&self) -> StorageId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Grows with null pointers or drops trailing pointees.
    pub fn resize(&mut self, len: usize) {
        self.pointers.resize_with(len, || None);
    }

    pub fn get(&self, index: usize) -> Option<&P> {
        self.pointers.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut P> {
        self.pointers.get_mut(index).and_then(Option::as_mut)
    }

    /// Replaces the pointer at `index`. Returns false when `index` is out of range.
    pub fn set(&mut self, index: usize, pointee: Option<P>) -> bool {
        match self.pointers.get_mut(index) {
            Some(slot) => {
                *slot = pointee;
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, pointee: Option<P>) -> usize {
        self.pointers.push(pointee);
        self.pointers.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&P>> + '_ {
        self.pointers.iter().map(Option::as_ref)
    }

    pub fn live_count(&self) -> usize {
        self.pointers.iter().filter(|p| p.is_some()).count()
    }
}

impl<P: Storage> PointerTable<P> {
    /// Position of the pointee `link` points into.
    pub fn locate(&self, link: &Link) -> Option<usize> {
        self.pointers.iter().position(|p| {
            p.as_ref()
                .is_some_and(|p| p.storage_id() == link.storage && link.index < p.storage_len())
        })
    }
}

impl<P: Default> PointerTable<P> {
    /// Makes the pointer at `index` live, allocating an empty pointee if it was null.
    pub fn allocate(&mut self, index: usize) -> Option<&mut P> {
        self.pointers
            .get_mut(index)
            .map(|slot| slot.get_or_insert_with(P::default))
    }
}

impl<P> Default for PointerTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> From<Vec<Option<P>>> for PointerTable<P> {
    fn from(pointers: Vec<Option<P>>) -> Self {
        Self {
            id: StorageId::fresh(),
            pointers,
        }
    }
}

impl<P: PartialEq> PartialEq for PointerTable<P> {
    fn eq(&self, other: &Self) -> bool {
        self.pointers == other.pointers
    }
}

impl<P> Storage for PointerTable<P> {
    fn storage_id(&self) -> StorageId {
        self.id
    }

    fn storage_len(&self) -> usize {
        self.pointers.len()
    }
}
