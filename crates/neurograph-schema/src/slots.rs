// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Type-erased views of a single field.
//!
//! A field accessor hands the serializer a [`Slot`] (or [`SlotMut`]): a trait object
//! exposing just enough of the field to write and rebuild it. Each slot family also
//! reports its static [`Layout`], read once when the descriptor is built.

use crate::codec::{Scalar, ScalarKind, TextKind};
use crate::storage::{Buffer, Link, PointerTable, Pool, StorageId};
use crate::{CodecError, Described, FixedString};
use std::any::Any;

/// Static shape of a field type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    /// The field owns heap storage (or holds references) rather than inline values
    pub pointer: bool,
    /// The element count is a runtime property of the value
    pub growable: bool,
    /// Fixed array dimensions, innermost first. Empty for single values and growable storage.
    pub dimensions: Vec<usize>,
}

impl Layout {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn array(dimensions: Vec<usize>) -> Self {
        Self {
            pointer: false,
            growable: false,
            dimensions,
        }
    }

    pub fn growable() -> Self {
        Self {
            pointer: true,
            growable: true,
            dimensions: Vec::new(),
        }
    }

    /// Number of elements of a fixed field, 0 for growable storage.
    pub fn repeat_count(&self) -> usize {
        if self.growable {
            0
        } else {
            self.dimensions.iter().product()
        }
    }
}

/// What the pointers of a pointer table point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointeeKind {
    Values(ScalarKind),
    Records(&'static str),
}

/// Identity and extent of a growable storage, as captured for the tag table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageView {
    /// A buffer or pool: `len` elements addressed directly
    Direct { id: StorageId, len: usize },
    /// A pointer table: its own `len` pointers plus, per pointer, the pointee's id and length
    Table {
        id: StorageId,
        len: usize,
        pointees: Vec<Option<(StorageId, usize)>>,
    },
}

impl StorageView {
    pub fn id(&self) -> StorageId {
        match self {
            StorageView::Direct { id, .. } | StorageView::Table { id, .. } => *id,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StorageView::Direct { len, .. } | StorageView::Table { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//region Slot traits

/// Scalars, fixed arrays and scalar buffers.
pub trait ValueSlot {
    fn layout() -> Layout
    where
        Self: Sized;

    fn scalar_kind() -> ScalarKind
    where
        Self: Sized;

    fn kind(&self) -> ScalarKind;

    /// Elements currently held, row-major for multi-dimensional arrays
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn encode(&self, index: usize) -> Option<String>;

    /// Decodes `text` into element `index`. `Ok(false)` when the index is out of range.
    fn decode(&mut self, index: usize, text: &str) -> Result<bool, CodecError>;

    /// The value read as an element count, for single integer fields.
    fn as_count(&self) -> Option<usize> {
        None
    }

    /// Changes the element count. False when the slot has a fixed size.
    fn resize(&mut self, _len: usize) -> bool {
        false
    }

    fn storage(&self) -> Option<StorageId> {
        None
    }
}

/// Fixed and heap strings.
pub trait TextSlot {
    fn layout() -> Layout
    where
        Self: Sized;

    fn text_kind() -> TextKind
    where
        Self: Sized;

    fn text(&self) -> Option<&str>;

    /// Stores `text`. False when the value could not be kept verbatim (truncated, or null
    /// into a non-nullable string).
    fn set_text(&mut self, text: Option<&str>) -> bool;
}

/// Fixed arrays of records and record pools.
pub trait RecordSlot {
    fn layout() -> Layout
    where
        Self: Sized;

    fn type_name() -> &'static str
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, index: usize) -> Option<&dyn Any>;

    fn record_mut(&mut self, index: usize) -> Option<&mut dyn Any>;

    fn resize(&mut self, _len: usize) -> bool {
        false
    }

    fn storage(&self) -> Option<StorageId> {
        None
    }
}

/// Tables of pointers to buffers or pools.
pub trait PointerSlot {
    fn pointee_kind() -> PointeeKind
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn storage(&self) -> StorageId;

    /// The pointee at `index`, `None` when null or out of range
    fn pointee(&self, index: usize) -> Option<Slot<'_>>;

    fn pointee_mut(&mut self, index: usize) -> Option<SlotMut<'_>>;

    /// Makes the pointer at `index` live. False when `index` is out of range.
    fn allocate(&mut self, index: usize) -> bool;

    fn resize(&mut self, len: usize);
}

/// One or more reference slots.
pub trait ReferenceSlot {
    fn layout() -> Layout
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_link(&self, index: usize) -> Option<Link>;

    /// False when `index` is out of range.
    fn set_link(&mut self, index: usize, link: Option<Link>) -> bool;

    fn resize(&mut self, _len: usize) -> bool {
        false
    }

    fn storage(&self) -> Option<StorageId> {
        None
    }
}

//endregion

//region Slot enums

/// Shared view of one field of one record.
pub enum Slot<'a> {
    Values(&'a dyn ValueSlot),
    Text(&'a dyn TextSlot),
    /// A single nested record held by value
    Record(&'a dyn Any),
    Records(&'a dyn RecordSlot),
    Pointers(&'a dyn PointerSlot),
    References(&'a dyn ReferenceSlot),
}

/// Mutable view of one field of one record.
pub enum SlotMut<'a> {
    Values(&'a mut dyn ValueSlot),
    Text(&'a mut dyn TextSlot),
    Record(&'a mut dyn Any),
    Records(&'a mut dyn RecordSlot),
    Pointers(&'a mut dyn PointerSlot),
    References(&'a mut dyn ReferenceSlot),
}

impl<'a> Slot<'a> {
    /// Identity of the storage behind this slot, if it is growable storage.
    pub fn storage_view(&self) -> Option<StorageView> {
        let direct =
            |id: Option<StorageId>, len: usize| id.map(|id| StorageView::Direct { id, len });
        match self {
            Slot::Values(slot) => direct(slot.storage(), slot.len()),
            Slot::Records(slot) => direct(slot.storage(), slot.len()),
            Slot::References(slot) => direct(slot.storage(), slot.len()),
            Slot::Pointers(table) => {
                let pointees = (0..table.len())
                    .map(|index| {
                        table
                            .pointee(index)
                            .and_then(|pointee| pointee.storage_view())
                            .map(|view| (view.id(), view.len()))
                    })
                    .collect();
                Some(StorageView::Table {
                    id: table.storage(),
                    len: table.len(),
                    pointees,
                })
            }
            Slot::Text(_) | Slot::Record(_) => None,
        }
    }
}

impl<'a> SlotMut<'a> {
    pub fn reborrow(&self) -> Slot<'_> {
        match self {
            SlotMut::Values(slot) => Slot::Values(&**slot),
            SlotMut::Text(slot) => Slot::Text(&**slot),
            SlotMut::Record(record) => Slot::Record(&**record),
            SlotMut::Records(slot) => Slot::Records(&**slot),
            SlotMut::Pointers(slot) => Slot::Pointers(&**slot),
            SlotMut::References(slot) => Slot::References(&**slot),
        }
    }
}

//endregion

//region Value slots

macro_rules! impl_value_slots {
    ($($ty:ty),* $(,)?) => {$(
        impl ValueSlot for $ty {
            fn layout() -> Layout {
                Layout::single()
            }

            fn scalar_kind() -> ScalarKind {
                <$ty as Scalar>::KIND
            }

            fn kind(&self) -> ScalarKind {
                <$ty as Scalar>::KIND
            }

            fn len(&self) -> usize {
                1
            }

            fn encode(&self, index: usize) -> Option<String> {
                (index == 0).then(|| Scalar::to_text(self))
            }

            fn decode(&mut self, index: usize, text: &str) -> Result<bool, CodecError> {
                if index != 0 {
                    return Ok(false);
                }
                *self = <$ty as Scalar>::from_text(text)?;
                Ok(true)
            }

            fn as_count(&self) -> Option<usize> {
                Scalar::to_count(self)
            }
        }

        impl<const N: usize> ValueSlot for [$ty; N] {
            fn layout() -> Layout {
                Layout::array(vec![N])
            }

            fn scalar_kind() -> ScalarKind {
                <$ty as Scalar>::KIND
            }

            fn kind(&self) -> ScalarKind {
                <$ty as Scalar>::KIND
            }

            fn len(&self) -> usize {
                N
            }

            fn encode(&self, index: usize) -> Option<String> {
                self.as_slice().get(index).map(Scalar::to_text)
            }

            fn decode(&mut self, index: usize, text: &str) -> Result<bool, CodecError> {
                match self.as_mut_slice().get_mut(index) {
                    Some(element) => {
                        *element = <$ty as Scalar>::from_text(text)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }

        impl<const N: usize, const M: usize> ValueSlot for [[$ty; N]; M] {
            fn layout() -> Layout {
                Layout::array(vec![N, M])
            }

            fn scalar_kind() -> ScalarKind {
                <$ty as Scalar>::KIND
            }

            fn kind(&self) -> ScalarKind {
                <$ty as Scalar>::KIND
            }

            fn len(&self) -> usize {
                N * M
            }

            fn encode(&self, index: usize) -> Option<String> {
                if N == 0 {
                    return None;
                }
                self.as_slice()
                    .get(index / N)
                    .and_then(|row| row.get(index % N))
                    .map(Scalar::to_text)
            }

            fn decode(&mut self, index: usize, text: &str) -> Result<bool, CodecError> {
                if N == 0 {
                    return Ok(false);
                }
                match self
                    .as_mut_slice()
                    .get_mut(index / N)
                    .and_then(|row| row.get_mut(index % N))
                {
                    Some(element) => {
                        *element = <$ty as Scalar>::from_text(text)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    )*};
}

impl_value_slots!(i8, i16, i32, i64, f32, f64);

impl<T: Scalar> ValueSlot for Buffer<T> {
    fn layout() -> Layout {
        Layout::growable()
    }

    fn scalar_kind() -> ScalarKind {
        T::KIND
    }

    fn kind(&self) -> ScalarKind {
        T::KIND
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn encode(&self, index: usize) -> Option<String> {
        (**self).get(index).map(Scalar::to_text)
    }

    fn decode(&mut self, index: usize, text: &str) -> Result<bool, CodecError> {
        match (**self).get_mut(index) {
            Some(element) => {
                *element = T::from_text(text)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn resize(&mut self, len: usize) -> bool {
        Buffer::resize(self, len);
        true
    }

    fn storage(&self) -> Option<StorageId> {
        Some(self.id())
    }
}

//endregion

//region Text slots

impl TextSlot for String {
    fn layout() -> Layout {
        Layout {
            pointer: true,
            ..Layout::single()
        }
    }

    fn text_kind() -> TextKind {
        TextKind::Heap
    }

    fn text(&self) -> Option<&str> {
        Some(self.as_str())
    }

    fn set_text(&mut self, text: Option<&str>) -> bool {
        self.clear();
        match text {
            Some(text) => {
                self.push_str(text);
                true
            }
            None => false,
        }
    }
}

impl TextSlot for Option<String> {
    fn layout() -> Layout {
        Layout {
            pointer: true,
            ..Layout::single()
        }
    }

    fn text_kind() -> TextKind {
        TextKind::Heap
    }

    fn text(&self) -> Option<&str> {
        self.as_deref()
    }

    fn set_text(&mut self, text: Option<&str>) -> bool {
        *self = text.map(str::to_string);
        true
    }
}

impl<const N: usize> TextSlot for FixedString<N> {
    fn layout() -> Layout {
        Layout::single()
    }

    fn text_kind() -> TextKind {
        TextKind::Fixed { capacity: N }
    }

    fn text(&self) -> Option<&str> {
        Some(self.as_str())
    }

    fn set_text(&mut self, text: Option<&str>) -> bool {
        match text {
            Some(text) => self.set(text),
            None => {
                self.set("");
                false
            }
        }
    }
}

//endregion

//region Record slots

impl<R: Described, const N: usize> RecordSlot for [R; N] {
    fn layout() -> Layout {
        Layout::array(vec![N])
    }

    fn type_name() -> &'static str {
        R::TYPE_NAME
    }

    fn len(&self) -> usize {
        N
    }

    fn record(&self, index: usize) -> Option<&dyn Any> {
        self.as_slice().get(index).map(|r| r as &dyn Any)
    }

    fn record_mut(&mut self, index: usize) -> Option<&mut dyn Any> {
        self.as_mut_slice().get_mut(index).map(|r| r as &mut dyn Any)
    }
}

impl<R: Described> RecordSlot for Pool<R> {
    fn layout() -> Layout {
        Layout::growable()
    }

    fn type_name() -> &'static str {
        R::TYPE_NAME
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn record(&self, index: usize) -> Option<&dyn Any> {
        (**self).get(index).map(|r| r as &dyn Any)
    }

    fn record_mut(&mut self, index: usize) -> Option<&mut dyn Any> {
        (**self).get_mut(index).map(|r| r as &mut dyn Any)
    }

    fn resize(&mut self, len: usize) -> bool {
        Pool::resize(self, len);
        true
    }

    fn storage(&self) -> Option<StorageId> {
        Some(self.id())
    }
}

//endregion

//region Pointer slots

impl<T: Scalar> PointerSlot for PointerTable<Buffer<T>> {
    fn pointee_kind() -> PointeeKind {
        PointeeKind::Values(T::KIND)
    }

    fn len(&self) -> usize {
        PointerTable::len(self)
    }

    fn storage(&self) -> StorageId {
        self.id()
    }

    fn pointee(&self, index: usize) -> Option<Slot<'_>> {
        self.get(index).map(|buffer| Slot::Values(buffer))
    }

    fn pointee_mut(&mut self, index: usize) -> Option<SlotMut<'_>> {
        self.get_mut(index).map(|buffer| SlotMut::Values(buffer))
    }

    fn allocate(&mut self, index: usize) -> bool {
        PointerTable::allocate(self, index).is_some()
    }

    fn resize(&mut self, len: usize) {
        PointerTable::resize(self, len);
    }
}

impl<R: Described> PointerSlot for PointerTable<Pool<R>> {
    fn pointee_kind() -> PointeeKind {
        PointeeKind::Records(R::TYPE_NAME)
    }

    fn len(&self) -> usize {
        PointerTable::len(self)
    }

    fn storage(&self) -> StorageId {
        self.id()
    }

    fn pointee(&self, index: usize) -> Option<Slot<'_>> {
        self.get(index).map(|pool| Slot::Records(pool))
    }

    fn pointee_mut(&mut self, index: usize) -> Option<SlotMut<'_>> {
        self.get_mut(index).map(|pool| SlotMut::Records(pool))
    }

    fn allocate(&mut self, index: usize) -> bool {
        PointerTable::allocate(self, index).is_some()
    }

    fn resize(&mut self, len: usize) {
        PointerTable::resize(self, len);
    }
}

//endregion

//region Reference slots

impl ReferenceSlot for Option<Link> {
    fn layout() -> Layout {
        Layout {
            pointer: true,
            ..Layout::single()
        }
    }

    fn len(&self) -> usize {
        1
    }

    fn get_link(&self, index: usize) -> Option<Link> {
        if index == 0 {
            *self
        } else {
            None
        }
    }

    fn set_link(&mut self, index: usize, link: Option<Link>) -> bool {
        if index != 0 {
            return false;
        }
        *self = link;
        true
    }
}

impl<const N: usize> ReferenceSlot for [Option<Link>; N] {
    fn layout() -> Layout {
        Layout {
            pointer: true,
            ..Layout::array(vec![N])
        }
    }

    fn len(&self) -> usize {
        N
    }

    fn get_link(&self, index: usize) -> Option<Link> {
        self.as_slice().get(index).copied().flatten()
    }

    fn set_link(&mut self, index: usize, link: Option<Link>) -> bool {
        match self.as_mut_slice().get_mut(index) {
            Some(slot) => {
                *slot = link;
                true
            }
            None => false,
        }
    }
}

impl ReferenceSlot for Buffer<Option<Link>> {
    fn layout() -> Layout {
        Layout::growable()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get_link(&self, index: usize) -> Option<Link> {
        (**self).get(index).copied().flatten()
    }

    fn set_link(&mut self, index: usize, link: Option<Link>) -> bool {
        match (**self).get_mut(index) {
            Some(slot) => {
                *slot = link;
                true
            }
            None => false,
        }
    }

    fn resize(&mut self, len: usize) -> bool {
        Buffer::resize(self, len);
        true
    }

    fn storage(&self) -> Option<StorageId> {
        Some(self.id())
    }
}

//endregion


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_row_major() {
        let mut grid = [[0i32; 3]; 2];
        assert_eq!(<[[i32; 3]; 2] as ValueSlot>::layout().dimensions, vec![3, 2]);
        assert!(grid.decode(4, "9").unwrap());
        assert_eq!(grid[1][1], 9);
        assert!(!grid.decode(6, "1").unwrap());
        assert_eq!(grid.encode(4).as_deref(), Some("9"));
    }

    #[test]
    fn test_single_value_as_count() {
        let count = 12i32;
        assert_eq!(ValueSlot::as_count(&count), Some(12));
        let ratio = 0.5f64;
        assert_eq!(ValueSlot::as_count(&ratio), None);
    }

    #[test]
    fn test_buffer_slot_resize_keeps_id() {
        let mut buffer: Buffer<i16> = Buffer::from(vec![1, 2]);
        let id = buffer.id();
        assert!(ValueSlot::resize(&mut buffer, 4));
        assert_eq!(ValueSlot::len(&buffer), 4);
        assert_eq!(ValueSlot::storage(&buffer), Some(id));
    }

    #[test]
    fn test_pointer_table_view_lists_pointees() {
        let mut table: PointerTable<Buffer<f32>> = PointerTable::with_len(3);
        table.set(2, Some(Buffer::from(vec![1.0, 2.0])));
        let pointee_id = table.get(2).unwrap().id();
        let view = Slot::Pointers(&table).storage_view().unwrap();
        assert_eq!(
            view,
            StorageView::Table {
                id: table.id(),
                len: 3,
                pointees: vec![None, None, Some((pointee_id, 2))],
            }
        );
    }

    #[test]
    fn test_null_into_heap_string() {
        let mut name: Option<String> = Some("soma".into());
        assert!(name.set_text(None));
        assert_eq!(name, None);

        let mut plain = String::from("soma");
        assert!(!plain.set_text(None));
        assert_eq!(plain, "");
    }
}
