// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Field descriptors
//!
//! A [`FieldDescriptor`] is the runtime metadata of one record field: its name, what it
//! holds, its array shape, its selection flags and an accessor that projects a record
//! onto the field's [`Slot`].
//!
//! # Example
//! ```
//! use neurograph_schema::{Buffer, FieldDescriptor, FieldKind, ScalarKind};
//!
//! #[derive(Default)]
//! struct Dendrite {
//!     gain: f64,
//!     spines: Buffer<i32>,
//! }
//!
//! let gain = FieldDescriptor::values(
//!     "gain",
//!     |d: &Dendrite| &d.gain,
//!     |d: &mut Dendrite| &mut d.gain,
//! );
//! assert_eq!(gain.kind(), &FieldKind::Values(ScalarKind::Double));
//! assert_eq!(gain.repeat_count(), 1);
//!
//! let spines = FieldDescriptor::values(
//!     "spines",
//!     |d: &Dendrite| &d.spines,
//!     |d: &mut Dendrite| &mut d.spines,
//! )
//! .tag_target();
//! assert!(spines.is_pointer());
//! assert_eq!(spines.repeat_count(), 0);
//! ```

use crate::codec::{ScalarKind, TextKind};
use crate::slots::{
    Layout, PointeeKind, PointerSlot, RecordSlot, ReferenceSlot, Slot, SlotMut, TextSlot,
    ValueSlot,
};
use crate::Described;
use std::any::Any;
use std::fmt::{Debug, Formatter};

/// What a field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Values(ScalarKind),
    Text(TextKind),
    /// One nested record, a fixed array of them or a pool
    Records { type_name: &'static str },
    Pointers(PointeeKind),
    References(ReferenceMode),
}

/// How a reference field's target storage is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceMode {
    /// Into a tagged buffer or pool
    Direct,
    /// Into a pointee of a tagged pointer table
    Indirect,
}

/// Selection and tagging flags of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldFlags {
    /// Written by a full save
    pub persist: bool,
    /// Part of the simulation state
    pub state: bool,
    /// Part of the initial conditions
    pub init: bool,
    /// Excluded unless `init` is also set
    pub skip: bool,
    /// Registered in the tag table so references can name it
    pub tag_target: bool,
}

impl Default for FieldFlags {
    fn default() -> Self {
        Self {
            persist: true,
            state: false,
            init: false,
            skip: false,
            tag_target: false,
        }
    }
}

/// Projects a type-erased record onto one of its fields.
///
/// Returns `None` when the record is not of the type the accessor was built for.
pub trait FieldAccess: Send + Sync {
    fn slot<'a>(&self, record: &'a dyn Any) -> Option<Slot<'a>>;

    fn slot_mut<'a>(&self, record: &'a mut dyn Any) -> Option<SlotMut<'a>>;
}

macro_rules! projection {
    ($name:ident: $bound:ident => $variant:ident) => {
        struct $name<R, V> {
            get: fn(&R) -> &V,
            get_mut: fn(&mut R) -> &mut V,
        }

        impl<R: 'static, V: $bound + 'static> FieldAccess for $name<R, V> {
            fn slot<'a>(&self, record: &'a dyn Any) -> Option<Slot<'a>> {
                record
                    .downcast_ref::<R>()
                    .map(|record| Slot::$variant((self.get)(record)))
            }

            fn slot_mut<'a>(&self, record: &'a mut dyn Any) -> Option<SlotMut<'a>> {
                record
                    .downcast_mut::<R>()
                    .map(|record| SlotMut::$variant((self.get_mut)(record)))
            }
        }
    };
}

projection!(ValueProjection: ValueSlot => Values);
projection!(TextProjection: TextSlot => Text);
projection!(RecordProjection: Described => Record);
projection!(RecordsProjection: RecordSlot => Records);
projection!(PointerProjection: PointerSlot => Pointers);
projection!(ReferenceProjection: ReferenceSlot => References);

pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    layout: Layout,
    flags: FieldFlags,
    access: Box<dyn FieldAccess>,
}

impl FieldDescriptor {
    fn build(
        name: &str,
        kind: FieldKind,
        layout: Layout,
        access: Box<dyn FieldAccess>,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            layout,
            flags: FieldFlags::default(),
            access,
        }
    }

    //region Constructors

    /// A scalar, a fixed array of scalars (up to two dimensions) or a [`Buffer`](crate::Buffer).
    pub fn values<R: 'static, V: ValueSlot + 'static>(
        name: &str,
        get: fn(&R) -> &V,
        get_mut: fn(&mut R) -> &mut V,
    ) -> Self {
        Self::build(
            name,
            FieldKind::Values(V::scalar_kind()),
            V::layout(),
            Box::new(ValueProjection { get, get_mut }),
        )
    }

    /// A `String`, `Option<String>` or [`FixedString`](crate::FixedString).
    pub fn text<R: 'static, V: TextSlot + 'static>(
        name: &str,
        get: fn(&R) -> &V,
        get_mut: fn(&mut R) -> &mut V,
    ) -> Self {
        Self::build(
            name,
            FieldKind::Text(V::text_kind()),
            V::layout(),
            Box::new(TextProjection { get, get_mut }),
        )
    }

    /// A single nested record held by value.
    pub fn record<R: 'static, N: Described>(
        name: &str,
        get: fn(&R) -> &N,
        get_mut: fn(&mut R) -> &mut N,
    ) -> Self {
        Self::build(
            name,
            FieldKind::Records {
                type_name: N::TYPE_NAME,
            },
            Layout::single(),
            Box::new(RecordProjection { get, get_mut }),
        )
    }

    /// A fixed array of nested records or a [`Pool`](crate::Pool).
    pub fn records<R: 'static, V: RecordSlot + 'static>(
        name: &str,
        get: fn(&R) -> &V,
        get_mut: fn(&mut R) -> &mut V,
    ) -> Self {
        Self::build(
            name,
            FieldKind::Records {
                type_name: V::type_name(),
            },
            V::layout(),
            Box::new(RecordsProjection { get, get_mut }),
        )
    }

    /// A [`PointerTable`](crate::PointerTable) of buffers or pools.
    pub fn pointers<R: 'static, V: PointerSlot + 'static>(
        name: &str,
        get: fn(&R) -> &V,
        get_mut: fn(&mut R) -> &mut V,
    ) -> Self {
        Self::build(
            name,
            FieldKind::Pointers(V::pointee_kind()),
            Layout::growable(),
            Box::new(PointerProjection { get, get_mut }),
        )
    }

    /// One or more [`Link`](crate::Link)s into tagged storage.
    pub fn reference<R: 'static, V: ReferenceSlot + 'static>(
        name: &str,
        mode: ReferenceMode,
        get: fn(&R) -> &V,
        get_mut: fn(&mut R) -> &mut V,
    ) -> Self {
        Self::build(
            name,
            FieldKind::References(mode),
            V::layout(),
            Box::new(ReferenceProjection { get, get_mut }),
        )
    }

    //endregion

    //region Flags

    pub fn tag_target(mut self) -> Self {
        self.flags.tag_target = true;
        self
    }

    pub fn state(mut self) -> Self {
        self.flags.state = true;
        self
    }

    pub fn init(mut self) -> Self {
        self.flags.init = true;
        self
    }

    pub fn skip(mut self) -> Self {
        self.flags.skip = true;
        self
    }

    /// Not written by a full save.
    pub fn transient(mut self) -> Self {
        self.flags.persist = false;
        self
    }

    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    //endregion

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn flags(&self) -> &FieldFlags {
        &self.flags
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Fixed element count, 0 for growable storage.
    pub fn repeat_count(&self) -> usize {
        self.layout.repeat_count()
    }

    /// Array dimensions, innermost first.
    pub fn dimensions(&self) -> &[usize] {
        &self.layout.dimensions
    }

    pub fn is_pointer(&self) -> bool {
        self.layout.pointer
    }

    pub fn is_growable(&self) -> bool {
        self.layout.growable
    }

    pub fn is_textual(&self) -> bool {
        matches!(self.kind, FieldKind::Text(_))
    }

    pub fn is_direct_reference(&self) -> bool {
        self.kind == FieldKind::References(ReferenceMode::Direct)
    }

    pub fn is_indirect_reference(&self) -> bool {
        self.kind == FieldKind::References(ReferenceMode::Indirect)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FieldKind::References(_))
    }

    /// A single integer field, usable as the element count of a sibling.
    pub fn is_count_candidate(&self) -> bool {
        matches!(self.kind, FieldKind::Values(kind) if kind.is_integer())
            && !self.layout.pointer
            && self.layout.dimensions.is_empty()
    }

    /// Name of the record type this field nests, directly or behind a pointer table.
    pub fn nested_type_name(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::Records { type_name } => Some(type_name),
            FieldKind::Pointers(PointeeKind::Records(type_name)) => Some(type_name),
            _ => None,
        }
    }

    pub fn slot<'a>(&self, record: &'a dyn Any) -> Option<Slot<'a>> {
        self.access.slot(record)
    }

    pub fn slot_mut<'a>(&self, record: &'a mut dyn Any) -> Option<SlotMut<'a>> {
        self.access.slot_mut(record)
    }
}

impl Debug for FieldDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("layout", &self.layout)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
