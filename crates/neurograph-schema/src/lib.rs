// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph schema
//!
//! Runtime metadata for serializable record graphs:
//! - **Value codec**: scalar and text conversion to and from single text tokens
//! - **Storage**: growable [`Buffer`]s, [`Pool`]s and [`PointerTable`]s with stable
//!   [`StorageId`]s, and the [`Link`]s that reference into them
//! - **Descriptors**: per-field metadata with typed accessors ([`FieldDescriptor`])
//! - **Registry**: [`Described`] record types collected into a [`SchemaRegistry`]
//!
//! The serializer crates work exclusively through the [`TypeRegistry`] trait and the
//! slot views in [`slots`]; they never name a concrete record type.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod codec;
pub mod descriptor;
mod error;
pub mod registry;
pub mod selection;
pub mod slots;
pub mod storage;

pub use codec::{FixedString, Scalar, ScalarKind, TextKind};
pub use descriptor::{FieldAccess, FieldDescriptor, FieldFlags, FieldKind, ReferenceMode};
pub use error::{CodecError, SchemaError};
pub use registry::{Described, SchemaRegistry, TypeDescriptor, TypeRegistry, COUNT_SUFFIX};
pub use selection::SelectionMode;
pub use slots::{
    Layout, PointeeKind, PointerSlot, RecordSlot, ReferenceSlot, Slot, SlotMut, StorageView,
    TextSlot, ValueSlot,
};
pub use storage::{Buffer, Link, PointerTable, Pool, Storage, StorageId};
