// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph serialization
//!
//! Saves record graphs described by a [`TypeRegistry`](neurograph_schema::TypeRegistry)
//! to a line-oriented text format and loads them back, references included.
//!
//! ## Format
//! ```text
//! name_count 2          plain values: field name then the values
//! cells t0              tag marker: this storage is tag 0
//! cells 0               nested record 0 of `cells`, its lines follow
//! threshold 1.0e0
//!                       blank line closes the nested record
//! label 4               text: byte length, then the raw line
//! soma
//! rows n2               pointer table length, nulls included
//! rows 1 4 8            live pointee 1 of `rows` and its values
//!                       blank line closes the value section of the root
//! target d0 1           reference section: link into tag 0, element 1
//! ```
//!
//! ## Usage
//! ```ignore
//! let summary = save(&registry, "Network", &network, &mut file, SelectionMode::All)?;
//! let summary = load(&registry, reader, "Network", &mut network, false, LoadPolicy::Lenient)?;
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod error;
pub mod load;
pub mod range_index;
pub mod save;
pub mod tag_table;
pub mod text;

pub use error::{LoadError, LoadWarning, SaveError};
pub use load::{load, LoadPolicy, LoadSummary, Loader, DEFAULT_MAX_ELEMENTS};
pub use neurograph_schema::SelectionMode;
pub use range_index::{RangeEntry, RangeIndex, Resolution};
pub use save::{save, SaveSummary};
pub use tag_table::{TagEntry, TagTable};
