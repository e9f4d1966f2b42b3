// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph
//!
//! Schema-driven persistence for graphs of neural network records. Types describe
//! their fields once; the engine saves any registered root to a line-oriented text
//! document and loads it back, links between records included.
//!
//! ## Feature Flags
//! - **`config`** (default): `neurograph.toml` loading with env/CLI overrides
//! - **`observability`** (default): logging initialization and debug flags
//! - **`file-logging`**: rolling log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neurograph::prelude::*;
//!
//! #[derive(Default)]
//! struct Neuron {
//!     potential: f32,
//! }
//!
//! impl Described for Neuron {
//!     const TYPE_NAME: &'static str = "Neuron";
//!     fn describe() -> Vec<FieldDescriptor> {
//!         vec![FieldDescriptor::values(
//!             "potential",
//!             |n: &Neuron| &n.potential,
//!             |n: &mut Neuron| &mut n.potential,
//!         )]
//!     }
//! }
//!
//! let registry = SchemaRegistry::new().with::<Neuron>().unwrap();
//! let header = DocumentHeader::default();
//! let neuron = Neuron { potential: -70.0 };
//! let path = "neuron.txt";
//! save_model_file(&registry, "Neuron", &neuron, path, &header, SelectionMode::All).unwrap();
//!
//! let mut restored = Neuron::default();
//! load_model_file(
//!     &registry,
//!     path,
//!     "Neuron",
//!     &mut restored,
//!     false,
//!     &header,
//!     LoadPolicy::Lenient,
//! )
//! .unwrap();
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod document;

pub use neurograph_schema as schema;
pub use neurograph_serialization as serialization;

#[cfg(feature = "config")]
pub use neurograph_config as config;

#[cfg(feature = "observability")]
pub use neurograph_observability as observability;

pub use document::{
    load_model_file, read_model, save_model_file, write_model, DocumentError, DocumentHeader,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::document::{
        load_model_file, read_model, save_model_file, write_model, DocumentError, DocumentHeader,
    };
    pub use crate::schema::{
        Buffer, Described, FieldDescriptor, FixedString, Link, PointerTable, Pool, ReferenceMode,
        SchemaRegistry, SelectionMode, TypeRegistry,
    };
    pub use crate::serialization::{
        load, save, LoadError, LoadPolicy, LoadSummary, LoadWarning, SaveError, SaveSummary,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{load_config, NeurographConfig};

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags, LoggingConfig};
}

/// Translates the `[logging]` table of a configuration file into observability settings.
///
/// Unknown formats fall back to the default; a `file_path` switches output to files
/// under that directory.
#[cfg(all(feature = "config", feature = "observability"))]
pub fn logging_config(config: &config::NeurographConfig) -> observability::LoggingConfig {
    let section = &config.logging;
    observability::LoggingConfig {
        level: section.level.clone(),
        format: section.format.parse().unwrap_or_default(),
        output: match &section.file_path {
            Some(dir) => observability::LogOutput::File(dir.clone()),
            None => observability::LogOutput::Stdout,
        },
        ..observability::LoggingConfig::default()
    }
}
