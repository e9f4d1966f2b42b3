// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph-observability
//!
//! Logging setup shared by the neurograph crates, with per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: rolling log files in timestamped run folders

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known neurograph crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurograph",
    "neurograph-schema",
    "neurograph-serialization",
    "neurograph-config",
];
