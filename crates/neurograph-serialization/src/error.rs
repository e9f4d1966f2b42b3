// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_schema::{CodecError, Link, SchemaError, StorageId};
use thiserror::Error;

/// Fatal save errors. The partial output must be discarded.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Tagged storage {storage} is registered by both tag {first} and tag {second}")]
    OverlappingRanges {
        storage: StorageId,
        first: usize,
        second: usize,
    },

    #[error("Reference {link} in field '{field}' does not point into any tagged storage")]
    UnresolvedReference { field: String, link: Link },

    #[error(
        "Field {type_name}.{field} holds {actual} elements but its count field says {declared}"
    )]
    CountMismatch {
        type_name: String,
        field: String,
        declared: String,
        actual: usize,
    },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load errors. Nothing partial is reported; the root may be half rebuilt.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed document at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// A recoverable problem refused under the strict policy
    #[error("Rejected by strict load policy: {0}")]
    Rejected(LoadWarning),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Codec error at line {line}: {source}")]
    Codec {
        line: usize,
        #[source]
        source: CodecError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems the lenient policy recovers from. Every one is also logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    #[error("line {line}: unknown field '{field}' in record type '{type_name}', line ignored")]
    UnknownField {
        line: usize,
        type_name: String,
        field: String,
    },

    #[error("line {line}: index {index} of '{field}' is outside its {len} elements")]
    IndexOutOfRange {
        line: usize,
        field: String,
        index: usize,
        len: usize,
    },

    #[error(
        "line {line}: pointee {pointee} of '{field}' holds {len} elements, index {index} requested"
    )]
    PointeeTooSmall {
        line: usize,
        field: String,
        pointee: usize,
        index: usize,
        len: usize,
    },

    #[error("line {line}: pointee {pointee} of '{field}' is null, reference left empty")]
    NullPointee {
        line: usize,
        field: String,
        pointee: usize,
    },

    #[error("line {line}: '{field}' kept {kept} values and dropped {dropped}")]
    ExtraValues {
        line: usize,
        field: String,
        kept: usize,
        dropped: usize,
    },

    #[error("line {line}: text of '{field}' was truncated to fit")]
    TextTruncated { line: usize, field: String },

    #[error("line {line}: text of '{field}' declared {declared} bytes but holds {actual}")]
    TextLengthMismatch {
        line: usize,
        field: String,
        declared: usize,
        actual: usize,
    },
}

impl LoadWarning {
    pub fn line(&self) -> usize {
        match self {
            LoadWarning::UnknownField { line, .. }
            | LoadWarning::IndexOutOfRange { line, .. }
            | LoadWarning::PointeeTooSmall { line, .. }
            | LoadWarning::NullPointee { line, .. }
            | LoadWarning::ExtraValues { line, .. }
            | LoadWarning::TextTruncated { line, .. }
            | LoadWarning::TextLengthMismatch { line, .. } => *line,
        }
    }
}
