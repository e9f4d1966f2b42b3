// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::codec::ScalarKind;
use thiserror::Error;

/// Errors raised while describing or looking up record metadata.
///
/// # Examples
/// ```
/// use neurograph_schema::SchemaError;
///
/// let err = SchemaError::UnknownType("Synapse".into());
/// assert_eq!(err.to_string(), "Unknown record type 'Synapse'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Unknown record type '{0}'")]
    UnknownType(String),

    #[error("Unknown field '{field}' in record type '{type_name}'")]
    UnknownField { type_name: String, field: String },

    #[error("Record type '{0}' is already registered")]
    DuplicateType(String),

    #[error("Invalid descriptor {type_name}.{field}: {reason}")]
    InvalidDescriptor {
        type_name: String,
        field: String,
        reason: String,
    },

    /// The record handed to the registry is not an instance of the named type
    #[error("Record is not an instance of '{0}'")]
    TypeMismatch(String),
}

/// Errors raised by the value codec when text cannot be converted back into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Cannot parse '{text}' as {kind}: {reason}")]
    InvalidValue {
        kind: ScalarKind,
        text: String,
        reason: String,
    },

    #[error("Invalid text length '{0}'")]
    InvalidLength(String),

    #[error("Text contains a line break and cannot be written as a single line")]
    MultilineText,
}
