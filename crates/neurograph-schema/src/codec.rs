// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Value codec
//!
//! Converts single scalar values and strings to their text representation and back.
//! The codec only sees one element at a time and knows nothing about the record that
//! owns it.
//!
//! Floating point values are written with enough significant digits to re-parse to the
//! identical bit pattern (17 for `f64`, 9 for `f32`).

use crate::CodecError;
use std::fmt::{Display, Formatter};

/// Scalar element kinds understood by the codec.
///
/// | kind | Rust type |
/// |---|---|
/// | `Char` | `i8` |
/// | `Short` | `i16` |
/// | `Int` | `i32` |
/// | `Long` | `i64` |
/// | `Float` | `f32` |
/// | `Double` | `f64` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl ScalarKind {
    /// True for the integer kinds, the only kinds usable as `_count` fields.
    pub fn is_integer(&self) -> bool {
        !matches!(self, ScalarKind::Float | ScalarKind::Double)
    }
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScalarKind::Char => "char",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        };
        write!(f, "{name}")
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A scalar element with a text conversion.
///
/// Sealed: the set of scalar kinds is fixed by the text format.
///
/// # Example
/// ```
/// use neurograph_schema::Scalar;
///
/// let text = 0.1f64.to_text();
/// assert_eq!(f64::from_text(&text).unwrap(), 0.1);
/// assert!(i32::from_text("twelve").is_err());
/// ```
pub trait Scalar: sealed::Sealed + Copy + Default + PartialEq + std::fmt::Debug + 'static {
    const KIND: ScalarKind;

    fn to_text(&self) -> String;

    fn from_text(text: &str) -> Result<Self, CodecError>;

    /// Interprets the value as an element count. `None` for negative or non-integer values.
    fn to_count(&self) -> Option<usize>;
}

macro_rules! impl_integer_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn to_text(&self) -> String {
                self.to_string()
            }

            fn from_text(text: &str) -> Result<Self, CodecError> {
                text.trim().parse::<$ty>().map_err(|e| CodecError::InvalidValue {
                    kind: Self::KIND,
                    text: text.to_string(),
                    reason: e.to_string(),
                })
            }

            fn to_count(&self) -> Option<usize> {
                usize::try_from(*self).ok()
            }
        }
    )*};
}

macro_rules! impl_float_scalar {
    ($($ty:ty => $kind:ident, $precision:literal),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn to_text(&self) -> String {
                format!("{:.*e}", $precision, self)
            }

            fn from_text(text: &str) -> Result<Self, CodecError> {
                text.trim().parse::<$ty>().map_err(|e| CodecError::InvalidValue {
                    kind: Self::KIND,
                    text: text.to_string(),
                    reason: e.to_string(),
                })
            }

            fn to_count(&self) -> Option<usize> {
                None
            }
        }
    )*};
}

impl_integer_scalar!(
    i8 => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
);

// Precision counts digits after the leading one: 16 + 1 = 17 significant digits for f64
impl_float_scalar!(
    f32 => Float, 8,
    f64 => Double, 16,
);

//region Text

/// Storage flavour of a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Null-terminated buffer of `capacity` bytes, terminator included
    Fixed { capacity: usize },
    /// Heap allocated string, possibly null
    Heap,
}

/// Length token written before a text line; `-1` marks a null string.
///
/// # Example
/// ```
/// use neurograph_schema::codec::{text_length_token, parse_text_length};
///
/// assert_eq!(text_length_token(Some("soma")).unwrap(), "4");
/// assert_eq!(text_length_token(None).unwrap(), "-1");
/// assert_eq!(parse_text_length("-1").unwrap(), None);
/// assert_eq!(parse_text_length("4").unwrap(), Some(4));
/// ```
pub fn text_length_token(text: Option<&str>) -> Result<String, CodecError> {
    match text {
        None => Ok("-1".to_string()),
        Some(text) if text.contains(['\n', '\r']) => Err(CodecError::MultilineText),
        Some(text) => Ok(text.len().to_string()),
    }
}

pub fn parse_text_length(token: &str) -> Result<Option<usize>, CodecError> {
    let length: i64 = token
        .trim()
        .parse()
        .map_err(|_| CodecError::InvalidLength(token.to_string()))?;
    match length {
        -1 => Ok(None),
        n if n >= 0 => usize::try_from(n)
            .map(Some)
            .map_err(|_| CodecError::InvalidLength(token.to_string())),
        _ => Err(CodecError::InvalidLength(token.to_string())),
    }
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a character.
pub fn truncate_to_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Text held in a fixed buffer of `N` bytes, one of which is reserved for the terminator.
///
/// # Example
/// ```
/// use neurograph_schema::FixedString;
///
/// let label: FixedString<6> = FixedString::new("pyramidal");
/// assert_eq!(label.as_str(), "pyram");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FixedString<const N: usize> {
    text: String,
}

impl<const N: usize> FixedString<N> {
    pub const CAPACITY: usize = N;

    pub fn new(text: &str) -> Self {
        let mut fixed = Self::default();
        fixed.set(text);
        fixed
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Replaces the content. Returns false when the text had to be truncated.
    pub fn set(&mut self, text: &str) -> bool {
        let kept = truncate_to_boundary(text, N.saturating_sub(1));
        self.text.clear();
        self.text.push_str(kept);
        kept.len() == text.len()
    }
}

impl<const N: usize> Display for FixedString<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

//endregion
