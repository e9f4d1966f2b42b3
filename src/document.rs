// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Model documents
//!
//! A model document is one header line, `<magic> <version>`, followed by the text
//! produced by [`save`](neurograph_serialization::save). The header lets a reader
//! refuse files written by something else or by an incompatible release before any
//! record is touched.

use neurograph_schema::{SelectionMode, TypeRegistry};
use neurograph_serialization::{LoadError, LoadPolicy, LoadSummary, Loader, SaveError, SaveSummary};
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Header magic written by default
pub const MAGIC: &str = "neurograph-model";

/// Current document format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing document header")]
    MissingHeader,

    #[error("Malformed document header '{0}'")]
    MalformedHeader(String),

    #[error("Invalid magic: expected '{expected}', found '{found}'")]
    InvalidMagic { expected: String, found: String },

    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: u32,
        expected_version: u32,
    },

    #[error("Save failed: {0}")]
    Save(#[from] SaveError),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// The first line of a model document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub magic: String,
    pub version: u32,
}

impl Default for DocumentHeader {
    fn default() -> Self {
        Self {
            magic: MAGIC.to_string(),
            version: FORMAT_VERSION,
        }
    }
}

impl Display for DocumentHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.magic, self.version)
    }
}

impl DocumentHeader {
    pub fn new(magic: impl Into<String>, version: u32) -> Self {
        Self {
            magic: magic.into(),
            version,
        }
    }

    /// Splits a header line into magic and version without judging either.
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(magic), Some(version), None) => {
                let version = version
                    .parse::<u32>()
                    .map_err(|_| DocumentError::MalformedHeader(line.to_string()))?;
                Ok(Self::new(magic, version))
            }
            _ => Err(DocumentError::MalformedHeader(line.to_string())),
        }
    }

    /// Fails unless `found` has this header's magic and version.
    pub fn check(&self, found: &DocumentHeader) -> Result<()> {
        if found.magic != self.magic {
            return Err(DocumentError::InvalidMagic {
                expected: self.magic.clone(),
                found: found.magic.clone(),
            });
        }
        if found.version != self.version {
            return Err(DocumentError::VersionMismatch {
                file_version: found.version,
                expected_version: self.version,
            });
        }
        Ok(())
    }
}

#[cfg(feature = "config")]
impl From<&neurograph_config::DocumentConfig> for DocumentHeader {
    fn from(config: &neurograph_config::DocumentConfig) -> Self {
        Self::new(config.magic.clone(), config.version)
    }
}

/// Writes the header line then the saved graph rooted at `root`.
pub fn write_model<T, W>(
    registry: &T,
    type_name: &str,
    root: &dyn Any,
    mut writer: W,
    header: &DocumentHeader,
    mode: SelectionMode,
) -> Result<SaveSummary>
where
    T: TypeRegistry + ?Sized,
    W: Write,
{
    writeln!(writer, "{}", header)?;
    let summary = neurograph_serialization::save(registry, type_name, root, &mut writer, mode)?;
    writer.flush()?;
    Ok(summary)
}

/// Checks the header line then loads the rest of the document into `root`.
pub fn read_model<T, R>(
    registry: &T,
    mut reader: R,
    type_name: &str,
    root: &mut dyn Any,
    root_is_valid_allocation: bool,
    header: &DocumentHeader,
    policy: LoadPolicy,
) -> Result<LoadSummary>
where
    T: TypeRegistry + ?Sized,
    R: BufRead,
{
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(DocumentError::MissingHeader);
    }
    let found = DocumentHeader::parse(line.trim_end_matches(['\n', '\r']))?;
    header.check(&found)?;
    debug!("[DOCUMENT] Header accepted: {}", found);

    let summary = Loader::new(registry, policy).starting_at_line(2).load(
        reader,
        type_name,
        root,
        root_is_valid_allocation,
    )?;
    Ok(summary)
}

/// Saves `root` to a new file at `path`, replacing any existing one.
pub fn save_model_file<T, P>(
    registry: &T,
    type_name: &str,
    root: &dyn Any,
    path: P,
    header: &DocumentHeader,
    mode: SelectionMode,
) -> Result<SaveSummary>
where
    T: TypeRegistry + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)?;
    let summary = write_model(registry, type_name, root, BufWriter::new(file), header, mode)?;
    info!(
        "[DOCUMENT] Saved {} to {} ({} lines)",
        type_name,
        path.display(),
        summary.lines + 1
    );
    Ok(summary)
}

/// Loads the file at `path` into `root`.
pub fn load_model_file<T, P>(
    registry: &T,
    path: P,
    type_name: &str,
    root: &mut dyn Any,
    root_is_valid_allocation: bool,
    header: &DocumentHeader,
    policy: LoadPolicy,
) -> Result<LoadSummary>
where
    T: TypeRegistry + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    let summary = read_model(
        registry,
        BufReader::new(file),
        type_name,
        root,
        root_is_valid_allocation,
        header,
        policy,
    )?;
    info!(
        "[DOCUMENT] Loaded {} from {} ({} warnings)",
        type_name,
        path.display(),
        summary.warnings.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parse() {
        let header = DocumentHeader::parse("neurograph-model 1").unwrap();
        assert_eq!(header, DocumentHeader::default());
        assert_eq!(header.to_string(), "neurograph-model 1");

        assert!(matches!(
            DocumentHeader::parse("neurograph-model"),
            Err(DocumentError::MalformedHeader(_))
        ));
        assert!(matches!(
            DocumentHeader::parse("neurograph-model one"),
            Err(DocumentError::MalformedHeader(_))
        ));
        assert!(matches!(
            DocumentHeader::parse("neurograph-model 1 extra"),
            Err(DocumentError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_header_check() {
        let expected = DocumentHeader::default();
        assert!(expected.check(&DocumentHeader::new(MAGIC, 1)).is_ok());
        assert!(matches!(
            expected.check(&DocumentHeader::new("other", 1)),
            Err(DocumentError::InvalidMagic { .. })
        ));
        assert!(matches!(
            expected.check(&DocumentHeader::new(MAGIC, 0)),
            Err(DocumentError::VersionMismatch {
                file_version: 0,
                expected_version: 1
            })
        ));
    }
}
