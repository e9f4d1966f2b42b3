// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one table in `neurograph.toml`. Missing tables and keys fall
//! back to the defaults below.

use neurograph_schema::SelectionMode;
use neurograph_serialization::LoadPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// First token of the header line of a model document
pub const DEFAULT_HEADER_MAGIC: &str = "neurograph-model";

/// Header version written by this release
pub const DEFAULT_FORMAT_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurographConfig {
    pub document: DocumentConfig,
    pub serialization: SerializationConfig,
    pub logging: LoggingSection,
}

/// Model document header settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub magic: String,
    pub version: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            magic: DEFAULT_HEADER_MAGIC.to_string(),
            version: DEFAULT_FORMAT_VERSION,
        }
    }
}

/// Save and load behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SerializationConfig {
    pub default_selection: SelectionMode,
    pub load_policy: LoadPolicy,
}

/// Logging settings, handed to the observability layer at startup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    /// "pretty", "compact" or "json"
    pub format: String,
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_tables() {
        let config: NeurographConfig = toml::from_str("[document]\nversion = 3\n").unwrap();
        assert_eq!(config.document.version, 3);
        assert_eq!(config.document.magic, DEFAULT_HEADER_MAGIC);
        assert_eq!(config.serialization.load_policy, LoadPolicy::Lenient);
        assert_eq!(config.serialization.default_selection, SelectionMode::All);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_enums_parse_from_toml() {
        let config: NeurographConfig = toml::from_str(
            "[serialization]\ndefault_selection = \"state_only\"\nload_policy = \"strict\"\n",
        )
        .unwrap();
        assert_eq!(config.serialization.default_selection, SelectionMode::StateOnly);
        assert_eq!(config.serialization.load_policy, LoadPolicy::Strict);
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(NeurographConfig::default()).unwrap();
        assert_eq!(json["document"]["magic"], DEFAULT_HEADER_MAGIC);
        assert_eq!(json["serialization"]["load_policy"], "lenient");
    }
}
