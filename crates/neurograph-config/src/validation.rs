// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that the header settings can be written on one line and read back, and
//! that the logging settings name something the observability layer understands.

use crate::{ConfigError, ConfigResult, NeurographConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &NeurographConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_document(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_document(config: &NeurographConfig, errors: &mut Vec<ConfigValidationError>) {
    let magic = &config.document.magic;
    if magic.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "document.magic".to_string(),
        });
    } else if magic.chars().any(char::is_whitespace) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "document.magic".to_string(),
            reason: "must be a single token without whitespace".to_string(),
        });
    }

    if config.document.version == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "document.version".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}

fn validate_logging(config: &NeurographConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {}", config.logging.level, LOG_LEVELS.join(", ")),
        });
    }

    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&NeurographConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let mut config = NeurographConfig::default();
        config.document.magic = "two words".to_string();
        config.document.version = 0;
        config.logging.level = "loud".to_string();

        let message = match validate_config(&config) {
            Err(ConfigError::ValidationError(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        };
        assert!(message.contains("document.magic"));
        assert!(message.contains("document.version"));
        assert!(message.contains("logging.level"));
        assert!(!message.contains("logging.format"));
    }

    #[test]
    fn test_empty_magic_is_missing() {
        let mut config = NeurographConfig::default();
        config.document.magic.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Missing required configuration: document.magic"));
    }
}
