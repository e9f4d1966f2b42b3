// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, NeurographConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "neurograph.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "NEUROGRAPH_CONFIG_PATH";

/// Find the neurograph configuration file
///
/// Search order:
/// 1. `NEUROGRAPH_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurograph.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurographConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeurographConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROGRAPH_HEADER_MAGIC` -> `document.magic`
/// - `NEUROGRAPH_FORMAT_VERSION` -> `document.version`
/// - `NEUROGRAPH_SELECTION` -> `serialization.default_selection`
/// - `NEUROGRAPH_LOAD_POLICY` -> `serialization.load_policy`
/// - `NEUROGRAPH_LOG_LEVEL` -> `logging.level`
/// - `NEUROGRAPH_LOG_FORMAT` -> `logging.format`
/// - `NEUROGRAPH_LOG_FILE` -> `logging.file_path`
///
/// Values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut NeurographConfig) {
    let lookup = |key: &str| env::var(format!("NEUROGRAPH_{}", key.to_uppercase())).ok();
    apply_overrides(config, lookup);
}

/// Apply CLI argument overrides to configuration
///
/// Keys mirror the environment variables in lower case without the prefix:
/// `header_magic`, `format_version`, `selection`, `load_policy`, `log_level`,
/// `log_format`, `log_file`.
pub fn apply_cli_overrides(config: &mut NeurographConfig, cli_args: &HashMap<String, String>) {
    apply_overrides(config, |key| cli_args.get(key).cloned());
}

fn apply_overrides(config: &mut NeurographConfig, lookup: impl Fn(&str) -> Option<String>) {
    // Document header
    if let Some(value) = lookup("header_magic") {
        config.document.magic = value;
    }
    if let Some(value) = lookup("format_version") {
        if let Ok(version) = value.parse::<u32>() {
            config.document.version = version;
        }
    }

    // Serialization
    if let Some(value) = lookup("selection") {
        if let Ok(mode) = value.parse() {
            config.serialization.default_selection = mode;
        }
    }
    if let Some(value) = lookup("load_policy") {
        if let Ok(policy) = value.parse() {
            config.serialization.load_policy = policy;
        }
    }

    // Logging
    if let Some(value) = lookup("log_level") {
        config.logging.level = value;
    }
    if let Some(value) = lookup("log_format") {
        config.logging.format = value;
    }
    if let Some(value) = lookup("log_file") {
        config.logging.file_path = Some(PathBuf::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurograph_schema::SelectionMode;
    use neurograph_serialization::LoadPolicy;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved_policy = env::var("NEUROGRAPH_LOAD_POLICY").ok();
        env::remove_var("NEUROGRAPH_LOAD_POLICY");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[document]").unwrap();
        writeln!(file, "magic = \"brain\"").unwrap();
        writeln!(file, "[serialization]").unwrap();
        writeln!(file, "load_policy = \"strict\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.document.magic, "brain");
        assert_eq!(config.serialization.load_policy, LoadPolicy::Strict);

        if let Some(value) = saved_policy {
            env::set_var("NEUROGRAPH_LOAD_POLICY", value);
        }
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[document\nmagic = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NeurographConfig::default();

        env::set_var("NEUROGRAPH_SELECTION", "init");
        env::set_var("NEUROGRAPH_LOG_LEVEL", "debug");
        env::set_var("NEUROGRAPH_FORMAT_VERSION", "not-a-number");
        apply_environment_overrides(&mut config);
        env::remove_var("NEUROGRAPH_SELECTION");
        env::remove_var("NEUROGRAPH_LOG_LEVEL");
        env::remove_var("NEUROGRAPH_FORMAT_VERSION");

        assert_eq!(config.serialization.default_selection, SelectionMode::InitOnly);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.document.version, 1);
    }

    #[test]
    fn test_cli_overrides_win_over_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[logging]\nlevel = \"warn\"\n").unwrap();

        let mut cli_args = HashMap::new();
        cli_args.insert("log_level".to_string(), "trace".to_string());
        cli_args.insert("log_file".to_string(), "/tmp/neurograph.log".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        assert_eq!(config.logging.level, "trace");
        assert_eq!(
            config.logging.file_path,
            Some(PathBuf::from("/tmp/neurograph.log"))
        );
    }
}
