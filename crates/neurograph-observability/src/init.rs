// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for neurograph
//!
//! Console output in the configured format, plus rolling JSON files in a timestamped
//! run folder when the `file-logging` feature is enabled and the output is a file.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LogOutput, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps file writers alive; logs are flushed when it is dropped.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// The run folder receiving log files, when logging to files
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Installs the global subscriber.
///
/// With [`LogOutput::File`] each run gets its own folder:
/// ```text
/// <dir>/
///   └── run_20250101_120000/
///       └── neurograph.log
/// ```
/// and folders beyond the retention limits are removed first.
///
/// # Errors
/// Fails when the filter does not parse, the run folder cannot be created, file output
/// is requested without the `file-logging` feature, or a subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&config.level);
    let env_filter =
        EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: Vec::new(),
        log_dir: None,
    };

    match &config.output {
        LogOutput::Stdout => {
            let writer = BoxMakeWriter::new(std::io::stdout);
            layers.push(console_layer(config.format, writer, env_filter));
        }
        LogOutput::Stderr => {
            let writer = BoxMakeWriter::new(std::io::stderr);
            layers.push(console_layer(config.format, writer, env_filter));
        }
        LogOutput::File(base_log_dir) => {
            let run_folder = base_log_dir.join(run_folder_name(Utc::now()));
            std::fs::create_dir_all(&run_folder).with_context(|| {
                format!("Failed to create log directory: {}", run_folder.display())
            })?;
            cleanup_old_logs(
                base_log_dir,
                Utc::now(),
                config.retention_days,
                config.retention_runs,
            )?;
            layers.push(file_layer(&run_folder, env_filter, &mut guard)?);
            guard.log_dir = Some(run_folder);
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(guard)
}

/// Info level to stdout, debug for crates named by `--debug-*` flags or `NEUROGRAPH_DEBUG`.
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingConfig::default())
}

fn console_layer(format: LogFormat, writer: BoxMakeWriter, filter: EnvFilter) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true);
    let formatted: BoxedLayer = match format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Json => base.json().boxed(),
    };
    formatted.with_filter(filter).boxed()
}

#[cfg(feature = "file-logging")]
fn file_layer(
    run_folder: &Path,
    filter: EnvFilter,
    guard: &mut LoggingGuard,
) -> Result<BoxedLayer> {
    let appender = tracing_appender::rolling::daily(run_folder, "neurograph.log");
    let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
    guard._file_guards.push(worker_guard);

    Ok(tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(filter)
        .boxed())
}

#[cfg(not(feature = "file-logging"))]
fn file_layer(
    run_folder: &Path,
    _filter: EnvFilter,
    _guard: &mut LoggingGuard,
) -> Result<BoxedLayer> {
    anyhow::bail!(
        "Logging to {} requires the file-logging feature",
        run_folder.display()
    )
}

/// Name of the folder holding one run's logs, e.g. `run_20250101_120000`.
pub fn run_folder_name(started: DateTime<Utc>) -> String {
    format!("{}{}", RUN_PREFIX, started.format(RUN_TIMESTAMP))
}

fn parse_run_folder(name: &str) -> Option<DateTime<Utc>> {
    let timestamp = name.strip_prefix(RUN_PREFIX)?;
    NaiveDateTime::parse_from_str(timestamp, RUN_TIMESTAMP)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Removes run folders older than `retention_days`, then the oldest ones beyond
/// `retention_runs`. Returns how many folders were removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    now: DateTime<Utc>,
    retention_days: u64,
    retention_runs: usize,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_run_folder);
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    // newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let cutoff = now - chrono::Duration::days(retention_days as i64);
    let mut removed = 0;
    for (position, (path, started)) in runs.iter().enumerate() {
        if *started >= cutoff && position < retention_runs {
            continue;
        }
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }

    Ok(removed)
}
