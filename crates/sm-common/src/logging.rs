//! Logging configuration and initialization
//!
//! All SM components log through `tracing`. This module installs the global
//! subscriber from a [`LogConfig`], which is usually read from the
//! environment:
//!
//! - `SM_LOG_LEVEL`: trace, debug, info, warn, error
//! - `SM_LOG_OUTPUT`: console, file, both
//! - `SM_LOG_FORMAT`: text, json
//! - `SM_LOG_DIR`: directory for daily-rotated log files
//! - `SM_LOG_FILE_PREFIX`: file name prefix
//! - `SM_LOG_FILTER`: extra directives, e.g. `sm_server=debug,sqlx=warn`
//!
//! Use the structured macros with fields rather than formatted strings:
//!
//! ```rust,ignore
//! tracing::info!(dataset_id = %id, route = %route, "Engine request succeeded");
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sm_common::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env().unwrap_or_default();
//! let _guard = init_logging(&config).unwrap();
//! tracing::info!("started");
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::error::SmError;

/// Match `raw` case-insensitively against `(alias, value)` pairs
fn lookup<T: Copy>(what: &str, raw: &str, table: &[(&str, T)]) -> std::result::Result<T, SmError> {
    let wanted = raw.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(alias, _)| *alias == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| SmError::InvalidLogSetting(format!("{} '{}'", what, raw)))
}

/// Minimum severity that is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = SmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        lookup(
            "log level",
            s,
            &[
                ("trace", LogLevel::Trace),
                ("debug", LogLevel::Debug),
                ("info", LogLevel::Info),
                ("warn", LogLevel::Warn),
                ("warning", LogLevel::Warn),
                ("error", LogLevel::Error),
            ],
        )
    }
}

/// Log sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    fn writes_console(self) -> bool {
        self != LogOutput::File
    }

    fn writes_file(self) -> bool {
        self != LogOutput::Console
    }
}

impl FromStr for LogOutput {
    type Err = SmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        lookup(
            "log output",
            s,
            &[
                ("console", LogOutput::Console),
                ("stdout", LogOutput::Console),
                ("file", LogOutput::File),
                ("both", LogOutput::Both),
                ("all", LogOutput::Both),
            ],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = SmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        lookup(
            "log format",
            s,
            &[("text", LogFormat::Text), ("pretty", LogFormat::Text), ("json", LogFormat::Json)],
        )
    }
}

/// Subscriber settings for one process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub output: LogOutput,
    pub format: LogFormat,
    /// Where rotated files go when `output` writes to a file
    pub log_dir: PathBuf,
    /// Rotated files are named `<prefix>.<date>`
    pub log_file_prefix: String,
    /// Comma separated `EnvFilter` directives added on top of `level`
    pub filter_directives: Option<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            output: LogOutput::Console,
            format: LogFormat::Text,
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "sm".to_string(),
            filter_directives: None,
            include_location: false,
        }
    }
}

fn env_setting(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl LogConfig {
    /// Defaults overridden by the `SM_LOG_*` variables
    pub fn from_env() -> std::result::Result<Self, SmError> {
        Self::default().merge_env()
    }

    /// Apply whichever `SM_LOG_*` variables are set
    pub fn merge_env(self) -> std::result::Result<Self, SmError> {
        let mut config = self;
        if let Some(raw) = env_setting("SM_LOG_LEVEL") {
            config.level = raw.parse()?;
        }
        if let Some(raw) = env_setting("SM_LOG_OUTPUT") {
            config.output = raw.parse()?;
        }
        if let Some(raw) = env_setting("SM_LOG_FORMAT") {
            config.format = raw.parse()?;
        }
        if let Some(raw) = env_setting("SM_LOG_DIR") {
            config.log_dir = raw.into();
        }
        if let Some(raw) = env_setting("SM_LOG_FILE_PREFIX") {
            config.log_file_prefix = raw;
        }
        if let Some(raw) = env_setting("SM_LOG_FILTER") {
            config.filter_directives = Some(raw);
        }
        if let Some(raw) = env_setting("SM_LOG_INCLUDE_LOCATION") {
            config.include_location = matches!(raw.as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        Self { level, ..self }
    }

    pub fn with_output(self, output: LogOutput) -> Self {
        Self { output, ..self }
    }

    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    /// Send file output to `dir`, naming files after `prefix`
    pub fn with_files(self, dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            log_dir: dir.into(),
            log_file_prefix: prefix.into(),
            ..self
        }
    }

    pub fn with_filter(self, directives: impl Into<String>) -> Self {
        Self {
            filter_directives: Some(directives.into()),
            ..self
        }
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let base = EnvFilter::from_default_env().add_directive(Level::from(self.level).into());
        let extra = self.filter_directives.as_deref().unwrap_or_default();

        extra
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .try_fold(base, |filter, directive| -> Result<EnvFilter> {
                let directive = directive
                    .parse()
                    .with_context(|| format!("Invalid log filter directive '{}'", directive))?;
                Ok(filter.add_directive(directive))
            })
    }
}

type SinkLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the process-wide tracing subscriber
///
/// Call once at startup. With file output the returned guard owns the
/// background writer; dropping it flushes pending lines.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = config.env_filter()?;
    let mut sinks: Vec<SinkLayer> = Vec::with_capacity(2);
    let mut guard = None;

    if config.output.writes_console() {
        sinks.push(sink(config, std::io::stderr, true));
    }

    if config.output.writes_file() {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Cannot create log directory {}", config.log_dir.display()))?;
        let rolling = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, file_guard) = tracing_appender::non_blocking(rolling);
        sinks.push(sink(config, writer, false));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(sinks)
        .with(filter)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(guard)
}

fn sink<W>(config: &LogConfig, writer: W, ansi: bool) -> SinkLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.format == LogFormat::Json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}
