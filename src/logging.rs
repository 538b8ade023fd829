//! Tracing subscriber setup.
//!
//! Filter precedence: `RUST_LOG`, then the `--log-level` flag, then
//! `[logging].level`. Output goes to the configured file, or to stderr.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{AppError, AppResult};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Where log records end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    File,
    /// Nothing is installed; used by the terminal plotter when no file is set.
    Disabled,
}

/// Pick the sink for this run.
pub fn choose_sink(config: &LoggingConfig, owns_terminal: bool) -> LogSink {
    match (&config.file, owns_terminal) {
        (Some(_), _) => LogSink::File,
        (None, false) => LogSink::Stderr,
        (None, true) => LogSink::Disabled,
    }
}

/// Build the filter from `RUST_LOG`, falling back to `level`.
pub fn build_filter(level: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::Logging(format!("invalid log level '{level}': {e}")))
}

fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn open_log_file(path: &Path) -> AppResult<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Logging(format!("cannot create log directory {}: {e}", parent.display()))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logging(format!("cannot open log file {}: {e}", path.display())))
}

/// Install the global subscriber.
///
/// `level_override` comes from the command line. Returns the sink that was
/// installed so the caller can report it.
pub fn init(
    config: &LoggingConfig,
    level_override: Option<&str>,
    owns_terminal: bool,
) -> AppResult<LogSink> {
    let sink = choose_sink(config, owns_terminal);
    let level = level_override.unwrap_or(&config.level);

    let layer = match (sink, &config.file) {
        (LogSink::Disabled, _) => return Ok(sink),
        (LogSink::File, Some(path)) => {
            format_layer(config.format, Mutex::new(open_log_file(path)?), false)
        }
        _ => format_layer(config.format, std::io::stderr, true),
    };

    tracing_subscriber::registry()
        .with(build_filter(level)?)
        .with(layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(sink)
}
