//! Diagnostic logging for KiAuto interposer components.
//!
//! This is the `tracing` channel only. The interposer's trace lines on
//! stdout are a separate contract and never pass through here.
//!
//! # Usage
//!
//! ```ignore
//! use kiauto_config::logging::*;
//!
//! log_interposer_warn!("Symbol unresolved", symbol = "gtk_dialog_run");
//! log_cli_debug!("Checking tables", path = "tables.toml");
//! ```

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::{ENV_LOG, ENV_LOG_FILE};

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const INTERPOSER: &'static str = "INTERPOSER";
    pub const CLI: &'static str = "CLI";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Map a `-v` count onto a level, starting at `Warn`
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

// === INTERPOSER logging macros ===

#[macro_export]
macro_rules! log_interposer_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::INTERPOSER, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_interposer_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::INTERPOSER, $($key = $value,)* $msg)
    };
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

/// Initialize logging with the given level filter.
/// Call this once at application startup. `KIAUTO_INTERPOSER_LOG` overrides
/// the level when set.
pub fn init_logging(level: LogLevel) {
    let env_filter =
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Install diagnostics inside a host process.
///
/// Does nothing unless `KIAUTO_INTERPOSER_LOG` is set. Output goes to
/// `KIAUTO_INTERPOSER_LOG_FILE` or stderr, never stdout. Returns whether a
/// subscriber was installed; a host that already owns the global
/// dispatcher keeps it.
pub fn init_interposer_logging() -> bool {
    let Ok(directive) = std::env::var(ENV_LOG) else {
        return false;
    };
    let writer = match std::env::var_os(ENV_LOG_FILE) {
        Some(file) => file_writer(Path::new(&file)),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Append to `path`; stderr when the file can't be opened
fn file_writer(path: &Path) -> BoxMakeWriter {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Some(name) = path.file_name() else {
        return BoxMakeWriter::new(std::io::stderr);
    };
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy().into_owned())
        .build(dir);
    match appender {
        Ok(appender) => BoxMakeWriter::new(appender),
        Err(_) => BoxMakeWriter::new(std::io::stderr),
    }
}
