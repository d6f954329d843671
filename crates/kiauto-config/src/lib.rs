//! # kiauto-config
//!
//! Configuration for the KiAuto interposer.
//!
//! Everything the preloaded library reads from the outside world lives here:
//! 1. The print dialog options file (`KIAUTO_INTERPOSER_PRINT`)
//! 2. The literal substitution and measurement tables (`KIAUTO_INTERPOSER_TABLES`)
//! 3. Diagnostic logging setup (`KIAUTO_INTERPOSER_LOG`, `KIAUTO_INTERPOSER_LOG_FILE`)
//!
//! Loaders never fail the caller: unreadable sources fall back to the
//! built-in defaults and the problem is reported through `tracing`.

use once_cell::sync::Lazy;

pub mod logging;
pub mod print;
pub mod tables;

pub use print::PrintOptions;
pub use tables::{InterposerTables, PangoTable, RewriteTable, RewriteTables, Substitution};

/// Path of the 3-line print options file.
pub const ENV_PRINT: &str = "KIAUTO_INTERPOSER_PRINT";
/// File name returned by the file chooser instead of the user's pick.
pub const ENV_FILENAME: &str = "KIAUTO_INTERPOSER_FILENAME";
/// Path of a TOML file replacing the built-in tables.
pub const ENV_TABLES: &str = "KIAUTO_INTERPOSER_TABLES";
/// `tracing` filter directive for the interposer's own diagnostics.
pub const ENV_LOG: &str = "KIAUTO_INTERPOSER_LOG";
/// Optional file receiving diagnostics instead of stderr.
pub const ENV_LOG_FILE: &str = "KIAUTO_INTERPOSER_LOG_FILE";

/// Process-wide tables, loaded on first use
static TABLES: Lazy<InterposerTables> = Lazy::new(InterposerTables::from_env);

/// Get the process-wide tables (read-only)
pub fn tables() -> &'static InterposerTables {
    &TABLES
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid substitution in `{site}`: {pattern:?} -> {replacement:?}: {reason}")]
    InvalidSubstitution {
        site: &'static str,
        pattern: String,
        replacement: String,
        reason: &'static str,
    },
}
