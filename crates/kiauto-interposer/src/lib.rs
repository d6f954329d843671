//! # kiauto-interposer
//!
//! LD_PRELOAD shim that traces what KiCad asks of GTK, Pango, GLX and the
//! file system, so KiAuto can tell a slow KiCad from a hung one.
//!
//! ## Usage
//!
//! ```bash
//! KIAUTO_INTERPOSER_PRINT=/tmp/print.cfg \
//! LD_PRELOAD=/path/to/libinterposer.so \
//! pcbnew board.kicad_pcb
//! ```
//!
//! ## Environment Variables
//!
//! - `KIAUTO_INTERPOSER_PRINT`: 3-line file (dir, base name, format) for print dialog forcing
//! - `KIAUTO_INTERPOSER_FILENAME`: name the file chooser returns instead of the user's pick
//! - `KIAUTO_INTERPOSER_TABLES`: TOML file replacing the built-in substitution tables
//! - `KIAUTO_INTERPOSER_LOG`: `tracing` filter for the interposer's own diagnostics (stderr)
//! - `KIAUTO_INTERPOSER_LOG_FILE`: send those diagnostics to a file instead
//!
//! The trace itself always goes to stdout.

// Allow unsafe FFI functions without safety docs - these are inherently unsafe C ABI
#![allow(clippy::missing_safety_doc)]

// Macros must be defined before modules that use them
#[macro_use]
pub mod macros;

pub mod error;
pub mod fdpath;
pub mod filter;
pub mod gtk;
pub mod hooks;
pub mod print;
pub mod reals;
pub mod state;
pub mod trace;

pub use error::InterposerError;

use kiauto_config::log_interposer_debug;

use crate::state::InterposerGuard;

fn init() {
    let Some(_guard) = InterposerGuard::enter() else {
        return;
    };
    if kiauto_config::logging::init_interposer_logging() {
        log_interposer_debug!("Interposer loaded", pid = std::process::id());
    }
}

/// Library constructor, run by the dynamic loader via `.init_array`.
#[cfg(all(target_os = "linux", not(test)))]
#[link_section = ".init_array"]
#[used]
pub static INIT_INTERPOSER: unsafe extern "C" fn() = {
    unsafe extern "C" fn init_interposer() {
        crate::init();
    }
    init_interposer
};
