//! End-to-end tests for the interposer
//!
//! Builds `libinterposer.so` and the stand-in GTK library, runs
//! `trace_helper` with both preloaded, and hands back what it printed.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{bail, Context, Result};
use kiauto_config::{ENV_FILENAME, ENV_LOG, ENV_LOG_FILE, ENV_PRINT, ENV_TABLES};

/// Workspace root, where the top-level Cargo.toml lives
pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// The shared objects preloaded into the helper
#[derive(Debug, Clone)]
pub struct Preload {
    pub interposer: PathBuf,
    pub gtk_stub: PathBuf,
}

impl Preload {
    /// Build both libraries into their own target directory, so the build
    /// doesn't wait on the lock held by the `cargo test` running us.
    pub fn build(target_dir: &Path) -> Result<Self> {
        let status = Command::new(env!("CARGO"))
            .arg("build")
            .arg("--manifest-path")
            .arg(workspace_root().join("Cargo.toml"))
            .args(["-p", "kiauto-interposer", "-p", "kiauto-gtk-stub"])
            .arg("--target-dir")
            .arg(target_dir)
            .env_remove("LD_PRELOAD")
            .status()
            .context("Failed to run cargo build")?;
        if !status.success() {
            bail!("Building the preload libraries failed: {}", status);
        }

        let out = target_dir.join("debug");
        let libs = Self {
            interposer: out.join("libinterposer.so"),
            gtk_stub: out.join("libgtkstub.so"),
        };
        for lib in [&libs.interposer, &libs.gtk_stub] {
            if !lib.exists() {
                bail!("{} missing after build", lib.display());
            }
        }
        Ok(libs)
    }

    /// Interposer first so it sees every call, the stub right behind it so
    /// the interposer's `RTLD_NEXT` lookups land there
    pub fn ld_preload(&self) -> OsString {
        let mut value = self.interposer.clone().into_os_string();
        value.push(" ");
        value.push(&self.gtk_stub);
        value
    }

    /// Run `command` with both libraries preloaded. The interposer's own
    /// variables are cleared first, then `envs` is applied.
    pub fn run<I, K, V>(&self, command: &Path, args: &[&OsStr], envs: I) -> Result<Output>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let mut cmd = Command::new(command);
        cmd.args(args).env("LD_PRELOAD", self.ld_preload());
        for var in [ENV_PRINT, ENV_FILENAME, ENV_TABLES, ENV_LOG, ENV_LOG_FILE] {
            cmd.env_remove(var);
        }
        cmd.envs(envs)
            .output()
            .with_context(|| format!("Failed to run {}", command.display()))
    }
}

/// Raw stdout lines, terminators removed
pub fn stdout_lines(output: &Output) -> Vec<&[u8]> {
    output
        .stdout
        .split(|&b| b == b'\n')
        .filter(|line| !line.is_empty())
        .collect()
}

/// Stdout lines as text, for lines known to be UTF-8
pub fn stdout_text(output: &Output) -> Vec<String> {
    stdout_lines(output)
        .into_iter()
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}
