//! # interposer-ctl
//!
//! Maintenance tool for the data the KiAuto interposer reads: the
//! substitution tables and the print options file.

use std::ffi::OsString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kiauto_config::logging::{init_logging, LogLevel};
use kiauto_config::{log_cli_debug, log_cli_info, InterposerTables, PrintOptions};

/// KiAuto interposer control
#[derive(Parser)]
#[command(name = "interposer-ctl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Substitution and measurement tables
    Tables {
        #[command(subcommand)]
        command: TablesCommands,
    },

    /// Print dialog options file
    PrintOptions {
        #[command(subcommand)]
        command: PrintOptionsCommands,
    },
}

#[derive(Subcommand)]
enum TablesCommands {
    /// Print the built-in tables as TOML
    Dump,

    /// Parse a tables file and report invalid entries
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum PrintOptionsCommands {
    /// Show the options the interposer would use
    Show {
        /// Options file (default: $KIAUTO_INTERPOSER_PRINT)
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Write a 3-line options file
    Write {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory
        #[arg(long, default_value = kiauto_config::print::DEFAULT_DIR)]
        dir: OsString,

        /// Output file name, without extension
        #[arg(long, default_value = kiauto_config::print::DEFAULT_BASENAME)]
        name: OsString,

        /// Output format (pdf, ps, svg)
        #[arg(long, default_value = kiauto_config::print::DEFAULT_FORMAT)]
        format: OsString,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogLevel::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Tables { command } => match command {
            TablesCommands::Dump => cmd_tables_dump(),
            TablesCommands::Check { file } => cmd_tables_check(&file),
        },
        Commands::PrintOptions { command } => match command {
            PrintOptionsCommands::Show { file } => cmd_print_show(file.as_deref()),
            PrintOptionsCommands::Write {
                file,
                dir,
                name,
                format,
            } => cmd_print_write(
                &file,
                PrintOptions {
                    dir,
                    basename: name,
                    format,
                },
            ),
        },
    }
}

fn cmd_tables_dump() -> Result<()> {
    let toml = InterposerTables::default_toml().context("Failed to serialize tables")?;
    print!("{}", toml);
    Ok(())
}

fn cmd_tables_check(file: &Path) -> Result<()> {
    log_cli_debug!("Checking tables", path = tracing::field::display(file.display()));
    let tables = InterposerTables::load(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let problems = tables.problems();
    for problem in &problems {
        println!("{}", problem);
    }
    if !problems.is_empty() {
        anyhow::bail!("{}: {} invalid substitution(s)", file.display(), problems.len());
    }

    for (site, table) in tables.rewrite.sites() {
        println!("{}: {} substitution(s)", site, table.len());
    }
    println!("pango: {} ignored measurement string(s)", tables.pango.ignored.len());
    println!("{}: OK", file.display());
    Ok(())
}

fn cmd_print_show(file: Option<&Path>) -> Result<()> {
    let options = match file {
        Some(path) => PrintOptions::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => PrintOptions::try_from_env()
            .with_context(|| format!("Failed to load ${}", kiauto_config::ENV_PRINT))?,
    };
    println!("dir:    {}", options.dir.to_string_lossy());
    println!("name:   {}", options.basename.to_string_lossy());
    println!("format: {}", options.format.to_string_lossy());
    println!("output: {}", options.output_path().to_string_lossy());
    Ok(())
}

fn cmd_print_write(file: &Path, options: PrintOptions) -> Result<()> {
    for (what, value) in [
        ("dir", &options.dir),
        ("name", &options.basename),
        ("format", &options.format),
    ] {
        if value.as_bytes().iter().any(|&b| b == b'\n' || b == b'\r') {
            anyhow::bail!("--{} must be a single line", what);
        }
    }
    fs::write(file, options.to_file_contents())
        .with_context(|| format!("Failed to write {}", file.display()))?;
    log_cli_info!("Wrote print options", path = tracing::field::display(file.display()));
    println!(
        "Wrote {} ({})",
        file.display(),
        options.output_path().to_string_lossy()
    );
    Ok(())
}
