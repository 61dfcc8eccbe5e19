// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `buildwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildwatch",
    version,
    about = "Build a project tree from declared tasks and keep it in sync with source edits.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    #[arg(long, global = true, value_name = "PATH", default_value = "Buildwatch.toml")]
    pub config: PathBuf,

    /// Environment config file, overriding `<env_dir>/env_<name>.json`.
    #[arg(long, global = true, value_name = "PATH")]
    pub conf: Option<PathBuf>,

    /// Environment name. Falls back to `BUILDWATCH_ENV`, then the project
    /// default.
    #[arg(long, global = true, value_name = "NAME")]
    pub env: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDWATCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// What to do. Defaults to `build`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the full plan once.
    Build,
    /// Build, then rebuild impacted tasks on source changes until Ctrl-C.
    Watch,
    /// Run a declared task together with its prerequisites.
    #[command(external_subcommand)]
    Task(Vec<String>),
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Build)
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
