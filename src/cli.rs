// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `rulewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rulewatch",
    version,
    about = "Incrementally build an output bundle from path rules, with watch mode and live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    ///
    /// Default: `Rulewatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Rulewatch.toml")]
    pub config: String,

    /// Build once and exit; do not watch for changes.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RULEWATCH_LOG`, `--verbose` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log every task as it runs.
    #[arg(long, short)]
    pub verbose: bool,

    /// Parse + validate, print scans and rules, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
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
