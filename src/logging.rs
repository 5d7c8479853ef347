// src/logging.rs

//! Logging setup for `rulewatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `RULEWATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. `debug` when verbose output was requested (`--verbose` or
//!    `[build].verbose = true`)
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that build tool output on stdout stays readable.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool) -> Result<()> {
    let level = resolve_level(
        cli_level,
        std::env::var("RULEWATCH_LOG").ok().as_deref(),
        verbose,
    );

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

fn resolve_level(
    cli_level: Option<LogLevel>,
    env_level: Option<&str>,
    verbose: bool,
) -> tracing::Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    if let Some(lvl) = env_level.and_then(parse_level_str) {
        return lvl;
    }
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_beats_env_and_verbose() {
        let lvl = resolve_level(Some(LogLevel::Warn), Some("trace"), true);
        assert_eq!(lvl, tracing::Level::WARN);
    }

    #[test]
    fn env_beats_verbose() {
        assert_eq!(resolve_level(None, Some("error"), true), tracing::Level::ERROR);
    }

    #[test]
    fn verbose_falls_back_to_debug() {
        assert_eq!(resolve_level(None, Some("bogus"), true), tracing::Level::DEBUG);
        assert_eq!(resolve_level(None, None, false), tracing::Level::INFO);
    }
}
