// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use crate::config::model::{ActionKind, ConfigFile, RawConfigFile, RuleSpec};
use crate::errors::{Result, RulewatchError};
use crate::rules::Pattern;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RulewatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_scans(cfg)?;
    validate_global_config(cfg)?;
    validate_scans(cfg)?;
    for (idx, rule) in cfg.rule.iter().enumerate() {
        validate_rule(idx, rule)?;
    }
    Ok(())
}

fn ensure_has_scans(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scan.is_empty() {
        return Err(RulewatchError::ConfigError(
            "config must contain at least one [[scan]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.build.output_dir.trim().is_empty() {
        return Err(RulewatchError::ConfigError(
            "[build].output_dir must not be empty".to_string(),
        ));
    }

    if cfg.gate.poll_interval_ms == 0 {
        return Err(RulewatchError::ConfigError(
            "[gate].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if !cfg.reload.path.starts_with('/') {
        return Err(RulewatchError::ConfigError(format!(
            "[reload].path must start with '/' (got '{}')",
            cfg.reload.path
        )));
    }

    Ok(())
}

fn validate_scans(cfg: &RawConfigFile) -> Result<()> {
    let output = normalize_dir(&cfg.build.output_dir);
    let mut seen = HashSet::new();

    for scan in cfg.scan.iter() {
        let dir = normalize_dir(&scan.dir);
        if !seen.insert(dir.clone()) {
            return Err(RulewatchError::ConfigError(format!(
                "directory '{}' is listed in more than one [[scan]]",
                scan.dir
            )));
        }
        if dir == output && !scan.watch_only {
            return Err(RulewatchError::ConfigError(format!(
                "output directory '{}' can only be scanned with watch_only = true",
                scan.dir
            )));
        }
        if let Some(filter) = &scan.filter {
            Pattern::compile(filter)?;
        }
    }
    Ok(())
}

fn validate_rule(idx: usize, rule: &RuleSpec) -> Result<()> {
    let pattern = Pattern::compile(&rule.pattern)?;
    if pattern.capture_groups() > 1 {
        return Err(RulewatchError::ConfigError(format!(
            "rule #{idx} pattern defines {} capture groups; at most one is allowed",
            pattern.capture_groups()
        )));
    }

    match rule.action {
        ActionKind::Copy if rule.dest.is_none() => Err(RulewatchError::ConfigError(format!(
            "rule #{idx} uses action \"copy\" but has no `dest`"
        ))),
        ActionKind::Command if rule.cmd.as_ref().is_none_or(|c| c.is_empty()) => {
            Err(RulewatchError::ConfigError(format!(
                "rule #{idx} uses action \"command\" but has no `cmd`"
            )))
        }
        _ => Ok(()),
    }
}

fn normalize_dir(dir: &str) -> String {
    let trimmed = dir.trim().trim_end_matches('/');
    Path::new(trimmed)
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
