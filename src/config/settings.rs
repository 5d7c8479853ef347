// src/config/settings.rs

use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;

/// Read-only build settings shared (behind an `Arc`) by the engine, the rule
/// handlers and the built-in tasks. Never mutated after startup.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Project root; rule patterns are evaluated against paths relative to it.
    pub root: PathBuf,
    /// Absolute output directory.
    pub output_dir: PathBuf,
    pub watch: bool,
    pub verbose: bool,
    /// Output-relative manifest file name.
    pub manifest: String,
}

impl BuildSettings {
    pub fn from_config(cfg: &ConfigFile, root: &Path, watch: bool, verbose: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            output_dir: root.join(&cfg.build.output_dir),
            watch: watch && cfg.build.watch,
            verbose: verbose || cfg.build.verbose,
            manifest: cfg.build.manifest.clone(),
        }
    }

    /// Minimal settings for a root + output dir, everything else default.
    pub fn new(root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir: output_dir.into(),
            watch: false,
            verbose: false,
            manifest: "manifest.json".to_string(),
        }
    }
}
