// src/config/mod.rs

//! Project file loading and validation for rulewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a project file from disk (`loader.rs`).
//! - Validate patterns, rules and scan directories (`validate.rs`).
//! - Derive the read-only runtime settings (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str, project_root};
pub use model::{
    ActionKind, BuildSection, ConfigFile, GateSection, PatternSpec, RawConfigFile,
    ReloadSection, RuleSpec, ScanSpec,
};
pub use settings::BuildSettings;
