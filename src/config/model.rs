// src/config/model.rs

use std::collections::BTreeSet;

use serde::Deserialize;

/// Top-level project file as read from TOML, before validation.
///
/// ```toml
/// [build]
/// output_dir = "build"
/// features = ["proto"]
///
/// [reload]
/// addr = "127.0.0.1:35729"
///
/// [gate]
/// required = ["app.js", "app.css"]
///
/// [[scan]]
/// dir = "assets"
///
/// [[rule]]
/// pattern = { regex = "assets/(.*\\.png)" }
/// action = "copy"
/// dest = "{capture}"
/// ```
///
/// All sections except `[[scan]]` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub reload: ReloadSection,

    #[serde(default)]
    pub gate: GateSection,

    /// Directories to walk (and watch) from `[[scan]]`.
    #[serde(default)]
    pub scan: Vec<ScanSpec>,

    /// Rule table from `[[rule]]`, in declaration order.
    #[serde(default)]
    pub rule: Vec<RuleSpec>,
}

/// Validated project file.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on every pattern compiling and every rule being
/// complete for its action.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub build: BuildSection,
    pub reload: ReloadSection,
    pub gate: GateSection,
    scan: Vec<ScanSpec>,
    rule: Vec<RuleSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            build: raw.build,
            reload: raw.reload,
            gate: raw.gate,
            scan: raw.scan,
            rule: raw.rule,
        }
    }

    pub fn scans(&self) -> &[ScanSpec] {
        &self.scan
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rule
    }

    /// Rules whose `feature` toggle (if any) is enabled in `[build].features`.
    pub fn active_rules(&self) -> impl Iterator<Item = &RuleSpec> {
        let features = &self.build.features;
        self.rule.iter().filter(move |r| match &r.feature {
            Some(f) => features.contains(f),
            None => true,
        })
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Output directory, relative to the project root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Enabled feature toggles (optional artifact families).
    #[serde(default)]
    pub features: BTreeSet<String>,

    /// Whether to keep watching after the initial build.
    #[serde(default = "default_true")]
    pub watch: bool,

    /// Log every task as it runs.
    #[serde(default)]
    pub verbose: bool,

    /// Output-relative file name of the generated manifest.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

fn default_output_dir() -> String {
    "build".to_string()
}

fn default_manifest() -> String {
    "manifest.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            features: BTreeSet::new(),
            watch: true,
            verbose: false,
            manifest: default_manifest(),
        }
    }
}

/// `[reload]` section: the live reload push endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReloadSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_reload_addr")]
    pub addr: String,

    #[serde(default = "default_reload_path")]
    pub path: String,
}

fn default_reload_addr() -> String {
    "127.0.0.1:35729".to_string()
}

fn default_reload_path() -> String {
    "/livereload".to_string()
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: default_reload_addr(),
            path: default_reload_path(),
        }
    }
}

/// `[gate]` section: artifacts that must exist before the first build counts
/// as complete.
#[derive(Debug, Clone, Deserialize)]
pub struct GateSection {
    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            required: Vec::new(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// A path pattern as written in TOML, e.g. `{ suffix = ".css" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSpec {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Glob(String),
    Regex(String),
}

/// `[[scan]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSpec {
    /// Directory to walk, relative to the project root.
    pub dir: String,

    /// Optional secondary pattern over paths relative to `dir`.
    #[serde(default)]
    pub filter: Option<PatternSpec>,

    /// Install the watch only; skip the initial walk.
    #[serde(default)]
    pub watch_only: bool,
}

/// Built-in task a rule enqueues when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Copy,
    Command,
    Reload,
    Manifest,
}

/// `[[rule]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub pattern: PatternSpec,

    pub action: ActionKind,

    /// Only register this rule when the named feature is enabled.
    #[serde(default)]
    pub feature: Option<String>,

    /// Output-relative destination template (`copy`).
    #[serde(default)]
    pub dest: Option<String>,

    /// Argv template (`command`).
    #[serde(default)]
    pub cmd: Option<Vec<String>>,

    /// Human-readable label printed when a `command` fails.
    #[serde(default)]
    pub description: Option<String>,
}
