#![allow(dead_code)]

use rulewatch::config::{
    ActionKind, BuildSection, ConfigFile, GateSection, PatternSpec, RawConfigFile,
    ReloadSection, RuleSpec, ScanSpec,
};
use rulewatch::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                build: BuildSection::default(),
                reload: ReloadSection::default(),
                gate: GateSection::default(),
                scan: Vec::new(),
                rule: Vec::new(),
            },
        }
    }

    pub fn output_dir(mut self, dir: &str) -> Self {
        self.config.build.output_dir = dir.to_string();
        self
    }

    pub fn with_feature(mut self, name: &str) -> Self {
        self.config.build.features.insert(name.to_string());
        self
    }

    pub fn with_scan(mut self, dir: &str) -> Self {
        self.config.scan.push(ScanSpec {
            dir: dir.to_string(),
            filter: None,
            watch_only: false,
        });
        self
    }

    pub fn with_filtered_scan(mut self, dir: &str, filter: PatternSpec) -> Self {
        self.config.scan.push(ScanSpec {
            dir: dir.to_string(),
            filter: Some(filter),
            watch_only: false,
        });
        self
    }

    pub fn with_watch_only(mut self, dir: &str) -> Self {
        self.config.scan.push(ScanSpec {
            dir: dir.to_string(),
            filter: None,
            watch_only: true,
        });
        self
    }

    pub fn with_rule(mut self, rule: RuleSpec) -> Self {
        self.config.rule.push(rule);
        self
    }

    pub fn require(mut self, artifact: &str) -> Self {
        self.config.gate.required.push(artifact.to_string());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.gate.poll_interval_ms = ms;
        self
    }

    pub fn reload_addr(mut self, addr: &str) -> Self {
        self.config.reload.addr = addr.to_string();
        self
    }

    pub fn reload_path(mut self, path: &str) -> Self {
        self.config.reload.path = path.to_string();
        self
    }

    pub fn without_reload(mut self) -> Self {
        self.config.reload.enabled = false;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RuleSpec`.
pub struct RuleSpecBuilder {
    rule: RuleSpec,
}

impl RuleSpecBuilder {
    pub fn new(pattern: PatternSpec, action: ActionKind) -> Self {
        Self {
            rule: RuleSpec {
                pattern,
                action,
                feature: None,
                dest: None,
                cmd: None,
                description: None,
            },
        }
    }

    pub fn copy(pattern: PatternSpec, dest: &str) -> Self {
        Self::new(pattern, ActionKind::Copy).dest(dest)
    }

    pub fn command(pattern: PatternSpec, argv: &[&str]) -> Self {
        Self::new(pattern, ActionKind::Command).cmd(argv)
    }

    pub fn reload(pattern: PatternSpec) -> Self {
        Self::new(pattern, ActionKind::Reload)
    }

    pub fn manifest(pattern: PatternSpec) -> Self {
        Self::new(pattern, ActionKind::Manifest)
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.rule.dest = Some(dest.to_string());
        self
    }

    pub fn cmd(mut self, argv: &[&str]) -> Self {
        self.rule.cmd = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.rule.description = Some(text.to_string());
        self
    }

    pub fn feature(mut self, name: &str) -> Self {
        self.rule.feature = Some(name.to_string());
        self
    }

    pub fn build(self) -> RuleSpec {
        self.rule
    }
}

/// Shorthands for `PatternSpec` values.
pub fn regex(s: &str) -> PatternSpec {
    PatternSpec::Regex(s.to_string())
}

pub fn suffix(s: &str) -> PatternSpec {
    PatternSpec::Suffix(s.to_string())
}

pub fn prefix(s: &str) -> PatternSpec {
    PatternSpec::Prefix(s.to_string())
}

pub fn glob(s: &str) -> PatternSpec {
    PatternSpec::Glob(s.to_string())
}
