// src/rules/from_config.rs

//! Turn `[[rule]]` entries into rule handlers that enqueue built-in tasks.

use std::path::Path;

use tracing::debug;

use crate::config::{ActionKind, ConfigFile, RuleSpec};
use crate::errors::RulewatchError;
use crate::exec::builtin;
use crate::rules::pattern::Pattern;
use crate::rules::table::{RuleContext, RuleTable};
use crate::tasks::TaskArg;
use crate::watch::path_utils::relative_str;

/// Values substituted into `dest`, `cmd` and `description` templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    /// Absolute source path.
    pub path: String,
    /// Project-relative path.
    pub rel: String,
    /// First capture, or `rel` when the pattern has none.
    pub capture: String,
    /// Absolute output directory.
    pub out: String,
    /// `capture` without its final extension.
    pub stem: String,
}

impl TemplateVars {
    pub fn new(abs: &Path, rel: &str, capture: Option<&str>, out: &Path) -> Self {
        let capture = capture.unwrap_or(rel).to_string();
        let stem = match capture.rfind('.') {
            Some(dot) if dot > capture.rfind('/').map_or(0, |s| s + 1) => capture[..dot].to_string(),
            _ => capture.clone(),
        };
        Self {
            path: abs.to_string_lossy().into_owned(),
            rel: rel.to_string(),
            capture,
            out: out.to_string_lossy().into_owned(),
            stem,
        }
    }

    pub fn render(&self, template: &str) -> String {
        template
            .replace("{path}", &self.path)
            .replace("{rel}", &self.rel)
            .replace("{capture}", &self.capture)
            .replace("{out}", &self.out)
            .replace("{stem}", &self.stem)
    }
}

/// Build the rule table for every active `[[rule]]` (feature toggles applied),
/// preserving declaration order.
pub fn build_rule_table(cfg: &ConfigFile) -> crate::errors::Result<RuleTable> {
    let mut table = RuleTable::new();
    for spec in cfg.active_rules() {
        let pattern = Pattern::compile(&spec.pattern)?;
        debug!(?pattern, action = ?spec.action, "registering rule");
        add_rule(&mut table, pattern, spec.clone())?;
    }
    Ok(table)
}

fn add_rule(table: &mut RuleTable, pattern: Pattern, spec: RuleSpec) -> crate::errors::Result<()> {
    match spec.action {
        ActionKind::Copy => {
            let dest = spec.dest.ok_or_else(|| {
                RulewatchError::ConfigError("copy rule has no `dest`".to_string())
            })?;
            table.add(pattern, move |ctx, abs, capture| {
                let vars = vars_for(ctx, abs, capture);
                let dest_rel = vars.render(&dest);
                ctx.enqueue(
                    builtin::COPY,
                    vec![TaskArg::from(vars.path), TaskArg::from(dest_rel)],
                );
                Ok(())
            });
        }
        ActionKind::Command => {
            let argv_tpl = spec
                .cmd
                .filter(|argv| !argv.is_empty())
                .ok_or_else(|| RulewatchError::ConfigError("command rule has no `cmd`".to_string()))?;
            let description_tpl = spec.description.unwrap_or_else(|| argv_tpl.join(" "));
            table.add(pattern, move |ctx, abs, capture| {
                let vars = vars_for(ctx, abs, capture);
                let argv: Vec<String> = argv_tpl.iter().map(|a| vars.render(a)).collect();
                ctx.enqueue(
                    builtin::COMMAND,
                    vec![
                        TaskArg::from(vars.render(&description_tpl)),
                        TaskArg::List(argv),
                    ],
                );
                Ok(())
            });
        }
        ActionKind::Reload => {
            table.add(pattern, |ctx, abs, _capture| {
                let out = ctx.settings().output_dir.clone();
                match relative_str(&out, abs) {
                    Some(out_rel) => {
                        ctx.enqueue(builtin::RELOAD, vec![TaskArg::from(out_rel)]);
                    }
                    None => {
                        debug!(path = ?abs, "reload rule matched a file outside the output dir; skipping")
                    }
                }
                Ok(())
            });
        }
        ActionKind::Manifest => {
            table.add(pattern, |ctx, _abs, _capture| {
                ctx.enqueue(builtin::MANIFEST, Vec::new());
                Ok(())
            });
        }
    }
    Ok(())
}

fn vars_for(ctx: &RuleContext<'_>, abs: &Path, capture: Option<&str>) -> TemplateVars {
    TemplateVars::new(abs, ctx.rel(), capture, &ctx.settings().output_dir)
}
