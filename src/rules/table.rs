// src/rules/table.rs

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::BuildSettings;
use crate::rules::pattern::Pattern;
use crate::tasks::{HandlerName, TaskArg, TaskQueue};

/// Function invoked when a rule fires: absolute path plus the first capture.
pub type RuleFn =
    Arc<dyn Fn(&mut RuleContext<'_>, &Path, Option<&str>) -> anyhow::Result<()> + Send + Sync>;

/// What a rule handler can see and do while it runs.
///
/// Handlers run before identity deduplication applies, so anything they do
/// besides enqueueing must be cheap and idempotent.
pub struct RuleContext<'a> {
    queue: &'a mut TaskQueue,
    settings: &'a BuildSettings,
    rel: &'a str,
}

impl<'a> RuleContext<'a> {
    pub fn new(queue: &'a mut TaskQueue, settings: &'a BuildSettings, rel: &'a str) -> Self {
        Self {
            queue,
            settings,
            rel,
        }
    }

    /// Queue a task for the next flush. Duplicate identities are dropped.
    pub fn enqueue(&mut self, handler: impl Into<HandlerName>, args: Vec<TaskArg>) -> bool {
        self.queue.enqueue(handler, args)
    }

    pub fn settings(&self) -> &BuildSettings {
        self.settings
    }

    /// Project-relative path of the file that matched, with forward slashes.
    pub fn rel(&self) -> &str {
        self.rel
    }
}

/// A single `(pattern, handler)` binding.
#[derive(Clone)]
pub struct Rule {
    pattern: Pattern,
    handler: RuleFn,
}

impl Rule {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn handler(&self) -> &RuleFn {
        &self.handler
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Ordered rule table, fixed once the engine starts.
///
/// Every rule whose pattern fully matches a path fires; there is no
/// first-match short-circuit.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn add<F>(&mut self, pattern: Pattern, handler: F)
    where
        F: Fn(&mut RuleContext<'_>, &Path, Option<&str>) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.rules.push(Rule {
            pattern,
            handler: Arc::new(handler),
        });
    }

    /// Builder-style [`RuleTable::add`].
    pub fn rule<F>(mut self, pattern: Pattern, handler: F) -> Self
    where
        F: Fn(&mut RuleContext<'_>, &Path, Option<&str>) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.add(pattern, handler);
        self
    }

    /// All rules matching `rel_path` in full, in declaration order, with the
    /// capture each produced.
    pub fn matches<'a>(
        &'a self,
        rel_path: &'a str,
    ) -> impl Iterator<Item = (&'a Rule, Option<String>)> + 'a {
        self.rules
            .iter()
            .filter_map(move |r| r.pattern.full_match(rel_path).map(|m| (r, m.capture)))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
