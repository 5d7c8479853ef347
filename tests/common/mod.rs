#![allow(dead_code)]

pub use rulewatch_test_utils::builders;
pub use rulewatch_test_utils::recording;
pub use rulewatch_test_utils::{init_tracing, with_timeout};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use rulewatch::config::BuildSettings;
use rulewatch::engine::{Engine, EngineEvent};
use rulewatch::exec::register_builtins;
use rulewatch::fs::FileSystem;
use rulewatch::rules::RuleTable;
use rulewatch::tasks::HandlerRegistry;

/// Registry with the built-in handlers.
pub fn builtin_handlers() -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();
    register_builtins(&mut handlers);
    handlers
}

/// An engine over `fs` rooted at `root` with output in `root/build`, plus
/// both ends of its event channel.
pub fn engine_at(
    root: &Path,
    rules: RuleTable,
    handlers: HandlerRegistry,
    fs: Arc<dyn FileSystem>,
) -> (
    Engine,
    mpsc::UnboundedSender<EngineEvent>,
    mpsc::UnboundedReceiver<EngineEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let settings = BuildSettings::new(root, root.join("build"));
    let engine = Engine::new(Arc::new(settings), rules, handlers, fs, tx.clone());
    (engine, tx, rx)
}

/// Canonical path of a temp dir, so paths reported by the OS line up.
pub fn canonical(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().canonicalize().expect("canonicalize temp dir")
}
