use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rulewatch::tasks::{TaskArg, TaskContext};
use rulewatch::watch::{WatchBackend, WatchId};

/// Shared, ordered record of calls.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A task handler that records `label(arg, ...)` and does nothing else.
pub fn recording_handler(
    label: &str,
    log: CallLog,
) -> impl Fn(&mut TaskContext<'_>, &[TaskArg]) -> anyhow::Result<()> + Send + Sync + 'static {
    let label = label.to_string();
    move |_ctx: &mut TaskContext<'_>, args: &[TaskArg]| {
        let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        log.lock()
            .unwrap()
            .push(format!("{}({})", label, rendered.join(", ")));
        Ok(())
    }
}

/// A watch backend that records which directories were watched and reports
/// no events.
#[derive(Debug, Clone, Default)]
pub struct RecordingWatchBackend {
    watched: Arc<Mutex<Vec<(WatchId, PathBuf)>>>,
}

impl RecordingWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watched(&self) -> Vec<(WatchId, PathBuf)> {
        self.watched.lock().unwrap().clone()
    }
}

impl WatchBackend for RecordingWatchBackend {
    fn watch(&mut self, id: WatchId, dir: &Path) -> anyhow::Result<()> {
        self.watched.lock().unwrap().push((id, dir.to_path_buf()));
        Ok(())
    }
}
