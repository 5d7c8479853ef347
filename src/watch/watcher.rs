// src/watch/watcher.rs

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::engine::EngineEvent;
use crate::rules::Pattern;
use crate::watch::path_utils::relative_str;

/// Index of an installed watch registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub usize);

/// Installs recursive directory watches.
///
/// Implementations report changes as [`EngineEvent::PathChanged`] tagged
/// with the registration's [`WatchId`]. The production backend is
/// [`NotifyWatchBackend`]; tests substitute a recording fake.
pub trait WatchBackend: Send {
    fn watch(&mut self, id: WatchId, dir: &Path) -> Result<()>;
}

struct Registration {
    dir: PathBuf,
    filter: Option<Pattern>,
}

/// Active watch registrations, at most one per directory.
///
/// Without a backend (watch mode off) registration is a no-op.
pub struct WatchRegistry {
    backend: Option<Box<dyn WatchBackend>>,
    registrations: Vec<Registration>,
    by_dir: HashMap<PathBuf, WatchId>,
}

impl fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dirs: Vec<&PathBuf> = self.registrations.iter().map(|r| &r.dir).collect();
        f.debug_struct("WatchRegistry")
            .field("enabled", &self.backend.is_some())
            .field("dirs", &dirs)
            .finish()
    }
}

impl WatchRegistry {
    pub fn new(backend: Option<Box<dyn WatchBackend>>) -> Self {
        Self {
            backend,
            registrations: Vec::new(),
            by_dir: HashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Watch `dir` recursively. A second registration of the same directory
    /// returns the existing id and keeps the first filter.
    pub fn register(&mut self, dir: &Path, filter: Option<Pattern>) -> Result<Option<WatchId>> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(None);
        };
        if let Some(id) = self.by_dir.get(dir) {
            debug!(dir = ?dir, "directory already watched");
            return Ok(Some(*id));
        }

        let id = WatchId(self.registrations.len());
        backend.watch(id, dir)?;
        self.registrations.push(Registration {
            dir: dir.to_path_buf(),
            filter,
        });
        self.by_dir.insert(dir.to_path_buf(), id);
        info!(dir = ?dir, "watching directory");
        Ok(Some(id))
    }

    /// Whether a change at `path` reported for `id` passes that
    /// registration's filter.
    pub fn accepts(&self, id: WatchId, path: &Path) -> bool {
        let Some(reg) = self.registrations.get(id.0) else {
            return false;
        };
        match &reg.filter {
            None => true,
            Some(filter) => relative_str(&reg.dir, path).is_some_and(|rel| filter.is_match(&rel)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Backend over `notify`'s recommended watcher for the platform.
///
/// Every installed watcher is owned here; dropping the backend stops them.
pub struct NotifyWatchBackend {
    events: mpsc::UnboundedSender<EngineEvent>,
    watchers: Vec<RecommendedWatcher>,
}

impl NotifyWatchBackend {
    pub fn new(events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            events,
            watchers: Vec::new(),
        }
    }
}

impl WatchBackend for NotifyWatchBackend {
    fn watch(&mut self, id: WatchId, dir: &Path) -> Result<()> {
        let tx = self.events.clone();
        // Called synchronously on notify's thread.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !is_content_change(&event.kind) {
                        trace!(?event, "ignoring watch event");
                        return;
                    }
                    for path in event.paths {
                        if tx.send(EngineEvent::PathChanged { watch: id, path }).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )
        .context("creating file watcher")?;

        watcher
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("watching {:?}", dir))?;
        self.watchers.push(watcher);
        Ok(())
    }
}

/// Creates and modifications re-enter the rule table; removals and access
/// events do not.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}
