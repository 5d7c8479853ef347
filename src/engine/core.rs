// src/engine/core.rs

//! Synchronous engine state machine.
//!
//! [`Engine::step`] consumes one [`EngineEvent`] and returns the commands
//! the async shell should carry out. Rule matching, batching and the
//! failure policy all live here; the shell only moves events around.
//!
//! Nothing in this file awaits. Tests drive it directly with a
//! [`MockFileSystem`](crate::fs::mock::MockFileSystem).

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::config::BuildSettings;
use crate::engine::{CoreCommand, EngineEvent, EngineStep, RuntimeOptions};
use crate::errors::{Result, RulewatchError};
use crate::exec::{CommandStatus, ProcessTracker};
use crate::fs::FileSystem;
use crate::reload::LiveReloadHub;
use crate::rules::{Pattern, RuleContext, RuleTable};
use crate::tasks::{HandlerName, HandlerRegistry, QueueStats, TaskArg, TaskContext, TaskQueue};
use crate::watch::path_utils::relative_str;
use crate::watch::{walk_files, WatchId, WatchRegistry};

/// The orchestrator: rule table, task queue, live reload clients, tracked
/// processes and watch registrations for one build.
pub struct Engine {
    settings: Arc<BuildSettings>,
    rules: RuleTable,
    handlers: HandlerRegistry,
    queue: TaskQueue,
    reload: LiveReloadHub,
    processes: ProcessTracker,
    fs: Arc<dyn FileSystem>,
    watches: WatchRegistry,
    options: RuntimeOptions,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rules.len())
            .field("handlers", &self.handlers)
            .field("queue", &self.queue.stats())
            .field("reload_clients", &self.reload.client_count())
            .field("processes", &self.processes)
            .field("watches", &self.watches)
            .field("options", &self.options)
            .finish()
    }
}

impl Engine {
    /// `events` is the engine loop's own channel; tracked processes report
    /// their exit through it.
    pub fn new(
        settings: Arc<BuildSettings>,
        rules: RuleTable,
        handlers: HandlerRegistry,
        fs: Arc<dyn FileSystem>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            settings,
            rules,
            handlers,
            queue: TaskQueue::new(),
            reload: LiveReloadHub::new(),
            processes: ProcessTracker::new(events),
            fs,
            watches: WatchRegistry::disabled(),
            options: RuntimeOptions::default(),
        }
    }

    pub fn with_watches(mut self, watches: WatchRegistry) -> Self {
        self.watches = watches;
        self
    }

    pub fn with_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn reload_hub(&mut self) -> &mut LiveReloadHub {
        &mut self.reload
    }

    /// Nothing pending, no flush armed, no tracked process running.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && !self.queue.flush_armed() && self.processes.is_idle()
    }

    /// Walk `dir` and submit every file that passes `filter` to the rule
    /// table. In watch mode the directory is also watched (once per
    /// directory). Returns the number of files submitted.
    ///
    /// The watch goes in before the walk so edits made during the walk are
    /// not lost; the duplicate submissions that may cause collapse in the
    /// queue. A directory that does not exist is skipped with a warning.
    pub fn scan(&mut self, dir: &Path, filter: Option<Pattern>) -> Result<usize> {
        if !self.fs.is_dir(dir) {
            warn!(dir = ?dir, "scan directory does not exist; skipping");
            return Ok(0);
        }
        self.watch_dir(dir, filter.clone())?;
        let files = walk_files(self.fs.as_ref(), dir, filter.as_ref())?;

        for file in &files {
            self.submit_path(file)?;
        }
        info!(dir = ?dir, files = files.len(), pending = self.queue.len(), "scanned");
        Ok(files.len())
    }

    /// Watch `dir` without walking it. No-op outside watch mode or when
    /// `dir` does not exist.
    pub fn watch_dir(&mut self, dir: &Path, filter: Option<Pattern>) -> Result<Option<WatchId>> {
        if !self.fs.is_dir(dir) {
            warn!(dir = ?dir, "watch directory does not exist; skipping");
            return Ok(None);
        }
        Ok(self.watches.register(dir, filter)?)
    }

    /// Run every rule matching `abs` (evaluated on its project-relative
    /// path). Returns how many rules fired.
    pub fn submit_path(&mut self, abs: &Path) -> Result<usize> {
        let Some(rel) = relative_str(&self.settings.root, abs) else {
            warn!(path = ?abs, "path outside project root; ignoring");
            return Ok(0);
        };

        let mut fired = 0;
        for (rule, capture) in self.rules.matches(&rel) {
            trace!(path = %rel, pattern = ?rule.pattern(), ?capture, "rule matched");
            let mut ctx = RuleContext::new(&mut self.queue, &self.settings, &rel);
            (rule.handler())(&mut ctx, abs, capture.as_deref()).map_err(|err| {
                RulewatchError::TaskFailed {
                    task: format!("rule {:?} for {rel}", rule.pattern()),
                    message: format!("{err:#}"),
                }
            })?;
            fired += 1;
        }
        if fired == 0 {
            trace!(path = %rel, "no rule matched");
        }
        Ok(fired)
    }

    /// Queue a task directly, outside any rule.
    pub fn enqueue(&mut self, handler: impl Into<HandlerName>, args: Vec<TaskArg>) -> bool {
        self.queue.enqueue(handler, args)
    }

    /// Run a snapshot of the pending queue in enqueue order.
    ///
    /// Tasks enqueued by the batch's own handlers go to the next batch. The
    /// first handler error aborts the rest of the batch. Returns how many
    /// tasks ran.
    pub fn flush(&mut self) -> Result<usize> {
        let batch = self.queue.take_batch();
        if batch.is_empty() {
            return Ok(0);
        }
        debug!(tasks = batch.len(), "flushing batch");

        for task in &batch {
            let handler = self.handlers.get(task.handler()).ok_or_else(|| {
                RulewatchError::TaskFailed {
                    task: task.describe(),
                    message: format!("no handler registered as '{}'", task.handler()),
                }
            })?;

            if self.settings.verbose {
                info!(task = %task.describe(), "running task");
            }

            let mut ctx = TaskContext {
                queue: &mut self.queue,
                reload: &mut self.reload,
                processes: &mut self.processes,
                fs: self.fs.as_ref(),
                settings: &self.settings,
            };
            if let Err(err) = handler.run(&mut ctx, task.args()) {
                error!(task = %task.describe(), error = %err, "task failed");
                return Err(RulewatchError::TaskFailed {
                    task: task.describe(),
                    message: format!("{err:#}"),
                });
            }
            self.queue.mark_run();
        }

        let stats = self.queue.stats();
        info!(
            batch = batch.len(),
            run = stats.run,
            enqueued = stats.enqueued,
            "batch complete"
        );
        Ok(batch.len())
    }

    /// Handle one event and report what the shell should do next.
    pub fn step(&mut self, event: EngineEvent) -> Result<EngineStep> {
        let mut keep_running = true;

        match event {
            EngineEvent::PathChanged { watch, path } => self.handle_change(watch, &path)?,
            EngineEvent::Flush => {
                self.flush()?;
            }
            EngineEvent::CommandExited {
                id,
                description,
                status,
            } => self.handle_exit(id, description, status)?,
            EngineEvent::ClientConnected { tx, reply } => {
                let handle = self.reload.attach(tx);
                if reply.send(handle).is_err() {
                    self.reload.unsubscribe(handle);
                }
            }
            EngineEvent::ClientDisconnected(handle) => {
                self.reload.unsubscribe(handle);
            }
            EngineEvent::ShutdownRequested => {
                info!("shutdown requested");
                self.processes.kill_all();
                keep_running = false;
            }
        }

        Ok(self.next_step(keep_running))
    }

    /// Commands implied by the current state: a deferred flush if the queue
    /// was armed, and an exit when idle in `--once` mode.
    pub fn next_step(&mut self, keep_running: bool) -> EngineStep {
        let mut commands = Vec::new();
        if self.queue.take_schedule_request() {
            commands.push(CoreCommand::ScheduleFlush);
        }

        let mut keep_running = keep_running;
        if keep_running && self.options.exit_when_idle && self.is_idle() {
            commands.push(CoreCommand::RequestExit);
            keep_running = false;
        }

        EngineStep {
            commands,
            keep_running,
        }
    }

    fn handle_change(&mut self, watch: WatchId, path: &Path) -> Result<()> {
        if !self.watches.accepts(watch, path) {
            trace!(path = ?path, "change rejected by watch filter");
            return Ok(());
        }
        // Deleted (or replaced by a link) before we got here.
        if !self.fs.is_file(path) || self.fs.is_symlink(path) {
            debug!(path = ?path, "changed path no longer a file; dropping");
            return Ok(());
        }
        self.submit_path(path)?;
        Ok(())
    }

    fn handle_exit(&mut self, id: u64, description: String, status: CommandStatus) -> Result<()> {
        self.processes.finished(id);
        match status {
            CommandStatus::Success => {
                debug!(command = %description, "build tool succeeded");
                Ok(())
            }
            CommandStatus::Interrupted => {
                info!(command = %description, "build tool interrupted");
                Ok(())
            }
            CommandStatus::Failed(code) => {
                error!(command = %description, code, "build tool failed");
                Err(RulewatchError::CommandFailed { description, code })
            }
        }
    }
}
