// src/tasks/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::BuildSettings;
use crate::exec::process::ProcessTracker;
use crate::fs::FileSystem;
use crate::reload::LiveReloadHub;
use crate::tasks::queue::TaskQueue;
use crate::tasks::task::{HandlerName, TaskArg};

/// Everything a task handler may touch while it runs.
///
/// Tasks enqueued through the context go into the *next* batch; the batch
/// currently executing is a snapshot.
pub struct TaskContext<'a> {
    pub queue: &'a mut TaskQueue,
    pub reload: &'a mut LiveReloadHub,
    pub processes: &'a mut ProcessTracker,
    pub fs: &'a dyn FileSystem,
    pub settings: &'a BuildSettings,
}

impl TaskContext<'_> {
    pub fn enqueue(&mut self, handler: impl Into<HandlerName>, args: Vec<TaskArg>) -> bool {
        self.queue.enqueue(handler, args)
    }
}

/// A named action a [`crate::tasks::Task`] refers to.
///
/// Handlers run synchronously from the scheduler's point of view. Work that
/// outlives the call (external tools) is handed to the
/// [`ProcessTracker`], which reports completion back to the engine.
pub trait TaskHandler: Send + Sync {
    fn run(&self, ctx: &mut TaskContext<'_>, args: &[TaskArg]) -> anyhow::Result<()>;
}

impl<F> TaskHandler for F
where
    F: Fn(&mut TaskContext<'_>, &[TaskArg]) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, ctx: &mut TaskContext<'_>, args: &[TaskArg]) -> anyhow::Result<()> {
        self(ctx, args)
    }
}

/// Handler name -> handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerName, Arc<dyn TaskHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a handler.
    pub fn register<H>(&mut self, name: impl Into<HandlerName>, handler: H)
    where
        H: TaskHandler + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Register a closure. Same as [`HandlerRegistry::register`] but lets the
    /// compiler infer the closure's argument types.
    pub fn register_fn<F>(&mut self, name: impl Into<HandlerName>, f: F)
    where
        F: Fn(&mut TaskContext<'_>, &[TaskArg]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(name, f);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}
