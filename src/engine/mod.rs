// src/engine/mod.rs

//! Orchestration engine for rulewatch.
//!
//! One [`Engine`] instance owns all mutable build state: the pending task
//! queue, the live reload client table, tracked processes and watch
//! registrations. It reacts to:
//!   - file changes from watch registrations
//!   - deferred flush requests
//!   - build-tool exits
//!   - live reload connects and disconnects
//!   - shutdown signals
//!
//! The synchronous state machine lives in [`core`]; the async shell that
//! owns the event channel is [`runtime`].

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::exec::CommandStatus;
use crate::reload::ClientHandle;
use crate::watch::WatchId;

pub mod core;
pub mod runtime;

pub use core::Engine;
pub use runtime::Runtime;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once the queue is drained and no tracked process is running
    /// (used for `--once`).
    pub exit_when_idle: bool,
}

/// Events flowing into the engine loop.
#[derive(Debug)]
pub enum EngineEvent {
    /// A watched file was created or modified.
    PathChanged { watch: WatchId, path: PathBuf },
    /// Run the pending batch. Posted by the shell in response to
    /// [`CoreCommand::ScheduleFlush`].
    Flush,
    /// A tracked build tool exited.
    CommandExited {
        id: u64,
        description: String,
        status: CommandStatus,
    },
    /// A live reload connection wants to be registered.
    ClientConnected {
        tx: mpsc::UnboundedSender<String>,
        reply: oneshot::Sender<ClientHandle>,
    },
    ClientDisconnected(ClientHandle),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Command produced by the core, executed by the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Post a [`EngineEvent::Flush`] behind whatever is already queued.
    ScheduleFlush,
    /// Idle in `--once` mode; stop the loop.
    RequestExit,
}

/// Decision returned by the core after handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}
