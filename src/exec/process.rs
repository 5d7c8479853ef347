// src/exec/process.rs

//! Tracked external build-tool processes.
//!
//! The scheduler never waits on a process. Each spawn gets its own Tokio
//! task that waits for exit and reports an [`EngineEvent::CommandExited`]
//! back to the engine loop, which applies the failure policy.
//!
//! On unix every tool leads its own process group, so killing it also takes
//! down whatever it started (shell wrappers, watch-mode compilers).

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;

/// How a tracked process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Killed by SIGINT/SIGTERM: an expected shutdown, not a failure.
    Interrupted,
    Failed(i32),
}

impl CommandStatus {
    pub fn from_exit_status(status: ExitStatus) -> Self {
        if status.success() {
            return CommandStatus::Success;
        }
        if let Some(code) = status.code() {
            return CommandStatus::Failed(code);
        }
        classify_signal(status)
    }
}

#[cfg(unix)]
fn classify_signal(status: ExitStatus) -> CommandStatus {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(libc::SIGINT) | Some(libc::SIGTERM) => CommandStatus::Interrupted,
        Some(sig) => CommandStatus::Failed(128 + sig),
        None => CommandStatus::Failed(-1),
    }
}

#[cfg(not(unix))]
fn classify_signal(_status: ExitStatus) -> CommandStatus {
    CommandStatus::Failed(-1)
}

struct RunningCommand {
    description: String,
    /// Process group led by the tool; `None` if it exited before we saw a pid.
    pgid: Option<u32>,
    handle: JoinHandle<()>,
}

/// Processes started by tasks and not yet reported as exited.
pub struct ProcessTracker {
    events: mpsc::UnboundedSender<EngineEvent>,
    running: HashMap<u64, RunningCommand>,
    next_id: u64,
}

impl std::fmt::Debug for ProcessTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessTracker")
            .field("running", &self.running.len())
            .finish_non_exhaustive()
    }
}

impl ProcessTracker {
    pub fn new(events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            events,
            running: HashMap::new(),
            next_id: 0,
        }
    }

    /// Start `argv` in `cwd`. Must be called from within a Tokio runtime.
    pub fn spawn(&mut self, description: &str, argv: &[String], cwd: &Path) -> Result<u64> {
        let Some((program, rest)) = argv.split_first() else {
            bail!("command '{description}' has an empty argv");
        };

        info!(command = %description, ?argv, "starting build tool");

        let mut cmd = Command::new(program);
        cmd.args(rest)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for '{description}'"))?;

        let id = self.next_id;
        self.next_id += 1;
        let pgid = child.id();

        if let Some(stdout) = child.stdout.take() {
            let label = description.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(command = %label, "{}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let label = description.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(command = %label, "{}", line);
                }
            });
        }

        let events = self.events.clone();
        let label = description.to_string();
        let handle = tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(status) => CommandStatus::from_exit_status(status),
                Err(err) => {
                    warn!(command = %label, error = %err, "failed waiting for build tool");
                    CommandStatus::Failed(-1)
                }
            };
            debug!(command = %label, ?status, "build tool exited");
            let _ = events.send(EngineEvent::CommandExited {
                id,
                description: label,
                status,
            });
        });

        self.running.insert(
            id,
            RunningCommand {
                description: description.to_string(),
                pgid,
                handle,
            },
        );
        Ok(id)
    }

    /// Forget a process that reported its exit. Returns its description.
    pub fn finished(&mut self, id: u64) -> Option<String> {
        self.running.remove(&id).map(|r| r.description)
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    /// Kill every tracked process together with its process group.
    pub fn kill_all(&mut self) {
        for (_, cmd) in self.running.drain() {
            debug!(command = %cmd.description, pgid = ?cmd.pgid, "killing build tool");
            if let Some(pgid) = cmd.pgid {
                if let Err(err) = kill_process_group(pgid) {
                    warn!(command = %cmd.description, error = %err, "failed to kill process group");
                }
            }
            // Aborting drops the child; `kill_on_drop` covers the leader.
            cmd.handle.abort();
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) -> io::Result<()> {
    let result = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
    if result == -1 {
        let err = io::Error::last_os_error();
        // Group already gone.
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) -> io::Result<()> {
    Ok(())
}

impl Drop for ProcessTracker {
    fn drop(&mut self) {
        self.kill_all();
    }
}
