// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::errors::Result;

use super::core::Engine;
use super::{CoreCommand, EngineEvent, EngineStep};

/// Async shell around [`Engine`].
///
/// Owns both ends of the engine's event channel. A deferred flush is just a
/// [`EngineEvent::Flush`] posted to the back of the channel, so every event
/// already queued (the rest of a scan, a burst of file changes) is handled
/// before the batch runs.
pub struct Runtime {
    engine: Engine,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    event_rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// `event_tx` must be the sender half of `event_rx`, the same one the
    /// engine was built with.
    pub fn new(
        engine: Engine,
        event_tx: mpsc::UnboundedSender<EngineEvent>,
        event_rx: mpsc::UnboundedReceiver<EngineEvent>,
    ) -> Self {
        Self {
            engine,
            event_tx,
            event_rx,
        }
    }

    /// Main event loop. Returns when the engine asks to stop; the first
    /// engine error ends the loop and is returned.
    pub async fn run(mut self) -> Result<()> {
        info!("rulewatch runtime started");

        // Work queued before the loop started (the initial scan).
        let initial = self.engine.next_step(true);
        if !self.apply(initial) {
            info!("nothing to do; runtime exiting");
            return Ok(());
        }

        while let Some(event) = self.event_rx.recv().await {
            trace!(?event, "runtime received event");
            let step = self.engine.step(event)?;
            if !self.apply(step) {
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Carry out the core's commands. Returns whether to keep running.
    fn apply(&mut self, step: EngineStep) -> bool {
        for command in step.commands {
            match command {
                CoreCommand::ScheduleFlush => {
                    debug!("flush scheduled");
                    // The receiver lives in `self`, so this cannot fail.
                    let _ = self.event_tx.send(EngineEvent::Flush);
                }
                CoreCommand::RequestExit => info!("build idle; exiting"),
            }
        }
        step.keep_running
    }
}
