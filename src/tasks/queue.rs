// src/tasks/queue.rs

use std::collections::HashSet;
use std::mem;

use tracing::{debug, trace};

use crate::tasks::task::{HandlerName, Task, TaskArg, TaskId};

/// Pending task queue with identity-based deduplication and a one-shot flush
/// flag.
///
/// Semantics:
/// - `enqueue` is idempotent by [`TaskId`] while the task is pending.
/// - The first enqueue after a flush arms the flush and raises a schedule
///   request; the owner turns that into a deferred `Flush` on the next turn
///   of its event loop, so a synchronous burst of enqueues coalesces.
/// - `take_batch` snapshots and clears the pending queue atomically. Tasks
///   enqueued while that snapshot executes land in the next batch.
#[derive(Debug, Default)]
pub struct TaskQueue {
    pending: Vec<Task>,
    pending_ids: HashSet<TaskId>,
    flush_armed: bool,
    schedule_requested: bool,
    enqueued_total: u64,
    run_total: u64,
}

/// Progress counters, used only for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub enqueued: u64,
    pub run: u64,
    pub pending: usize,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `handler(args)` unless an identical task is already pending.
    ///
    /// Returns `true` if the task was newly queued.
    pub fn enqueue(&mut self, handler: impl Into<HandlerName>, args: Vec<TaskArg>) -> bool {
        self.push(Task::new(handler, args))
    }

    /// Queue an already-built task. Same semantics as [`TaskQueue::enqueue`].
    pub fn push(&mut self, task: Task) -> bool {
        if !self.pending_ids.insert(task.id()) {
            trace!(task = %task.describe(), "duplicate task ignored");
            return false;
        }

        debug!(task = %task.describe(), id = %task.id(), "task enqueued");
        self.pending.push(task);
        self.enqueued_total += 1;

        if !self.flush_armed {
            self.flush_armed = true;
            self.schedule_requested = true;
        }
        true
    }

    /// Returns (and clears) the request to schedule a deferred flush.
    pub fn take_schedule_request(&mut self) -> bool {
        mem::take(&mut self.schedule_requested)
    }

    /// Whether a flush is armed and not yet executed.
    pub fn flush_armed(&self) -> bool {
        self.flush_armed
    }

    /// Snapshot and clear the pending queue, in enqueue order.
    pub fn take_batch(&mut self) -> Vec<Task> {
        self.flush_armed = false;
        self.pending_ids.clear();
        mem::take(&mut self.pending)
    }

    /// Record that one task from a batch ran.
    pub fn mark_run(&mut self) {
        self.run_total += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.enqueued_total,
            run: self.run_total,
            pending: self.pending.len(),
        }
    }
}
