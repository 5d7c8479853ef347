// src/tasks/mod.rs

//! Deferred, identity-deduplicated units of build work.
//!
//! - [`task`]: the immutable [`Task`] and its [`TaskId`].
//! - [`queue`]: the pending queue with batch snapshots and progress counters.
//! - [`registry`]: named task handlers and the context they run with.

pub mod queue;
pub mod registry;
pub mod task;

pub use queue::{QueueStats, TaskQueue};
pub use registry::{HandlerRegistry, TaskContext, TaskHandler};
pub use task::{HandlerName, Task, TaskArg, TaskId};
