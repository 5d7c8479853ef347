// src/exec/mod.rs

//! Task execution side effects.
//!
//! - [`builtin`] holds the task handlers rules can name (`copy`, `command`,
//!   `reload`, `manifest`).
//! - [`process`] starts external build tools with `tokio::process::Command`
//!   and reports their exit back to the engine as an
//!   [`crate::engine::EngineEvent::CommandExited`].

pub mod builtin;
pub mod process;

pub use builtin::register_builtins;
pub use process::{CommandStatus, ProcessTracker};
