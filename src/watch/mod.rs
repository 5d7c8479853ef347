// src/watch/mod.rs

//! Directory scanning and change watching.
//!
//! - [`scanner`] walks a directory tree once and lists the files to submit.
//! - [`watcher`] installs recursive watches (one per directory) and turns
//!   filesystem events into [`crate::engine::EngineEvent::PathChanged`].
//!
//! Neither knows about rules; the engine feeds their output through the
//! rule table.

pub mod path_utils;
pub mod scanner;
pub mod watcher;

pub use scanner::walk_files;
pub use watcher::{NotifyWatchBackend, WatchBackend, WatchId, WatchRegistry};
