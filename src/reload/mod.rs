// src/reload/mod.rs

//! Live reload: a broadcast of changed output paths to connected browsers.

pub mod hub;
pub mod server;

pub use hub::{ClientHandle, LiveReloadHub};
pub use server::{spawn_reload_server, sse_frame};
