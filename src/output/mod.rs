// src/output/mod.rs

//! The output tree as seen from the outside: artifact listing, the
//! completion gate, and the versioned manifest.

pub mod gate;
pub mod manifest;

pub use gate::{is_complete, list_artifacts, wait_for_completion};
pub use manifest::{build_manifest, write_manifest, Manifest};
