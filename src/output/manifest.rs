// src/output/manifest.rs

//! Versioned manifest of the output bundle.
//!
//! Maps every artifact to the first 8 hex characters of its blake3 content
//! hash, for cache busting.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::output::gate::list_artifacts;

const VERSION_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: BTreeMap<String, String>,
}

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Build the manifest for `out_dir`, leaving out the manifest file itself.
pub fn build_manifest(fs: &dyn FileSystem, out_dir: &Path, manifest_name: &str) -> Result<Manifest> {
    let mut files = BTreeMap::new();
    for rel in list_artifacts(fs, out_dir)? {
        if rel == manifest_name {
            continue;
        }
        let hash = compute_file_hash(fs, &out_dir.join(&rel))?;
        files.insert(rel, hash[..VERSION_LEN].to_string());
    }
    Ok(Manifest { files })
}

/// Regenerate `<out_dir>/<manifest_name>`.
///
/// The file is only written when its content would change, so a rule that
/// regenerates the manifest on output-tree changes settles instead of
/// looping. Returns whether the file was written.
pub fn write_manifest(fs: &dyn FileSystem, out_dir: &Path, manifest_name: &str) -> Result<bool> {
    let manifest = build_manifest(fs, out_dir, manifest_name)?;
    let mut rendered = serde_json::to_string_pretty(&manifest).context("serializing manifest")?;
    rendered.push('\n');

    let target = out_dir.join(manifest_name);
    if fs.is_file(&target) {
        if let Ok(existing) = fs.read_to_string(&target) {
            if existing == rendered {
                debug!(path = ?target, "manifest unchanged");
                return Ok(false);
            }
        }
    }

    fs.write(&target, rendered.as_bytes())?;
    info!(path = ?target, files = manifest.files.len(), "manifest written");
    Ok(true)
}
