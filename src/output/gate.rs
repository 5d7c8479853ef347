// src/output/gate.rs

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::watch::path_utils::relative_str;

/// Every regular file under `out_dir`, as forward-slash paths relative to it.
///
/// A missing output directory lists as empty.
pub fn list_artifacts(fs: &dyn FileSystem, out_dir: &Path) -> Result<BTreeSet<String>> {
    let mut found = BTreeSet::new();
    if !fs.is_dir(out_dir) {
        return Ok(found);
    }

    let mut stack = vec![out_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_symlink(&path) {
                continue;
            }
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel) = relative_str(out_dir, &path) {
                    found.insert(rel);
                }
            }
        }
    }
    Ok(found)
}

/// True when every name in `required` currently exists under `out_dir`.
///
/// Existence only; contents are not inspected.
pub fn is_complete<S: AsRef<str>>(
    fs: &dyn FileSystem,
    out_dir: &Path,
    required: &[S],
) -> Result<bool> {
    let artifacts = list_artifacts(fs, out_dir)?;
    let missing: Vec<&str> = required
        .iter()
        .map(|r| r.as_ref())
        .filter(|r| !artifacts.contains(*r))
        .collect();
    if !missing.is_empty() {
        debug!(?missing, "build not complete yet");
    }
    Ok(missing.is_empty())
}

/// Poll [`is_complete`] every `interval` until it returns true.
pub async fn wait_for_completion(
    fs: Arc<dyn FileSystem>,
    out_dir: &Path,
    required: &[String],
    interval: Duration,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if is_complete(fs.as_ref(), out_dir, required)? {
            info!(required = required.len(), "initial build complete");
            return Ok(());
        }
    }
}
