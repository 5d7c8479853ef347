// src/watch/path_utils.rs

use std::path::Path;

/// `path` relative to `root`, with forward slashes.
///
/// Tries a plain `strip_prefix` first. Watch backends may report paths
/// under a different absolute prefix for the same directory (macOS
/// `/private/var`, symlinked checkouts), so on failure both sides are
/// canonicalized and compared again.
///
/// Returns `None` when `path` is not under `root`, and for `root` itself.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return non_empty(rel);
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return non_empty(rel);
        }
    }

    None
}

fn non_empty(rel: &Path) -> Option<String> {
    let s = rel.to_string_lossy().replace('\\', "/");
    (!s.is_empty()).then_some(s)
}
