// src/watch/scanner.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::rules::Pattern;
use crate::watch::path_utils::relative_str;

/// Every regular file under `dir` whose path relative to `dir` satisfies
/// `filter` (all files when `None`), sorted.
///
/// Symlinked directories are walked; each real directory is visited at
/// most once, so link cycles terminate. A symlink is never reported as a
/// file itself.
pub fn walk_files(fs: &dyn FileSystem, dir: &Path, filter: Option<&Pattern>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let canonical = fs.canonicalize(&current).unwrap_or_else(|_| current.clone());
        if !visited.insert(canonical) {
            trace!(dir = ?current, "directory already visited");
            continue;
        }

        for entry in fs.read_dir(&current)? {
            if fs.is_dir(&entry) {
                stack.push(entry);
                continue;
            }
            if fs.is_symlink(&entry) || !fs.is_file(&entry) {
                continue;
            }
            if let Some(filter) = filter {
                let accepted = relative_str(dir, &entry).is_some_and(|rel| filter.is_match(&rel));
                if !accepted {
                    trace!(path = ?entry, "rejected by scan filter");
                    continue;
                }
            }
            files.push(entry);
        }
    }

    files.sort();
    debug!(dir = ?dir, files = files.len(), "directory walked");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn paths(v: &[&str]) -> Vec<PathBuf> {
        v.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn walks_nested_dirs_in_sorted_order() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/b.css", "");
        fs.add_file("/p/src/a/x.ts", "");
        fs.add_file("/p/other.txt", "");

        let found = walk_files(&fs, Path::new("/p/src"), None).unwrap();
        assert_eq!(found, paths(&["/p/src/a/x.ts", "/p/src/b.css"]));
    }

    #[test]
    fn filter_sees_paths_relative_to_scanned_dir() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/app.css", "");
        fs.add_file("/p/src/app.ts", "");

        let filter = Pattern::suffix(".css");
        let found = walk_files(&fs, Path::new("/p/src"), Some(&filter)).unwrap();
        assert_eq!(found, paths(&["/p/src/app.css"]));
    }

    #[test]
    fn symlinked_dirs_are_followed_but_file_links_are_not_files() {
        let fs = MockFileSystem::new();
        fs.add_file("/shared/logo.png", "png");
        fs.add_file("/p/assets/own.png", "png");
        fs.add_symlink("/p/assets/shared", "/shared");
        fs.add_symlink("/p/assets/alias.png", "/p/assets/own.png");

        let found = walk_files(&fs, Path::new("/p/assets"), None).unwrap();
        assert_eq!(found, paths(&["/p/assets/own.png", "/p/assets/shared/logo.png"]));
    }

    #[test]
    fn link_cycles_terminate() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a/f.txt", "");
        fs.add_symlink("/p/a/loop", "/p/a");

        let found = walk_files(&fs, Path::new("/p/a"), None).unwrap();
        assert_eq!(found, paths(&["/p/a/f.txt"]));
    }
}
