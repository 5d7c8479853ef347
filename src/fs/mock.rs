// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MAX_LINK_HOPS: usize = 32;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
    Symlink(PathBuf),
}

/// In-memory filesystem for tests.
///
/// Directories are created implicitly for every added file. Symlinks are
/// resolved on lookup, so a link to a directory can be walked and a link
/// whose target is missing behaves like a dangling link.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure both relative and absolute roots exist
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));
        files.insert(PathBuf::from("/"), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        files.insert(path.clone(), MockEntry::File(content.into()));
        Self::link_into_parent(&mut files, &path);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    pub fn add_symlink(&self, link: impl AsRef<Path>, target: impl AsRef<Path>) {
        let link = link.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        files.insert(link.clone(), MockEntry::Symlink(target.as_ref().to_path_buf()));
        Self::link_into_parent(&mut files, &link);
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut files = self.files.lock().unwrap();
        files.remove(path);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            let parent = normalize_parent(parent);
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                let name = name.to_string_lossy();
                children.retain(|c| *c != name);
            }
        }
    }

    fn link_into_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        let parent = normalize_parent(parent);
        Self::ensure_dir_entry(files, parent);
        if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = path.parent() {
            let parent = normalize_parent(parent);
            if parent != path {
                Self::link_into_parent(files, path);
            }
        }
    }

    /// Follow symlinks in every component of `path`.
    fn resolve(files: &HashMap<PathBuf, MockEntry>, path: &Path) -> PathBuf {
        let mut current = path.to_path_buf();
        for _ in 0..MAX_LINK_HOPS {
            let mut replaced = None;
            for ancestor in current.ancestors() {
                if let Some(MockEntry::Symlink(target)) = files.get(ancestor) {
                    let rest = current.strip_prefix(ancestor).unwrap_or(Path::new(""));
                    replaced = Some(if rest.as_os_str().is_empty() {
                        target.clone()
                    } else {
                        target.join(rest)
                    });
                    break;
                }
            }
            match replaced {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }

    fn lookup(&self, path: &Path) -> Option<MockEntry> {
        let files = self.files.lock().unwrap();
        let resolved = Self::resolve(&files, path);
        files.get(&resolved).cloned()
    }
}

fn normalize_parent(parent: &Path) -> &Path {
    if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lookup(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        match self.lookup(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content))),
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lookup(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lookup(path), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        let own = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => Self::resolve(&files, parent).join(name),
            _ => path.to_path_buf(),
        };
        matches!(files.get(&own), Some(MockEntry::Symlink(_)))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let files = self.files.lock().unwrap();
        let resolved = Self::resolve(&files, path);
        if files.contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(anyhow!("File not found: {:?}", path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lookup(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symlinked_dir_is_walkable_but_is_a_symlink() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/real/a.txt", "a");
        fs.add_symlink("/p/link", "/p/real");

        assert!(fs.is_symlink(Path::new("/p/link")));
        assert!(fs.is_dir(Path::new("/p/link")));
        assert!(!fs.is_symlink(Path::new("/p/real")));
        assert_eq!(
            fs.read_dir(Path::new("/p/link")).unwrap(),
            vec![PathBuf::from("/p/link/a.txt")]
        );
        assert!(fs.is_file(Path::new("/p/link/a.txt")));
        assert_eq!(
            fs.canonicalize(Path::new("/p/link")).unwrap(),
            PathBuf::from("/p/real")
        );
    }

    #[test]
    fn removed_files_disappear_from_parent() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.txt", "a");
        fs.remove("/p/a.txt");
        assert!(!fs.exists(Path::new("/p/a.txt")));
        assert!(fs.read_dir(Path::new("/p")).unwrap().is_empty());
    }
}
