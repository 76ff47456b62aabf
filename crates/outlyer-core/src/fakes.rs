//! In-memory file store (testing only)
//!
//! `MemoryFileStore` mimics a POSIX tree closely enough for the resolver and
//! the orchestrator: writes need an existing parent, `make_dirs` creates
//! every ancestor, and paths under a denied prefix refuse writes.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::store::{FileStore, StoreResult};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    denied: Vec<String>,
}

/// In-memory tree backed by `BTreeMap<path, bytes>` and `BTreeSet<dir>`.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    tree: Mutex<Tree>,
}

/// Strip `./` prefixes, duplicate and trailing slashes.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let joined = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

impl Tree {
    fn add_dirs(&mut self, path: &str) {
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.is_empty() {
                break;
            }
            self.dirs.insert(dir.to_string());
            current = parent_of(dir);
        }
    }

    fn is_denied(&self, path: &str) -> bool {
        self.denied
            .iter()
            .any(|prefix| path == prefix || path.starts_with(&format!("{prefix}/")))
    }
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories.
    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        {
            let path = normalize(path);
            let mut tree = self.tree.lock().unwrap();
            if let Some(parent) = parent_of(&path) {
                tree.add_dirs(parent);
            }
            tree.files.insert(path, data.into());
        }
        self
    }

    /// Seed an empty directory.
    pub fn with_dir(self, path: &str) -> Self {
        self.tree.lock().unwrap().add_dirs(&normalize(path));
        self
    }

    /// Refuse writes and directory creation at or below `prefix`.
    pub fn deny_writes(self, prefix: &str) -> Self {
        self.tree.lock().unwrap().denied.push(normalize(prefix));
        self
    }

    /// Content of a file, if present.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.tree.lock().unwrap().files.get(&normalize(path)).cloned()
    }

    /// Every file path, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        self.tree.lock().unwrap().files.keys().cloned().collect()
    }
}

impl FileStore for MemoryFileStore {
    fn exists(&self, path: &str) -> bool {
        let path = normalize(path);
        let tree = self.tree.lock().unwrap();
        path.is_empty() || tree.files.contains_key(&path) || tree.dirs.contains(&path)
    }

    fn is_dir(&self, path: &str) -> bool {
        let path = normalize(path);
        path.is_empty() || self.tree.lock().unwrap().dirs.contains(&path)
    }

    fn list_children(&self, path: &str) -> StoreResult<Vec<String>> {
        let dir = normalize(path);
        let tree = self.tree.lock().unwrap();
        if !dir.is_empty() && !tree.dirs.contains(&dir) {
            return Err(StoreError::new("list", path, ErrorKind::NotFound.into()));
        }

        let children: BTreeSet<String> = tree
            .files
            .keys()
            .chain(tree.dirs.iter())
            .filter(|p| parent_of(p).unwrap_or("") == dir)
            .map(|p| p.rsplit('/').next().unwrap_or(p.as_str()).to_string())
            .collect();
        Ok(children.into_iter().collect())
    }

    fn read_file(&self, path: &str) -> StoreResult<Vec<u8>> {
        let tree = self.tree.lock().unwrap();
        let normalized = normalize(path);
        if tree.dirs.contains(&normalized) {
            return Err(StoreError::new(
                "read",
                path,
                std::io::Error::new(ErrorKind::Other, "is a directory"),
            ));
        }
        tree.files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| StoreError::new("read", path, ErrorKind::NotFound.into()))
    }

    fn write_file(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let normalized = normalize(path);
        let mut tree = self.tree.lock().unwrap();
        if tree.is_denied(&normalized) {
            return Err(StoreError::new("write", path, ErrorKind::PermissionDenied.into()));
        }
        if let Some(parent) = parent_of(&normalized) {
            if !parent.is_empty() && !tree.dirs.contains(parent) {
                return Err(StoreError::new("write", path, ErrorKind::NotFound.into()));
            }
        }
        tree.files.insert(normalized, data.to_vec());
        Ok(())
    }

    fn make_dirs(&self, path: &str) -> StoreResult<()> {
        let normalized = normalize(path);
        let mut tree = self.tree.lock().unwrap();
        if tree.is_denied(&normalized) {
            return Err(StoreError::new(
                "create directory",
                path,
                ErrorKind::PermissionDenied.into(),
            ));
        }
        tree.add_dirs(&normalized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_tree() {
        let store = MemoryFileStore::new()
            .with_file("dir1/alerts/docker.yaml", "name: docker")
            .with_file("dir1/checks/docker.yaml", "name: docker");

        assert!(store.is_dir("dir1"));
        assert!(store.is_dir("./dir1/alerts/"));
        assert!(store.exists("dir1/alerts/docker.yaml"));
        assert!(!store.is_dir("dir1/alerts/docker.yaml"));
        assert_eq!(
            store.list_children("dir1").unwrap(),
            vec!["alerts".to_string(), "checks".to_string()]
        );
    }

    #[test]
    fn test_write_requires_parent() {
        let store = MemoryFileStore::new();
        assert!(store.write_file("out/alerts/a.yaml", b"x").is_err());

        store.make_dirs("out/alerts").unwrap();
        store.write_file("out/alerts/a.yaml", b"x").unwrap();
        assert_eq!(store.file("out/alerts/a.yaml").unwrap(), b"x");
    }

    #[test]
    fn test_denied_prefix() {
        let store = MemoryFileStore::new().deny_writes("locked");
        assert!(store.make_dirs("locked/alerts").is_err());
        assert!(store.make_dirs("open/alerts").is_ok());
    }

    #[test]
    fn test_absolute_paths() {
        let store = MemoryFileStore::new().with_file("/tmp/x/plugins/a.py", "print()");
        assert!(store.is_dir("/tmp/x"));
        assert_eq!(
            store.list_children("/tmp/x/plugins").unwrap(),
            vec!["a.py".to_string()]
        );
    }
}
