//! Local file store.
//!
//! The resolver and the orchestrator only touch the filesystem through
//! [`FileStore`]. Paths are plain strings, relative to the working
//! directory unless absolute.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Result type for file store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Filesystem capability used by apply and export.
pub trait FileStore: Send + Sync {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &str) -> bool;

    /// Names of the immediate children of a directory, sorted.
    fn list_children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Read a whole file.
    fn read_file(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Replace the content of a file. The parent directory must exist.
    fn write_file(&self, path: &str, data: &[u8]) -> StoreResult<()>;

    /// Create a directory and all missing parents.
    fn make_dirs(&self, path: &str) -> StoreResult<()>;
}

/// `dir/name` without doubling the separator.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        LocalFileStore
    }
}

impl FileStore for LocalFileStore {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn is_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn list_children(&self, path: &str) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(path).map_err(|e| StoreError::new("list", path, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::new("list", path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read_file(&self, path: &str) -> StoreResult<Vec<u8>> {
        fs::read(path).map_err(|e| StoreError::new("read", path, e))
    }

    fn write_file(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let target = Path::new(path);
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Atomic write: temp file in the same directory, then rename over the target.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::new("write", path, e))?;
        tmp.write_all(data)
            .map_err(|e| StoreError::new("write", path, e))?;
        tmp.persist(target)
            .map_err(|e| StoreError::new("write", path, e.error))?;
        Ok(())
    }

    fn make_dirs(&self, path: &str) -> StoreResult<()> {
        if path.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(path).map_err(|e| StoreError::new("create directory", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(dir: &tempfile::TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "alerts"), "alerts");
        assert_eq!(join("demo", "alerts"), "demo/alerts");
        assert_eq!(join("demo/", "alerts"), "demo/alerts");
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new();
        let path = join(&root(&dir), "docker.yaml");

        store.write_file(&path, b"name: docker\n").unwrap();
        assert!(store.exists(&path));
        assert!(!store.is_dir(&path));
        assert_eq!(store.read_file(&path).unwrap(), b"name: docker\n");
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new();
        let path = join(&root(&dir), "docker.yaml");

        store.write_file(&path, b"old").unwrap();
        store.write_file(&path, b"new").unwrap();
        assert_eq!(store.read_file(&path).unwrap(), b"new");
    }

    #[test]
    fn test_make_dirs_and_list_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new();
        let alerts = join(&root(&dir), "a/b/alerts");

        store.make_dirs(&alerts).unwrap();
        store.write_file(&join(&alerts, "zeta.yaml"), b"").unwrap();
        store.write_file(&join(&alerts, "alpha.yaml"), b"").unwrap();

        assert!(store.is_dir(&alerts));
        assert_eq!(
            store.list_children(&alerts).unwrap(),
            vec!["alpha.yaml".to_string(), "zeta.yaml".to_string()]
        );
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFileStore::new()
            .read_file(&join(&root(&dir), "missing.yaml"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_without_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = join(&root(&dir), "no/such/dir/docker.yaml");
        assert!(LocalFileStore::new().write_file(&path, b"x").is_err());
    }
}
