// src/backend/disk.rs

//! Local filesystem backend.
//!
//! Backend paths resolve against a root directory. JSON writes go
//! through a temp file and an atomic rename so a crash mid-write never
//! leaves a truncated document behind.

use crate::backend::{Backend, ListKind};
use crate::error::{Error, Result};
use crate::hash;
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Storage backend rooted at a local directory
#[derive(Debug, Clone)]
pub struct DiskBackend {
    root: PathBuf,
}

impl DiskBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a backend path against the root. Absolute paths pass
    /// through untouched, matching `PathBuf::join` semantics.
    fn subpath(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn ensure_parent_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl Backend for DiskBackend {
    fn read_json(&self, path: &str) -> Result<Value> {
        let full = self.subpath(path);
        let data = match fs::read(&full) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Missing(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data).map_err(|source| Error::Json {
            path: path.to_string(),
            source,
        })
    }

    fn write_json(&self, doc: &Value, path: &str) -> Result<()> {
        let full = self.subpath(path);
        Self::ensure_parent_dir(&full)?;

        // Write to a temp file, then rename into place.
        let temp = full.with_extension("tmp");
        let data = serde_json::to_vec(doc).map_err(|source| Error::Json {
            path: path.to_string(),
            source,
        })?;
        let mut file = fs::File::create(&temp)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, &full)?;
        Ok(())
    }

    fn list_dir(&self, path: &str, kind: ListKind) -> Result<Vec<String>> {
        let full = self.subpath(path);
        let entries = match fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Missing(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let keep = match kind {
                ListKind::All => true,
                ListKind::Dirs => file_type.is_dir(),
                ListKind::Files => file_type.is_file(),
            };
            if keep {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn upload_file(&self, src: &Path, dest: &str) -> Result<()> {
        let full = self.subpath(dest);
        Self::ensure_parent_dir(&full)?;
        fs::copy(src, &full)?;
        Ok(())
    }

    fn delete_file(&self, path: &str) -> Result<()> {
        match fs::remove_file(self.subpath(path)) {
            Ok(()) => Ok(()),
            // Idempotent: the file being gone is the goal state.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn hash_of(&self, path: &str) -> Result<Option<String>> {
        let full = self.subpath(path);
        match fs::File::open(&full) {
            Ok(mut file) => Ok(Some(hash::md5_reader(&mut file)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn backend() -> (TempDir, DiskBackend) {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());
        (dir, backend)
    }

    #[test]
    fn test_json_roundtrip() {
        let (_dir, backend) = backend();
        let doc = json!({"base_url": "https://example.com/", "n": 3});
        backend.write_json(&doc, "sub/config.json").unwrap();
        assert_eq!(backend.read_json("sub/config.json").unwrap(), doc);
    }

    #[test]
    fn test_read_missing_json() {
        let (_dir, backend) = backend();
        let err = backend.read_json("nope.json").unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_write_json_leaves_no_temp_file() {
        let (dir, backend) = backend();
        backend.write_json(&json!({"a": 1}), "doc.json").unwrap();
        assert!(dir.path().join("doc.json").exists());
        assert!(!dir.path().join("doc.tmp").exists());
    }

    #[test]
    fn test_list_dir_kinds() {
        let (dir, backend) = backend();
        fs::create_dir(dir.path().join("mac")).unwrap();
        fs::create_dir(dir.path().join("linux")).unwrap();
        fs::write(dir.path().join("config.json"), b"{}").unwrap();

        assert_eq!(
            backend.list_dir("", ListKind::Dirs).unwrap(),
            vec!["linux", "mac"]
        );
        assert_eq!(
            backend.list_dir("", ListKind::Files).unwrap(),
            vec!["config.json"]
        );
        assert_eq!(backend.list_dir("", ListKind::All).unwrap().len(), 3);
    }

    #[test]
    fn test_list_missing_dir() {
        let (_dir, backend) = backend();
        assert!(backend.list_dir("ghost", ListKind::All).unwrap_err().is_missing());
    }

    #[test]
    fn test_upload_and_hash() {
        let (dir, backend) = backend();
        let local = dir.path().join("local.bin");
        fs::write(&local, b"hello world").unwrap();

        backend.upload_file(&local, "storage/abc-local.bin").unwrap();
        assert_eq!(
            backend.hash_of("storage/abc-local.bin").unwrap().as_deref(),
            Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
        );
        assert_eq!(backend.hash_of("storage/ghost").unwrap(), None);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (dir, backend) = backend();
        fs::write(dir.path().join("f"), b"x").unwrap();
        backend.delete_file("f").unwrap();
        backend.delete_file("f").unwrap();
        assert!(!dir.path().join("f").exists());
    }

    #[test]
    fn test_hash_dir_is_single_level() {
        let (dir, backend) = backend();
        fs::create_dir_all(dir.path().join("storage/deep")).unwrap();
        fs::write(dir.path().join("storage/a"), b"one").unwrap();
        fs::write(dir.path().join("storage/b"), b"two").unwrap();
        fs::write(dir.path().join("storage/deep/c"), b"three").unwrap();

        let map = backend.hash_dir("storage").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get(&hash::md5_bytes(b"one")).map(String::as_str),
            Some("storage/a")
        );
        assert!(!map.values().any(|p| p.ends_with("c")));
    }
}
