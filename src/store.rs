// src/store.rs

//! Content-addressed blob storage.
//!
//! All update files for a collection live flat in one storage
//! directory, named `<hash>-<basename>`. The name is self-verifying and
//! collision-free for differing content, which makes deduplication a
//! pure hash lookup: a file byte-identical to anything already stored
//! is never uploaded again.
//!
//! The hash index is built lazily on first use by hashing every file
//! directly under the storage root, then cached for the lifetime of the
//! process. It is never persisted and never auto-refreshed: a later
//! process picks up externally made changes, the same process will not.
//! Cross-process write races are explicitly unguarded; exclusivity is
//! an operator responsibility.

use crate::backend::{Backend, basename, join_path, url_join};
use crate::error::{Error, Result};
use crate::hash;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Outcome of [`ContentStore::put`]
#[derive(Debug, Clone)]
pub struct Stored {
    /// Backend path of the blob
    pub location: String,
    /// Content hash of the file
    pub hash: String,
    /// True if the call uploaded the file, false on a dedup hit
    pub uploaded: bool,
}

/// Deduplicating, content-addressed store over a [`Backend`]
#[derive(Debug)]
pub struct ContentStore {
    /// Storage root, as a backend path
    path: String,
    /// Public base URL blobs are served from
    url: String,
    /// Lazy hash → location index; `None` until first needed
    index: Option<HashMap<String, String>>,
}

impl ContentStore {
    pub fn new(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            index: None,
        }
    }

    /// Storage root path on the backend
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Public base URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn index(&mut self, backend: &dyn Backend) -> Result<&mut HashMap<String, String>> {
        if self.index.is_none() {
            debug!("building content index for '{}'", self.path);
            let map = match backend.hash_dir(&self.path) {
                Ok(map) => map,
                // No storage directory yet means no blobs yet.
                Err(Error::Missing(_)) => HashMap::new(),
                Err(e) => return Err(e),
            };
            debug!("content index holds {} blobs", map.len());
            self.index = Some(map);
        }
        Ok(self.index.get_or_insert_with(HashMap::new))
    }

    /// Find the stored location of a blob with the given content hash
    pub fn locate(&mut self, backend: &dyn Backend, hash: &str) -> Result<Option<String>> {
        Ok(self.index(backend)?.get(hash).cloned())
    }

    /// Add a local file to storage, deduplicating by content hash.
    ///
    /// If a blob with the same hash is already indexed, its location is
    /// returned and nothing is uploaded.
    pub fn put(&mut self, backend: &dyn Backend, local: &Path) -> Result<Stored> {
        let digest = hash::md5_file(local)?;
        if let Some(existing) = self.locate(backend, &digest)? {
            debug!("dedup hit for {}: {}", local.display(), existing);
            return Ok(Stored {
                location: existing,
                hash: digest,
                uploaded: false,
            });
        }

        let name = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidFileName(local.display().to_string()))?;
        let dest = join_path(&self.path, &format!("{digest}-{name}"));

        info!("uploading {} to {}", local.display(), dest);
        backend.upload_file(local, &dest)?;
        if let Some(index) = self.index.as_mut() {
            index.insert(digest.clone(), dest.clone());
        }
        Ok(Stored {
            location: dest,
            hash: digest,
            uploaded: true,
        })
    }

    /// Delete a blob by basename and drop it from the index if loaded
    pub fn remove(&mut self, backend: &dyn Backend, name: &str) -> Result<()> {
        info!("removing blob {}", name);
        backend.delete_file(&join_path(&self.path, name))?;
        if let Some(index) = self.index.as_mut() {
            index.retain(|_, location| basename(location) != name);
        }
        Ok(())
    }

    /// Basenames of every blob currently in storage.
    ///
    /// Always asks the backend; the answer is never cached.
    pub fn list_all(&self, backend: &dyn Backend) -> Result<BTreeSet<String>> {
        match backend.list_dir(&self.path, crate::backend::ListKind::Files) {
            Ok(names) => Ok(names.into_iter().collect()),
            Err(Error::Missing(_)) => Ok(BTreeSet::new()),
            Err(e) => Err(e),
        }
    }

    /// Public download URL for a stored blob location
    pub fn public_url(&self, location: &str) -> String {
        let rel = location
            .strip_prefix(&self.path)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(location);
        url_join(&self.url, rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DiskBackend;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DiskBackend, ContentStore) {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());
        let store = ContentStore::new("storage", "https://dl.example.com/files/");
        (dir, backend, store)
    }

    fn write_local(dir: &TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_put_names_blob_by_hash() {
        let (dir, backend, mut store) = setup();
        let local = write_local(&dir, "app", b"hello world");

        let stored = store.put(&backend, &local).unwrap();
        assert!(stored.uploaded);
        assert_eq!(
            stored.location,
            "storage/5eb63bbbe01eeed093cb22bb8f5acdc3-app"
        );
        assert!(dir
            .path()
            .join("storage/5eb63bbbe01eeed093cb22bb8f5acdc3-app")
            .exists());
    }

    #[test]
    fn test_put_identical_content_uploads_once() {
        let (dir, backend, mut store) = setup();
        let f1 = write_local(&dir, "one", b"same bytes");
        let f2 = write_local(&dir, "two", b"same bytes");

        let first = store.put(&backend, &f1).unwrap();
        let second = store.put(&backend, &f2).unwrap();

        assert!(first.uploaded);
        assert!(!second.uploaded);
        assert_eq!(first.location, second.location);
        assert_eq!(store.list_all(&backend).unwrap().len(), 1);
    }

    #[test]
    fn test_cold_index_sees_existing_blobs() {
        let (dir, backend, mut store) = setup();
        let local = write_local(&dir, "app", b"payload");
        store.put(&backend, &local).unwrap();

        // A fresh store instance must rediscover the blob by rescanning.
        let mut cold = ContentStore::new("storage", "https://dl.example.com/files/");
        let hash = hash::md5_bytes(b"payload");
        let found = cold.locate(&backend, &hash).unwrap();
        assert_eq!(found.as_deref(), Some(&*format!("storage/{hash}-app")));
    }

    #[test]
    fn test_warm_index_ignores_external_changes() {
        let (dir, backend, mut store) = setup();
        let local = write_local(&dir, "app", b"payload");

        // Force the index to build while storage is empty.
        assert_eq!(store.locate(&backend, "0000").unwrap(), None);

        // A blob added behind the store's back is invisible to locate...
        let hash = hash::md5_bytes(b"payload");
        fs::create_dir_all(dir.path().join("storage")).unwrap();
        fs::copy(&local, dir.path().join(format!("storage/{hash}-app"))).unwrap();
        assert_eq!(store.locate(&backend, &hash).unwrap(), None);

        // ...but list_all is backend-authoritative.
        assert_eq!(store.list_all(&backend).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_drops_blob_and_index_entry() {
        let (dir, backend, mut store) = setup();
        let local = write_local(&dir, "app", b"payload");
        let stored = store.put(&backend, &local).unwrap();
        let name = basename(&stored.location).to_string();

        store.remove(&backend, &name).unwrap();
        assert!(store.list_all(&backend).unwrap().is_empty());
        let hash = hash::md5_bytes(b"payload");
        assert_eq!(store.locate(&backend, &hash).unwrap(), None);
    }

    #[test]
    fn test_list_all_empty_when_storage_missing() {
        let (_dir, backend, store) = setup();
        assert!(store.list_all(&backend).unwrap().is_empty());
    }

    #[test]
    fn test_public_url() {
        let (_dir, _backend, store) = setup();
        assert_eq!(
            store.public_url("storage/abc-app"),
            "https://dl.example.com/files/abc-app"
        );
    }
}
