// src/repo/collection.rs

//! The root of one repository instance.
//!
//! A collection is a directory holding `config.json`, one subdirectory
//! per platform, and the blob storage directory. Platforms are
//! discovered by listing directories, never declared, and the listing
//! is taken fresh on every call; only the content store's hash index
//! is cached for the process.

use crate::backend::{Backend, ListKind, join_path, read_doc, write_doc};
use crate::error::{Error, Result};
use crate::repo::platform::Platform;
use crate::repo::schema::ConfigDoc;
use crate::store::ContentStore;
use tracing::{debug, info, warn};

/// One repository instance: root path, base URL, content store
#[derive(Debug)]
pub struct Collection {
    /// Collection root, as a backend path
    path: String,
    /// Base URL of the published metadata tree
    pub url: String,
    store: ContentStore,
}

impl Collection {
    /// Load a collection from its `config.json`.
    ///
    /// Unlike platform and channel discovery, a broken top-level config
    /// is fatal.
    pub fn load(backend: &dyn Backend, path: &str) -> Result<Self> {
        let config: ConfigDoc = read_doc(backend, &Self::config_path(path))?;
        let store = ContentStore::new(
            join_path(path, &config.storage_path),
            config.storage_url,
        );
        Ok(Self {
            path: path.to_string(),
            url: config.base_url,
            store,
        })
    }

    /// Create a new collection and write its `config.json`
    pub fn create(
        backend: &dyn Backend,
        path: &str,
        url: &str,
        storage_path: &str,
        storage_url: &str,
    ) -> Result<Self> {
        let config = ConfigDoc {
            base_url: url.to_string(),
            storage_url: storage_url.to_string(),
            storage_path: storage_path.to_string(),
        };
        write_doc(backend, &config, &Self::config_path(path))?;
        info!("created collection at '{}'", path);

        let store = ContentStore::new(join_path(path, storage_path), storage_url);
        Ok(Self {
            path: path.to_string(),
            url: url.to_string(),
            store,
        })
    }

    fn config_path(path: &str) -> String {
        join_path(path, "config.json")
    }

    /// Collection root on the backend
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContentStore {
        &mut self.store
    }

    /// Resolve an existing platform. Never creates.
    ///
    /// A directory without a `channels.json` (the storage directory,
    /// say) is simply not a platform.
    pub fn get_platform(&self, backend: &dyn Backend, id: &str) -> Result<Option<Platform>> {
        match Platform::load(backend, &self.path, &self.url, id) {
            Ok(platform) => Ok(Some(platform)),
            Err(Error::Missing(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a platform with no channels and persist it
    pub fn new_platform(&self, backend: &dyn Backend, id: &str) -> Result<Platform> {
        if self.get_platform(backend, id)?.is_some() {
            return Err(Error::PlatformExists(id.to_string()));
        }
        let platform = Platform::new(&self.path, &self.url, id);
        platform.save(backend)?;
        info!("created platform '{}'", id);
        Ok(platform)
    }

    /// Discover and load every platform in the collection.
    ///
    /// The directory listing is taken fresh on each call. Entries that
    /// fail to load as platforms are logged and skipped.
    pub fn list_platforms(&self, backend: &dyn Backend) -> Result<Vec<Platform>> {
        let dirs = match backend.list_dir(&self.path, ListKind::Dirs) {
            Ok(dirs) => dirs,
            Err(Error::Missing(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let mut platforms = Vec::new();
        for id in dirs {
            match Platform::load(backend, &self.path, &self.url, &id) {
                Ok(platform) => platforms.push(platform),
                Err(Error::Missing(_)) => {
                    debug!("'{}' has no channels.json, not a platform", id);
                }
                Err(e) => warn!("skipping platform '{}': {}", id, e),
            }
        }
        Ok(platforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DiskBackend;
    use tempfile::TempDir;

    fn collection() -> (TempDir, DiskBackend, Collection) {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());
        let col = Collection::create(
            &backend,
            "",
            "https://updates.example.com",
            "storage",
            "https://dl.example.com/files/",
        )
        .unwrap();
        (dir, backend, col)
    }

    #[test]
    fn test_create_then_load() {
        let (_dir, backend, col) = collection();
        let loaded = Collection::load(&backend, "").unwrap();
        assert_eq!(loaded.url, col.url);
        assert_eq!(loaded.store().path(), "storage");
        assert_eq!(loaded.store().url(), "https://dl.example.com/files/");
    }

    #[test]
    fn test_load_without_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());
        assert!(Collection::load(&backend, "").unwrap_err().is_missing());
    }

    #[test]
    fn test_platform_resolve_and_create_are_split() {
        let (_dir, backend, col) = collection();
        assert!(col.get_platform(&backend, "mac").unwrap().is_none());

        col.new_platform(&backend, "mac").unwrap();
        assert!(col.get_platform(&backend, "mac").unwrap().is_some());

        let err = col.new_platform(&backend, "mac").unwrap_err();
        assert!(matches!(err, Error::PlatformExists(_)));
    }

    #[test]
    fn test_list_platforms_skips_non_platform_dirs() {
        let (dir, backend, col) = collection();
        col.new_platform(&backend, "mac").unwrap();
        col.new_platform(&backend, "linux").unwrap();
        std::fs::create_dir(dir.path().join("storage")).unwrap();

        let platforms = col.list_platforms(&backend).unwrap();
        let ids: Vec<&str> = platforms.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["linux", "mac"]);
    }

    #[test]
    fn test_list_platforms_relists_every_call() {
        let (_dir, backend, col) = collection();
        assert!(col.list_platforms(&backend).unwrap().is_empty());

        col.new_platform(&backend, "mac").unwrap();
        assert_eq!(col.list_platforms(&backend).unwrap().len(), 1);
    }
}
