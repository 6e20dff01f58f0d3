// src/repo/channel.rs

//! A release track within a platform.
//!
//! The channel's `index.json` carries only version id/name summaries,
//! kept sorted ascending by id, so browsing stays cheap. Full version
//! documents load lazily through an explicit cache keyed by id; the
//! cache lives as long as the channel value and can be invalidated per
//! entry.

use crate::backend::{Backend, join_path, read_doc, write_doc};
use crate::error::{Error, Result};
use crate::repo::schema::{API_VERSION, ChannelDesc, IndexDoc, VersionSummary};
use crate::repo::version::{UpdateFile, Version};
use std::collections::HashMap;
use tracing::{debug, info};

/// A named release track with an ordered version history
#[derive(Debug)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Public base URL of the channel's metadata
    pub url: String,
    /// Channel directory, as a backend path
    path: String,
    /// Version summaries, ascending by id
    versions: Vec<VersionSummary>,
    /// Loaded version documents, keyed by id
    cache: HashMap<u32, Version>,
}

impl Channel {
    /// Load a channel from its platform directory using the descriptor
    /// found in `channels.json`
    pub fn load(backend: &dyn Backend, platform_path: &str, desc: &ChannelDesc) -> Result<Self> {
        let path = join_path(platform_path, &desc.id);
        let index_path = join_path(&path, "index.json");
        let index: IndexDoc = read_doc(backend, &index_path)?;
        if index.api_version != API_VERSION {
            return Err(Error::FormatVersion {
                path: index_path,
                found: index.api_version,
            });
        }

        let mut versions = index.versions;
        versions.sort_by_key(|v| v.id);

        Ok(Self {
            id: desc.id.clone(),
            name: desc.name.clone(),
            description: desc.description.clone(),
            url: desc.url.clone(),
            path,
            versions,
            cache: HashMap::new(),
        })
    }

    /// Build a brand-new, empty channel rooted under a platform
    pub fn new(
        platform_path: &str,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let path = join_path(platform_path, &id);
        Self {
            id,
            name: name.into(),
            description: description.into(),
            url: url.into(),
            path,
            versions: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Channel directory on the backend
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Descriptor for this channel as stored in `channels.json`
    pub fn desc(&self) -> ChannelDesc {
        ChannelDesc {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
        }
    }

    /// Version summaries in ascending id order
    pub fn summaries(&self) -> &[VersionSummary] {
        &self.versions
    }

    /// Ids of every version in the channel, ascending
    pub fn version_ids(&self) -> Vec<u32> {
        self.versions.iter().map(|v| v.id).collect()
    }

    /// Highest version id, or `None` for an empty channel
    pub fn latest_id(&self) -> Option<u32> {
        self.versions.last().map(|v| v.id)
    }

    fn index_path(&self) -> String {
        join_path(&self.path, "index.json")
    }

    /// Persist the channel's `index.json`
    pub fn save_index(&self, backend: &dyn Backend) -> Result<()> {
        let doc = IndexDoc {
            api_version: API_VERSION,
            versions: self.versions.clone(),
            channels: Vec::new(),
        };
        write_doc(backend, &doc, &self.index_path())
    }

    /// Load the full version with the given id.
    ///
    /// Returns `Ok(None)` when the id is not in the index. A listed id
    /// whose document is gone is an integrity error. Loaded versions
    /// stay cached until invalidated.
    pub fn get_version(&mut self, backend: &dyn Backend, id: u32) -> Result<Option<&Version>> {
        if !self.versions.iter().any(|v| v.id == id) {
            return Ok(None);
        }
        if !self.cache.contains_key(&id) {
            let version = match Version::load(backend, &self.path, id) {
                Ok(v) => v,
                Err(Error::Missing(_)) => {
                    return Err(Error::MissingVersionDocument {
                        channel: self.id.clone(),
                        id,
                    });
                }
                Err(e) => return Err(e),
            };
            self.cache.insert(id, version);
        }
        Ok(self.cache.get(&id))
    }

    /// Load the version with the maximum id, or `None` when empty
    pub fn get_latest_version(&mut self, backend: &dyn Backend) -> Result<Option<&Version>> {
        match self.latest_id() {
            Some(id) => self.get_version(backend, id),
            None => Ok(None),
        }
    }

    /// Publish a new version into the channel.
    ///
    /// The version document is written first, then the index, so a
    /// crash in between leaves an orphaned-but-recoverable document
    /// rather than a dangling index entry. Duplicate ids are rejected.
    pub fn add_version(
        &mut self,
        backend: &dyn Backend,
        id: u32,
        name: &str,
        files: Vec<UpdateFile>,
    ) -> Result<()> {
        if self.versions.iter().any(|v| v.id == id) {
            return Err(Error::DuplicateVersion {
                channel: self.id.clone(),
                id,
            });
        }

        let version = Version::new(id, name, files);
        version.save(backend, &self.path)?;

        self.versions.push(VersionSummary {
            id,
            name: name.to_string(),
        });
        self.versions.sort_by_key(|v| v.id);
        self.save_index(backend)?;

        info!("published version {} ({}) to channel '{}'", id, name, self.id);
        self.cache.insert(id, version);
        Ok(())
    }

    /// Remove a version's index entry and document.
    ///
    /// The index is rewritten first so it never dangles, then the
    /// document is deleted. Blobs are untouched; they are reclaimed by
    /// a later orphan sweep. Returns false when the id was not present.
    pub fn delete_version(&mut self, backend: &dyn Backend, id: u32) -> Result<bool> {
        let Some(pos) = self.versions.iter().position(|v| v.id == id) else {
            return Ok(false);
        };
        self.versions.remove(pos);
        self.save_index(backend)?;
        backend.delete_file(&Version::doc_path(&self.path, id))?;
        self.cache.remove(&id);
        debug!("deleted version {} from channel '{}'", id, self.id);
        Ok(true)
    }

    /// Drop one cached version document
    pub fn invalidate(&mut self, id: u32) {
        self.cache.remove(&id);
    }

    /// Drop every cached version document
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DiskBackend;
    use tempfile::TempDir;

    fn channel() -> (TempDir, DiskBackend, Channel) {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());
        let chan = Channel::new(
            "mac",
            "stable",
            "Stable",
            "",
            "https://updates.example.com/mac/stable/",
        );
        (dir, backend, chan)
    }

    fn file(path: &str, md5: &str) -> UpdateFile {
        UpdateFile {
            path: path.into(),
            md5: md5.into(),
            perms: 0o644,
            executable: false,
            sources: vec![format!("https://dl.example.com/{md5}-{path}")],
        }
    }

    #[test]
    fn test_add_version_writes_document_then_index() {
        let (dir, backend, mut chan) = channel();
        chan.add_version(&backend, 1, "1.0", vec![file("app", "aa")])
            .unwrap();

        assert!(dir.path().join("mac/stable/1.json").exists());
        assert!(dir.path().join("mac/stable/index.json").exists());
        assert_eq!(chan.version_ids(), vec![1]);
    }

    #[test]
    fn test_add_version_rejects_duplicate_id() {
        let (_dir, backend, mut chan) = channel();
        chan.add_version(&backend, 1, "1.0", vec![]).unwrap();
        let err = chan.add_version(&backend, 1, "1.0 again", vec![]).unwrap_err();
        assert!(matches!(err, Error::DuplicateVersion { id: 1, .. }));
        assert_eq!(chan.version_ids(), vec![1]);
    }

    #[test]
    fn test_summaries_stay_sorted() {
        let (_dir, backend, mut chan) = channel();
        chan.add_version(&backend, 5, "5.0", vec![]).unwrap();
        chan.add_version(&backend, 2, "2.0", vec![]).unwrap();
        chan.add_version(&backend, 9, "9.0", vec![]).unwrap();
        assert_eq!(chan.version_ids(), vec![2, 5, 9]);
        assert_eq!(chan.latest_id(), Some(9));
    }

    #[test]
    fn test_get_latest_version() {
        let (_dir, backend, mut chan) = channel();
        assert!(chan.get_latest_version(&backend).unwrap().is_none());

        chan.add_version(&backend, 1, "1.0", vec![]).unwrap();
        chan.add_version(&backend, 2, "2.0", vec![]).unwrap();
        let latest = chan.get_latest_version(&backend).unwrap().unwrap();
        assert_eq!(latest.id, 2);
    }

    #[test]
    fn test_get_version_unknown_id_is_none() {
        let (_dir, backend, mut chan) = channel();
        chan.add_version(&backend, 1, "1.0", vec![]).unwrap();
        assert!(chan.get_version(&backend, 7).unwrap().is_none());
    }

    #[test]
    fn test_missing_document_is_integrity_error() {
        let (dir, backend, mut chan) = channel();
        chan.add_version(&backend, 1, "1.0", vec![]).unwrap();
        chan.clear_cache();
        std::fs::remove_file(dir.path().join("mac/stable/1.json")).unwrap();

        let err = chan.get_version(&backend, 1).unwrap_err();
        assert!(matches!(err, Error::MissingVersionDocument { id: 1, .. }));
    }

    #[test]
    fn test_delete_version_updates_index_and_document() {
        let (dir, backend, mut chan) = channel();
        chan.add_version(&backend, 1, "1.0", vec![]).unwrap();
        chan.add_version(&backend, 2, "2.0", vec![]).unwrap();

        assert!(chan.delete_version(&backend, 1).unwrap());
        assert!(!chan.delete_version(&backend, 1).unwrap());
        assert_eq!(chan.version_ids(), vec![2]);
        assert!(!dir.path().join("mac/stable/1.json").exists());

        // The surviving index round-trips.
        let reloaded = Channel::load(&backend, "mac", &chan.desc()).unwrap();
        assert_eq!(reloaded.version_ids(), vec![2]);
    }

    #[test]
    fn test_cache_serves_without_document_until_invalidated() {
        let (dir, backend, mut chan) = channel();
        chan.add_version(&backend, 1, "1.0", vec![file("app", "aa")])
            .unwrap();

        // Document gone, but the cache still answers.
        std::fs::remove_file(dir.path().join("mac/stable/1.json")).unwrap();
        assert!(chan.get_version(&backend, 1).unwrap().is_some());

        chan.invalidate(1);
        assert!(chan.get_version(&backend, 1).is_err());
    }

    #[test]
    fn test_load_rejects_api_version_mismatch() {
        let (_dir, backend, chan) = channel();
        let doc = serde_json::json!({"ApiVersion": 3, "Versions": [], "Channels": []});
        backend.write_json(&doc, "mac/stable/index.json").unwrap();

        let err = Channel::load(&backend, "mac", &chan.desc()).unwrap_err();
        assert!(matches!(err, Error::FormatVersion { found: 3, .. }));
    }
}
