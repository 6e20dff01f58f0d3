// src/repo/version.rs

//! A single published release manifest.

use crate::backend::{Backend, join_path, read_doc, write_doc};
use crate::error::{Error, Result};
use crate::repo::schema::{API_VERSION, FileDoc, SOURCE_TYPE_HTTP, SourceDoc, VersionDoc};
use tracing::debug;

/// One file of a release: where it unpacks, what it hashes to, and
/// where to download it from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFile {
    /// Install path, relative to the release root
    pub path: String,
    /// Content hash (hex)
    pub md5: String,
    /// POSIX permission bits
    pub perms: u32,
    /// Owner-execute convenience flag. Persisted alongside the exec bit
    /// in `perms` and kept in sync by the publisher, never re-derived
    /// on load.
    pub executable: bool,
    /// Download URLs (http sources only)
    pub sources: Vec<String>,
}

/// An immutable published release: numeric id, display name, files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub id: u32,
    pub name: String,
    pub files: Vec<UpdateFile>,
}

impl Version {
    pub fn new(id: u32, name: impl Into<String>, files: Vec<UpdateFile>) -> Self {
        Self {
            id,
            name: name.into(),
            files,
        }
    }

    /// Backend path of the version document inside a channel directory
    pub fn doc_path(channel_path: &str, id: u32) -> String {
        join_path(channel_path, &format!("{id}.json"))
    }

    /// Load the version with the given id from a channel directory
    pub fn load(backend: &dyn Backend, channel_path: &str, id: u32) -> Result<Self> {
        let path = Self::doc_path(channel_path, id);
        debug!("loading version document {}", path);
        let doc: VersionDoc = read_doc(backend, &path)?;

        if doc.api_version != API_VERSION {
            return Err(Error::FormatVersion {
                path,
                found: doc.api_version,
            });
        }
        if doc.id != id {
            return Err(Error::IdMismatch {
                path,
                expected: id,
                found: doc.id,
            });
        }

        let files = doc
            .files
            .into_iter()
            .map(|f| UpdateFile {
                path: f.path,
                md5: f.md5,
                perms: f.perms,
                executable: f.executable,
                // Only the http source type exists, so sources collapse
                // to their URLs.
                sources: f.sources.into_iter().map(|s| s.url).collect(),
            })
            .collect();

        Ok(Self {
            id,
            name: doc.name,
            files,
        })
    }

    /// Write the version document into a channel directory
    pub fn save(&self, backend: &dyn Backend, channel_path: &str) -> Result<()> {
        let doc = VersionDoc {
            api_version: API_VERSION,
            id: self.id,
            name: self.name.clone(),
            files: self
                .files
                .iter()
                .map(|f| FileDoc {
                    path: f.path.clone(),
                    md5: f.md5.clone(),
                    executable: f.executable,
                    perms: f.perms,
                    sources: f
                        .sources
                        .iter()
                        .map(|url| SourceDoc {
                            url: url.clone(),
                            source_type: SOURCE_TYPE_HTTP.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        };
        let path = Self::doc_path(channel_path, self.id);
        debug!("saving version document {}", path);
        write_doc(backend, &doc, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DiskBackend;
    use tempfile::TempDir;

    fn sample_files() -> Vec<UpdateFile> {
        vec![
            UpdateFile {
                path: "bin/app".into(),
                md5: "5eb63bbbe01eeed093cb22bb8f5acdc3".into(),
                perms: 0o755,
                executable: true,
                sources: vec!["https://dl.example.com/abc-app".into()],
            },
            UpdateFile {
                path: "lib/helper.so".into(),
                md5: "d41d8cd98f00b204e9800998ecf8427e".into(),
                perms: 0o644,
                executable: false,
                sources: vec!["https://dl.example.com/def-helper.so".into()],
            },
        ]
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());
        std::fs::create_dir_all(dir.path().join("mac/stable")).unwrap();

        let version = Version::new(3, "3.0", sample_files());
        version.save(&backend, "mac/stable").unwrap();

        let loaded = Version::load(&backend, "mac/stable", 3).unwrap();
        assert_eq!(loaded, version);
    }

    #[test]
    fn test_load_missing_document() {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());
        let err = Version::load(&backend, "mac/stable", 9).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_load_rejects_id_mismatch() {
        let dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(dir.path());

        let version = Version::new(4, "4.0", vec![]);
        version.save(&backend, "mac/stable").unwrap();
        // Pretend the index pointed somewhere else.
        std::fs::rename(
            dir.path().join("mac/stable/4.json"),
            dir.path().join("mac/stable/5.json"),
        )
        .unwrap();

        let err = Version::load(&backend, "mac/stable", 5).unwrap_err();
        assert!(matches!(
            err,
            Error::IdMismatch {
                expected: 5,
                found: 4,
                ..
            }
        ));
    }
}
