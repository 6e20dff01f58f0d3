// src/backend/mod.rs

//! Storage backend abstraction.
//!
//! Everything the repository persists goes through [`Backend`]: JSON
//! metadata documents, blob uploads, listings, deletions, and content
//! hash lookups. Core code never inspects which implementation it is
//! talking to; the backend is selected once at startup.
//!
//! Backend paths are `/`-separated strings relative to the backend
//! root. All operations are synchronous and issued sequentially;
//! implementations must not mask failures. A read or write that
//! breaks surfaces as an error to the caller.

pub mod disk;
#[cfg(feature = "s3")]
pub mod s3;

pub use disk::DiskBackend;
#[cfg(feature = "s3")]
pub use s3::S3Backend;

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// What a directory listing should include
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Both files and directories
    All,
    /// Directories only
    Dirs,
    /// Files only
    Files,
}

/// Capability interface to a storage medium.
///
/// Contract:
/// - reads of absent documents/directories return [`Error::Missing`];
/// - `delete_file` is idempotent (deleting an absent file succeeds);
/// - `list_dir` is non-recursive and returns names, not paths;
/// - `hash_of` returns `None` for absent files, the content hash
///   otherwise.
pub trait Backend: Send + Sync {
    /// Read a JSON document from the given path
    fn read_json(&self, path: &str) -> Result<Value>;

    /// Write a JSON document to the given path, creating intermediate
    /// directories as needed
    fn write_json(&self, doc: &Value, path: &str) -> Result<()>;

    /// List the entries directly under `path`
    fn list_dir(&self, path: &str, kind: ListKind) -> Result<Vec<String>>;

    /// Upload a local file to `dest` on the backend
    fn upload_file(&self, src: &Path, dest: &str) -> Result<()>;

    /// Delete the file at `path`
    fn delete_file(&self, path: &str) -> Result<()>;

    /// Content hash of the stored file, or `None` if it does not exist
    fn hash_of(&self, path: &str) -> Result<Option<String>>;

    /// Hash every file directly under `path` (one directory level) and
    /// return a map from content hash to file path
    fn hash_dir(&self, path: &str) -> Result<HashMap<String, String>> {
        let mut map = HashMap::new();
        for name in self.list_dir(path, ListKind::Files)? {
            let file_path = join_path(path, &name);
            if let Some(hash) = self.hash_of(&file_path)? {
                map.insert(hash, file_path);
            }
        }
        Ok(map)
    }
}

/// Read and deserialize a JSON document
pub fn read_doc<T: DeserializeOwned>(backend: &dyn Backend, path: &str) -> Result<T> {
    let value = backend.read_json(path)?;
    serde_json::from_value(value).map_err(|source| Error::Json {
        path: path.to_string(),
        source,
    })
}

/// Serialize and write a JSON document
pub fn write_doc<T: Serialize>(backend: &dyn Backend, doc: &T, path: &str) -> Result<()> {
    let value = serde_json::to_value(doc).map_err(|source| Error::Json {
        path: path.to_string(),
        source,
    })?;
    backend.write_json(&value, path)
}

/// Join two backend path segments with a single separator.
///
/// An empty or `.` base yields `rest` unchanged, so collections rooted
/// at the backend root produce clean paths.
pub fn join_path(base: &str, rest: &str) -> String {
    if base.is_empty() || base == "." {
        return rest.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), rest)
}

/// Join a base URL and a relative part with a single slash
pub fn url_join(base: &str, rest: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        rest.trim_start_matches('/')
    )
}

/// Last component of a backend path or URL
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("mac", "channels.json"), "mac/channels.json");
        assert_eq!(join_path("mac/", "stable"), "mac/stable");
        assert_eq!(join_path("", "config.json"), "config.json");
        assert_eq!(join_path(".", "config.json"), "config.json");
    }

    #[test]
    fn test_url_join() {
        assert_eq!(
            url_join("https://dl.example.com/", "storage/abc-app"),
            "https://dl.example.com/storage/abc-app"
        );
        assert_eq!(
            url_join("https://dl.example.com", "abc-app"),
            "https://dl.example.com/abc-app"
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("storage/abc-app"), "abc-app");
        assert_eq!(basename("https://dl.example.com/s/abc-app"), "abc-app");
        assert_eq!(basename("abc-app"), "abc-app");
    }
}
