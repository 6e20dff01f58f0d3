// src/backend/s3.rs

//! S3-compatible object store backend.
//!
//! Documents and blobs are stored as objects whose keys are the backend
//! paths. `hash_of` reads the object's ETag, which S3 computes as the
//! MD5 of the content for plain uploads, the same fingerprint the
//! repository uses. Listing uses delimiter queries, so "directories"
//! are the usual key-prefix illusion.
//!
//! Credentials and region come from the standard AWS environment
//! variables; `AWS_ENDPOINT` selects a custom endpoint for
//! S3-compatible stores.

use crate::backend::{Backend, ListKind, basename};
use crate::error::{Error, Result};
use s3::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Storage backend over an S3 bucket
#[derive(Debug)]
pub struct S3Backend {
    bucket: Box<Bucket>,
}

fn backend_err(e: S3Error) -> Error {
    Error::Backend(e.to_string())
}

fn is_not_found(e: &S3Error) -> bool {
    matches!(e, S3Error::HttpFailWithBody(404, _))
}

/// Normalize a backend path into a key prefix ending in `/`
fn dir_prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

impl S3Backend {
    pub fn new(bucket_name: &str) -> Result<Self> {
        let region_name =
            std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let region = match std::env::var("AWS_ENDPOINT") {
            Ok(endpoint) => Region::Custom {
                region: region_name,
                endpoint,
            },
            Err(_) => region_name
                .parse()
                .map_err(|e| Error::Backend(format!("invalid region '{region_name}': {e}")))?,
        };
        let credentials =
            Credentials::default().map_err(|e| Error::Backend(e.to_string()))?;
        let bucket = Bucket::new(bucket_name, region, credentials).map_err(backend_err)?;
        Ok(Self { bucket })
    }
}

impl Backend for S3Backend {
    fn read_json(&self, path: &str) -> Result<Value> {
        let resp = match self.bucket.get_object(path) {
            Ok(resp) => resp,
            Err(e) if is_not_found(&e) => return Err(Error::Missing(path.to_string())),
            Err(e) => return Err(backend_err(e)),
        };
        serde_json::from_slice(resp.bytes()).map_err(|source| Error::Json {
            path: path.to_string(),
            source,
        })
    }

    fn write_json(&self, doc: &Value, path: &str) -> Result<()> {
        let data = serde_json::to_vec(doc).map_err(|source| Error::Json {
            path: path.to_string(),
            source,
        })?;
        self.bucket
            .put_object_with_content_type(path, &data, "application/json")
            .map_err(backend_err)?;
        Ok(())
    }

    fn list_dir(&self, path: &str, kind: ListKind) -> Result<Vec<String>> {
        let prefix = dir_prefix(path);
        let pages = self
            .bucket
            .list(prefix.clone(), Some("/".to_string()))
            .map_err(backend_err)?;

        let mut names = BTreeSet::new();
        for page in pages {
            if matches!(kind, ListKind::Files | ListKind::All) {
                for object in &page.contents {
                    if !object.key.ends_with('/') {
                        names.insert(basename(&object.key).to_string());
                    }
                }
            }
            if matches!(kind, ListKind::Dirs | ListKind::All) {
                for common in page.common_prefixes.iter().flatten() {
                    let dir = common.prefix.trim_end_matches('/');
                    names.insert(basename(dir).to_string());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn upload_file(&self, src: &Path, dest: &str) -> Result<()> {
        let data = std::fs::read(src)?;
        self.bucket.put_object(dest, &data).map_err(backend_err)?;
        Ok(())
    }

    fn delete_file(&self, path: &str) -> Result<()> {
        match self.bucket.delete_object(path) {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(backend_err(e)),
        }
    }

    fn hash_of(&self, path: &str) -> Result<Option<String>> {
        let head = match self.bucket.head_object(path) {
            Ok((head, _code)) => head,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(backend_err(e)),
        };
        // Plain-upload ETags are the MD5 digest, quoted.
        Ok(head.e_tag.map(|tag| tag.trim_matches('"').to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_prefix() {
        assert_eq!(dir_prefix(""), "");
        assert_eq!(dir_prefix("."), "");
        assert_eq!(dir_prefix("storage"), "storage/");
        assert_eq!(dir_prefix("mac/stable/"), "mac/stable/");
    }
}
