// src/publish.rs

//! Publishing releases into a channel.
//!
//! A push diffs a local release directory against the content store by
//! hash: blobs already present anywhere in storage are reused, only
//! unseen content is uploaded, and the resulting version manifest lists
//! one entry per local file regardless of sharing. The version id is
//! caller-supplied and must be new to the channel.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::repo::{Channel, UpdateFile};
use crate::store::{ContentStore, Stored};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// What a push did: the new version and how much actually moved
#[derive(Debug)]
pub struct PushOutcome {
    pub version_id: u32,
    /// Files listed in the version manifest
    pub file_count: usize,
    /// Blobs uploaded (the rest were dedup hits)
    pub uploaded: usize,
}

/// One regular file found in a release directory
struct LocalFile {
    /// Path relative to the release root, `/`-separated
    rel: String,
    abs: PathBuf,
    perms: u32,
    executable: bool,
}

/// Enumerate the regular files of a release directory in a
/// deterministic order (siblings sorted by name)
fn scan_release_dir(dir: &Path) -> Result<Vec<LocalFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let abs = entry.path().to_path_buf();
        let rel = abs
            .strip_prefix(dir)
            .map_err(|e| Error::Io(io::Error::other(e)))?
            .to_str()
            .ok_or_else(|| Error::InvalidFileName(abs.display().to_string()))?
            .to_string();

        let mode = entry.metadata().map_err(|e| Error::Io(io::Error::other(e)))?
            .permissions()
            .mode();
        let perms = mode & 0o7777;
        files.push(LocalFile {
            rel,
            abs,
            perms,
            executable: perms & 0o100 != 0,
        });
    }
    Ok(files)
}

/// Push a new version into a channel from a local release directory.
///
/// Deduplication is storage-wide: a file byte-identical to anything
/// previously pushed to any channel is never re-uploaded. Two distinct
/// local files with identical content still produce two manifest
/// entries pointing at the same blob URL.
pub fn push_version(
    backend: &dyn Backend,
    store: &mut ContentStore,
    channel: &mut Channel,
    id: u32,
    name: &str,
    dir: &Path,
) -> Result<PushOutcome> {
    // Reject duplicate ids before touching storage.
    if channel.version_ids().contains(&id) {
        return Err(Error::DuplicateVersion {
            channel: channel.id.clone(),
            id,
        });
    }

    info!(
        "pushing version {} ({}) to channel '{}' from {}",
        id,
        name,
        channel.id,
        dir.display()
    );

    let locals = scan_release_dir(dir)?;
    let mut files = Vec::with_capacity(locals.len());
    let mut uploaded = 0;

    for local in &locals {
        let stored = store.put(backend, &local.abs)?;
        if stored.uploaded {
            uploaded += 1;
        } else {
            debug!("reusing stored blob for {}", local.rel);
        }

        files.push(UpdateFile {
            path: local.rel.clone(),
            md5: stored.hash,
            perms: local.perms,
            executable: local.executable,
            sources: vec![store.public_url(&stored.location)],
        });
    }

    let file_count = files.len();
    channel.add_version(backend, id, name, files)?;

    info!(
        "version {}: {} files, {} uploaded",
        id, file_count, uploaded
    );
    Ok(PushOutcome {
        version_id: id,
        file_count,
        uploaded,
    })
}

/// Store a single local file content-addressed under an arbitrary
/// storage path, with no version metadata attached
pub fn push_file(backend: &dyn Backend, dest_dir: &str, file: &Path) -> Result<Stored> {
    let mut store = ContentStore::new(dest_dir, "");
    store.put(backend, file)
}
