// src/commands/publish.rs

//! Publishing commands

use anyhow::{Result, anyhow};
use depot::{Backend, Collection, publish};
use std::path::Path;
use tracing::info;

/// Push a new version to a channel from a local release directory
pub fn cmd_push(
    backend: &dyn Backend,
    collection: &str,
    platform: &str,
    channel: &str,
    id: u32,
    name: &str,
    path: &Path,
) -> Result<()> {
    info!(
        "pushing {} as version {} to {}/{}",
        path.display(),
        id,
        platform,
        channel
    );

    let mut col = Collection::load(backend, collection)?;
    let mut plat = col
        .get_platform(backend, platform)?
        .ok_or_else(|| anyhow!("platform '{}' not found; run add-platform first", platform))?;
    let chan = plat.get_or_create_channel(backend, channel)?;

    let outcome = publish::push_version(backend, col.store_mut(), chan, id, name, path)?;
    println!(
        "Pushed version {} ({}) to {}/{}",
        outcome.version_id, name, platform, channel
    );
    println!(
        "  {} file(s), {} uploaded, {} deduplicated",
        outcome.file_count,
        outcome.uploaded,
        outcome.file_count - outcome.uploaded
    );
    Ok(())
}

/// Push a single file into content-addressed storage
pub fn cmd_push_file(backend: &dyn Backend, repo_path: &str, file: &Path) -> Result<()> {
    let stored = publish::push_file(backend, repo_path, file)?;
    if stored.uploaded {
        println!("Stored {} at {}", file.display(), stored.location);
    } else {
        println!(
            "Already stored: {} (content matches {})",
            file.display(),
            stored.location
        );
    }
    Ok(())
}
