// src/maintain.rs

//! Repository-wide maintenance sweeps.
//!
//! Every sweep is a set computation over blob basenames: the names
//! referenced by version metadata versus the names physically present
//! in storage. Destructive operations take an explicit `commit` flag;
//! without it they report what they would do and write nothing.

use crate::backend::{Backend, basename};
use crate::error::Result;
use crate::repo::{Channel, Collection, Version};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{error, info};

/// Result of an orphan or obsolete sweep
#[derive(Debug)]
pub struct SweepReport {
    /// Blob basenames the sweep selected, sorted
    pub candidates: BTreeSet<String>,
    /// True when the candidates were actually removed
    pub removed: bool,
}

/// One proposed (or applied) URL substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlChange {
    pub before: String,
    pub after: String,
}

fn version_basenames(version: &Version) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for file in &version.files {
        for source in &file.sources {
            names.insert(basename(source).to_string());
        }
    }
    names
}

/// Visit every version of every channel of every platform
fn for_each_version<F>(backend: &dyn Backend, collection: &Collection, mut visit: F) -> Result<()>
where
    F: FnMut(&Version) -> Result<()>,
{
    for mut platform in collection.list_platforms(backend)? {
        for channel in platform.channels.iter_mut() {
            for id in channel.version_ids() {
                if let Some(version) = channel.get_version(backend, id)? {
                    visit(version)?;
                }
            }
        }
    }
    Ok(())
}

/// Basenames referenced by any version anywhere in the collection
pub fn linked_files(backend: &dyn Backend, collection: &Collection) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for_each_version(backend, collection, |version| {
        names.extend(version_basenames(version));
        Ok(())
    })?;
    Ok(names)
}

/// Basenames referenced by each channel's latest (max-id) version
pub fn latest_files(backend: &dyn Backend, collection: &Collection) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for mut platform in collection.list_platforms(backend)? {
        for channel in platform.channels.iter_mut() {
            if let Some(version) = channel.get_latest_version(backend)? {
                names.extend(version_basenames(version));
            }
        }
    }
    Ok(names)
}

/// Blobs referenced by no version at all; removed when `commit` is set
pub fn orphan_files(
    backend: &dyn Backend,
    collection: &mut Collection,
    commit: bool,
) -> Result<SweepReport> {
    let linked = linked_files(backend, collection)?;
    let present = collection.store().list_all(backend)?;
    let candidates: BTreeSet<String> = present.difference(&linked).cloned().collect();

    info!("{} orphan blob(s) found", candidates.len());
    if commit {
        for name in &candidates {
            // Removals are not transactional; name the blob that broke
            // the sweep so the operator knows where it stopped.
            if let Err(e) = collection.store_mut().remove(backend, name) {
                error!("orphan sweep stopped at '{}': {}", name, e);
                return Err(e);
            }
        }
    }
    Ok(SweepReport {
        candidates,
        removed: commit,
    })
}

/// Blobs not needed by any channel head, even if older versions still
/// reference them; removed when `commit` is set
pub fn obsolete_files(
    backend: &dyn Backend,
    collection: &mut Collection,
    commit: bool,
) -> Result<SweepReport> {
    let latest = latest_files(backend, collection)?;
    let present = collection.store().list_all(backend)?;
    let candidates: BTreeSet<String> = present.difference(&latest).cloned().collect();

    info!("{} obsolete blob(s) found", candidates.len());
    if commit {
        for name in &candidates {
            if let Err(e) = collection.store_mut().remove(backend, name) {
                error!("obsolete sweep stopped at '{}': {}", name, e);
                return Err(e);
            }
        }
    }
    Ok(SweepReport {
        candidates,
        removed: commit,
    })
}

/// Basenames belonging to live versions, meaning versions whose every
/// referenced blob is present in storage. A sanity check that no
/// history points at a deleted blob.
pub fn live_versions(backend: &dyn Backend, collection: &Collection) -> Result<BTreeSet<String>> {
    let present = collection.store().list_all(backend)?;
    let mut live = BTreeSet::new();
    for_each_version(backend, collection, |version| {
        let names = version_basenames(version);
        if names.is_subset(&present) {
            live.extend(names);
        }
        Ok(())
    })?;
    Ok(live)
}

/// Remove every version of the channel with id below `older_than`.
///
/// Only metadata goes away; blobs wait for a later orphan sweep.
/// Returns the (id, name) pairs affected, which with `commit` unset is
/// the dry-run report.
pub fn delete_before(
    backend: &dyn Backend,
    channel: &mut Channel,
    older_than: u32,
    commit: bool,
) -> Result<Vec<(u32, String)>> {
    let doomed: Vec<(u32, String)> = channel
        .summaries()
        .iter()
        .filter(|v| v.id < older_than)
        .map(|v| (v.id, v.name.clone()))
        .collect();

    if commit {
        for (id, name) in &doomed {
            info!("deleting version {} ({})", id, name);
            if let Err(e) = channel.delete_version(backend, *id) {
                error!("delete-before stopped at version {}: {}", id, e);
                return Err(e);
            }
        }
    }
    Ok(doomed)
}

/// Regex-substitute every UpdateFile source URL and channel URL in the
/// collection.
///
/// Every proposed substitution is reported; with `commit` unset no
/// document is touched.
pub fn mod_urls(
    backend: &dyn Backend,
    collection: &Collection,
    pattern: &Regex,
    replacement: &str,
    commit: bool,
) -> Result<Vec<UrlChange>> {
    let mut changes = Vec::new();

    for mut platform in collection.list_platforms(backend)? {
        let mut platform_dirty = false;

        for channel in platform.channels.iter_mut() {
            for id in channel.version_ids() {
                let Some(version) = channel.get_version(backend, id)? else {
                    continue;
                };
                let mut version = version.clone();
                let mut dirty = false;

                for file in version.files.iter_mut() {
                    for source in file.sources.iter_mut() {
                        let rewritten = pattern.replace_all(source, replacement);
                        if rewritten != *source {
                            changes.push(UrlChange {
                                before: source.clone(),
                                after: rewritten.to_string(),
                            });
                            *source = rewritten.into_owned();
                            dirty = true;
                        }
                    }
                }

                if commit && dirty {
                    if let Err(e) = version.save(backend, channel.path()) {
                        error!(
                            "mod-urls stopped at version {} of channel '{}': {}",
                            id, channel.id, e
                        );
                        return Err(e);
                    }
                    channel.invalidate(id);
                }
            }

            let rewritten = pattern.replace_all(&channel.url, replacement);
            if rewritten != channel.url {
                changes.push(UrlChange {
                    before: channel.url.clone(),
                    after: rewritten.to_string(),
                });
                channel.url = rewritten.into_owned();
                platform_dirty = true;
            }
        }

        if commit && platform_dirty {
            platform.save(backend)?;
        }
    }

    info!(
        "{} URL substitution(s) {}",
        changes.len(),
        if commit { "applied" } else { "proposed" }
    );
    Ok(changes)
}
