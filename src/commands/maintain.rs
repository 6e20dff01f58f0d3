// src/commands/maintain.rs

//! Maintenance sweep commands.
//!
//! Destructive sweeps print their report either way; `--commit` is
//! what makes them act on it.

use anyhow::{Result, anyhow};
use depot::{Backend, Collection, maintain};
use regex::Regex;
use tracing::info;

fn dry_run_hint(commit: bool) -> &'static str {
    if commit { "" } else { " (dry run, pass --commit to apply)" }
}

/// Delete versions of a channel older than the given id
pub fn cmd_delete_before(
    backend: &dyn Backend,
    collection: &str,
    platform: &str,
    channel: &str,
    older_than: u32,
    commit: bool,
) -> Result<()> {
    let col = Collection::load(backend, collection)?;
    let mut plat = col
        .get_platform(backend, platform)?
        .ok_or_else(|| anyhow!("platform '{}' not found", platform))?;
    let chan = plat
        .channel(channel)
        .ok_or_else(|| anyhow!("channel '{}' not found in platform '{}'", channel, platform))?;

    let doomed = maintain::delete_before(backend, chan, older_than, commit)?;
    for (id, name) in &doomed {
        println!("Delete version {} ({})", id, name);
    }
    println!("{} version(s){}", doomed.len(), dry_run_hint(commit));
    Ok(())
}

/// Regex-replace every file source URL and channel URL
pub fn cmd_mod_urls(
    backend: &dyn Backend,
    collection: &str,
    pattern: &str,
    replacement: &str,
    commit: bool,
) -> Result<()> {
    let pattern = Regex::new(pattern)?;
    let col = Collection::load(backend, collection)?;

    let changes = maintain::mod_urls(backend, &col, &pattern, replacement, commit)?;
    for change in &changes {
        println!("'{}' -> '{}'", change.before, change.after);
    }
    println!("{} substitution(s){}", changes.len(), dry_run_hint(commit));
    Ok(())
}

/// Report or remove blobs referenced by no version
pub fn cmd_orphan_files(backend: &dyn Backend, collection: &str, commit: bool) -> Result<()> {
    info!("sweeping for orphan blobs");
    let mut col = Collection::load(backend, collection)?;
    let report = maintain::orphan_files(backend, &mut col, commit)?;

    for name in &report.candidates {
        println!("{}", name);
    }
    println!(
        "{} orphan(s){}",
        report.candidates.len(),
        dry_run_hint(commit)
    );
    Ok(())
}

/// Report or remove blobs not referenced by any channel head
pub fn cmd_obsolete_files(backend: &dyn Backend, collection: &str, commit: bool) -> Result<()> {
    info!("sweeping for obsolete blobs");
    let mut col = Collection::load(backend, collection)?;
    let report = maintain::obsolete_files(backend, &mut col, commit)?;

    for name in &report.candidates {
        println!("{}", name);
    }
    println!(
        "{} obsolete file(s){}",
        report.candidates.len(),
        dry_run_hint(commit)
    );
    Ok(())
}

/// List files belonging to versions with no missing blobs
pub fn cmd_live_versions(backend: &dyn Backend, collection: &str) -> Result<()> {
    let col = Collection::load(backend, collection)?;
    let live = maintain::live_versions(backend, &col)?;
    for name in &live {
        println!("{}", name);
    }
    Ok(())
}
