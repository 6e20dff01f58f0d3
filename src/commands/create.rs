// src/commands/create.rs

//! Collection and platform creation commands

use anyhow::Result;
use depot::{Backend, Collection};
use tracing::info;

/// Create a new collection
pub fn cmd_create(
    backend: &dyn Backend,
    collection: &str,
    url: &str,
    storage_path: &str,
    storage_url: &str,
) -> Result<()> {
    info!("creating collection at: {}", collection);
    let col = Collection::create(backend, collection, url, storage_path, storage_url)?;
    println!("Created collection at '{}'", collection);
    println!("  Metadata URL: {}", col.url);
    println!("  Storage: {} ({})", col.store().path(), col.store().url());
    Ok(())
}

/// Add a platform to an existing collection
pub fn cmd_add_platform(backend: &dyn Backend, collection: &str, id: &str) -> Result<()> {
    info!("adding platform: {}", id);
    let col = Collection::load(backend, collection)?;
    col.new_platform(backend, id)?;
    println!("Added platform '{}'", id);
    Ok(())
}
