// src/commands/info.rs

//! Collection overview command

use anyhow::Result;
use depot::{Backend, Collection};

/// Print the collection's platforms, channels, and version counts
pub fn cmd_info(backend: &dyn Backend, collection: &str) -> Result<()> {
    let col = Collection::load(backend, collection)?;
    let platforms = col.list_platforms(backend)?;

    if platforms.is_empty() {
        println!("No platforms in collection '{}'", collection);
        return Ok(());
    }

    for platform in platforms {
        println!("Platform '{}':", platform.id);
        for channel in &platform.channels {
            let latest = channel
                .latest_id()
                .map(|id| format!("latest {id}"))
                .unwrap_or_else(|| "empty".to_string());
            println!(
                "  Channel '{}': {} version(s), {}",
                channel.id,
                channel.summaries().len(),
                latest
            );
        }
    }
    Ok(())
}
