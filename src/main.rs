// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use depot::Backend;

#[cfg(feature = "s3")]
fn build_backend(cli: &Cli) -> Result<Box<dyn Backend>> {
    if let Some(bucket) = &cli.bucket {
        return Ok(Box::new(depot::S3Backend::new(bucket)?));
    }
    Ok(Box::new(depot::DiskBackend::new(std::env::current_dir()?)))
}

#[cfg(not(feature = "s3"))]
fn build_backend(_cli: &Cli) -> Result<Box<dyn Backend>> {
    Ok(Box::new(depot::DiskBackend::new(std::env::current_dir()?)))
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let backend = build_backend(&cli)?;
    let backend = backend.as_ref();
    let collection = cli.collection.as_str();

    match cli.command {
        Some(Commands::Create {
            url,
            storage_path,
            storage_url,
        }) => commands::cmd_create(backend, collection, &url, &storage_path, &storage_url),
        Some(Commands::AddPlatform { id }) => commands::cmd_add_platform(backend, collection, &id),
        Some(Commands::Info) => commands::cmd_info(backend, collection),
        Some(Commands::Push {
            platform,
            channel,
            id,
            name,
            path,
        }) => commands::cmd_push(backend, collection, &platform, &channel, id, &name, &path),
        Some(Commands::PushFile { repo_path, file }) => {
            commands::cmd_push_file(backend, &repo_path, &file)
        }
        Some(Commands::DeleteBefore {
            platform,
            channel,
            older_than,
            commit,
        }) => commands::cmd_delete_before(
            backend, collection, &platform, &channel, older_than, commit,
        ),
        Some(Commands::ModUrls {
            pattern,
            replacement,
            commit,
        }) => commands::cmd_mod_urls(backend, collection, &pattern, &replacement, commit),
        Some(Commands::OrphanFiles { commit }) => {
            commands::cmd_orphan_files(backend, collection, commit)
        }
        Some(Commands::ObsoleteFiles { commit }) => {
            commands::cmd_obsolete_files(backend, collection, commit)
        }
        Some(Commands::LiveVersions) => commands::cmd_live_versions(backend, collection),
        None => {
            println!("depot v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'depot --help' for usage information");
            Ok(())
        }
    }
}
