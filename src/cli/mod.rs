// src/cli/mod.rs

//! CLI definitions for depot.
//!
//! Command implementations live in the `commands` module; this module
//! only describes the surface. Every destructive command takes
//! `--commit` and defaults to a dry run.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "depot")]
#[command(version)]
#[command(about = "Manage update release repositories", long_about = None)]
pub struct Cli {
    /// Path to the collection to manage
    #[arg(short = 'c', long, default_value = ".")]
    pub collection: String,

    /// Store data in the given S3 bucket instead of on the local filesystem
    #[cfg(feature = "s3")]
    #[arg(long)]
    pub bucket: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new collection
    Create {
        /// Base URL of the collection's published metadata
        url: String,

        /// Blob storage path, relative to the collection root
        storage_path: String,

        /// Public base URL of blob storage
        storage_url: String,
    },

    /// Add a platform to the collection
    AddPlatform {
        /// Platform id (directory name, e.g. "mac" or "linux-x86_64")
        id: String,
    },

    /// Show the collection's platforms, channels, and version counts
    Info,

    /// Push a new version to a channel from a local release directory
    Push {
        platform: String,

        /// Channel id; created with defaults if it does not exist yet
        channel: String,

        /// Numeric version id; must be new to the channel
        id: u32,

        /// Display name of the version
        name: String,

        /// Path to the release's files
        path: PathBuf,
    },

    /// Push a single file into content-addressed storage
    PushFile {
        /// Destination directory in storage
        repo_path: String,

        /// Local file to store
        file: PathBuf,
    },

    /// Delete versions of a channel older than the given id
    DeleteBefore {
        platform: String,
        channel: String,

        /// Minimum version id to keep
        older_than: u32,

        /// Apply the deletions instead of reporting them
        #[arg(long)]
        commit: bool,
    },

    /// Regex-replace every file source URL and channel URL
    ModUrls {
        /// Regex pattern to replace
        pattern: String,

        /// Replacement string
        replacement: String,

        /// Write the rewritten documents instead of reporting changes
        #[arg(long)]
        commit: bool,
    },

    /// Report or remove blobs referenced by no version
    OrphanFiles {
        /// Remove the orphans instead of reporting them
        #[arg(long)]
        commit: bool,
    },

    /// Report or remove blobs not referenced by any channel head
    ObsoleteFiles {
        /// Remove the obsolete blobs instead of reporting them
        #[arg(long)]
        commit: bool,
    },

    /// List files belonging to versions with no missing blobs
    LiveVersions,
}
