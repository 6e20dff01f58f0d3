// src/lib.rs

//! Depot: update release repository manager
//!
//! Manages collections of software update releases: a metadata tree of
//! Platforms → Channels → Versions over a content-addressed blob store
//! that deduplicates uploads by hash.
//!
//! # Architecture
//!
//! - `backend`: capability interface to the storage medium (local
//!   filesystem, S3); core code never inspects the backend type
//! - `store`: content-addressed blob storage with a lazy,
//!   process-lifetime hash index
//! - `repo`: the Collection/Platform/Channel/Version metadata tree
//! - `publish`: diffs a release directory against storage and commits
//!   new versions
//! - `maintain`: repository-wide sweeps (orphans, obsolete blobs, old
//!   versions, bulk URL rewrites), dry-run by default

pub mod backend;
mod error;
pub mod hash;
pub mod maintain;
pub mod publish;
pub mod repo;
pub mod store;

pub use backend::{Backend, DiskBackend, ListKind};
#[cfg(feature = "s3")]
pub use backend::S3Backend;
pub use error::{Error, Result};
pub use publish::{PushOutcome, push_file, push_version};
pub use repo::{Channel, Collection, Platform, UpdateFile, Version};
pub use store::{ContentStore, Stored};
