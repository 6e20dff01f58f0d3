// src/error.rs

//! Error types shared across the crate.
//!
//! Three families matter to callers:
//! - configuration errors (`FormatVersion`): fatal for the top-level
//!   collection config, logged-and-skipped during platform/channel
//!   discovery;
//! - backend errors (`Missing`, `Backend`, `Io`, `Json`): propagated
//!   untouched except for the per-entity skip during tree discovery;
//! - integrity errors (`DuplicateVersion`, `MissingVersionDocument`,
//!   `IdMismatch`): the repository contradicts itself.

use thiserror::Error;

/// Errors produced by repository and storage operations
#[derive(Error, Debug)]
pub enum Error {
    /// A document or directory the operation needs does not exist
    #[error("not found: {0}")]
    Missing(String),

    /// A metadata document declares a format revision we do not speak
    #[error("{path}: unsupported format version {found}")]
    FormatVersion { path: String, found: i64 },

    /// Platform lookup failed and the caller required it to exist
    #[error("platform '{0}' not found")]
    PlatformNotFound(String),

    /// Platform creation collided with an existing platform
    #[error("platform '{0}' already exists")]
    PlatformExists(String),

    /// A version id was pushed into a channel that already has it
    #[error("version {id} already exists in channel '{channel}'")]
    DuplicateVersion { channel: String, id: u32 },

    /// The channel index lists a version whose document is gone
    #[error("channel '{channel}' index lists version {id} but its document is missing")]
    MissingVersionDocument { channel: String, id: u32 },

    /// A version document disagrees with the index entry that named it
    #[error("{path}: document id {found} does not match index entry {expected}")]
    IdMismatch {
        path: String,
        expected: u32,
        found: u32,
    },

    /// A local path had no usable file name
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// Storage backend failure (I/O against the remote store, etc.)
    #[error("backend error: {0}")]
    Backend(String),

    /// Local I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A document failed to (de)serialize
    #[error("{path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

impl Error {
    /// True for "the thing isn't there" as opposed to "the read broke".
    pub fn is_missing(&self) -> bool {
        matches!(self, Error::Missing(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_detection() {
        assert!(Error::Missing("x/config.json".into()).is_missing());
        assert!(!Error::PlatformNotFound("mac".into()).is_missing());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::DuplicateVersion {
            channel: "stable".into(),
            id: 3,
        };
        assert_eq!(
            err.to_string(),
            "version 3 already exists in channel 'stable'"
        );

        let err = Error::FormatVersion {
            path: "mac/channels.json".into(),
            found: 7,
        };
        assert!(err.to_string().contains("unsupported format version 7"));
    }
}
