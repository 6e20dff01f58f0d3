// src/hash.rs

//! MD5 content hashing for blob deduplication.
//!
//! The repository wire format fingerprints files with MD5 hex digests.
//! The digest is purely a dedup key and blob name component, never a
//! security boundary.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Compute the MD5 hex digest of a byte slice
pub fn md5_bytes(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Compute the MD5 hex digest of everything a reader yields
pub fn md5_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute the MD5 hex digest of a file, streaming its contents
pub fn md5_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    md5_reader(&mut file)
}
