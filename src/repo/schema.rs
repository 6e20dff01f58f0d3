// src/repo/schema.rs

//! Persisted JSON document structures.
//!
//! Two generations of wire casing coexist: the collection and platform
//! documents are snake_case with a `format_version` tag, while the
//! channel index and version documents are PascalCase with an
//! `ApiVersion` tag (and an all-caps `MD5` field). Both tags are
//! currently revision 0; anything else is rejected on load.

use serde::{Deserialize, Serialize};

/// Supported `format_version` for snake_case documents
pub const FORMAT_VERSION: i64 = 0;
/// Supported `ApiVersion` for PascalCase documents
pub const API_VERSION: i64 = 0;

/// The only source type the format defines
pub const SOURCE_TYPE_HTTP: &str = "http";

/// `config.json` at the collection root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDoc {
    /// Base URL of the published metadata tree
    pub base_url: String,
    /// Public base URL of blob storage
    pub storage_url: String,
    /// Blob storage path, relative to the collection root
    pub storage_path: String,
}

/// `<platform>/channels.json`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelsDoc {
    pub format_version: i64,
    pub channels: Vec<ChannelDesc>,
}

/// One channel entry inside [`ChannelsDoc`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDesc {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
}

/// `<platform>/<channel>/index.json`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexDoc {
    pub api_version: i64,
    pub versions: Vec<VersionSummary>,
    /// Unused by consumers; written empty for wire compatibility
    #[serde(default)]
    pub channels: Vec<serde_json::Value>,
}

/// Version id/name pair inside [`IndexDoc`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionSummary {
    pub id: u32,
    pub name: String,
}

/// `<platform>/<channel>/<id>.json`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionDoc {
    pub api_version: i64,
    pub id: u32,
    pub name: String,
    pub files: Vec<FileDoc>,
}

/// One file entry inside [`VersionDoc`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileDoc {
    pub path: String,
    #[serde(rename = "MD5")]
    pub md5: String,
    pub executable: bool,
    pub perms: u32,
    pub sources: Vec<SourceDoc>,
}

/// One download source inside [`FileDoc`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceDoc {
    pub url: String,
    pub source_type: String,
}
