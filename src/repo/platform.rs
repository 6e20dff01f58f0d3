// src/repo/platform.rs

//! An OS/architecture target grouping release channels.
//!
//! A platform persists as one `channels.json` document listing its
//! channels. Channels that fail to load are logged and skipped so one
//! broken track does not take the platform down with it.

use crate::backend::{Backend, join_path, read_doc, url_join, write_doc};
use crate::error::{Error, Result};
use crate::repo::channel::Channel;
use crate::repo::schema::{ChannelsDoc, FORMAT_VERSION};
use tracing::{info, warn};

/// A named platform and its channels
#[derive(Debug)]
pub struct Platform {
    pub id: String,
    /// Platform directory, as a backend path
    path: String,
    /// Collection base URL, used to derive channel URLs
    collection_url: String,
    pub channels: Vec<Channel>,
}

impl Platform {
    /// Load a platform directory and all of its channels
    pub fn load(
        backend: &dyn Backend,
        collection_path: &str,
        collection_url: &str,
        id: &str,
    ) -> Result<Self> {
        let path = join_path(collection_path, id);
        let doc_path = join_path(&path, "channels.json");
        let doc: ChannelsDoc = read_doc(backend, &doc_path)?;
        if doc.format_version != FORMAT_VERSION {
            return Err(Error::FormatVersion {
                path: doc_path,
                found: doc.format_version,
            });
        }

        let mut channels = Vec::new();
        for desc in &doc.channels {
            match Channel::load(backend, &path, desc) {
                Ok(chan) => channels.push(chan),
                Err(e) => {
                    warn!(
                        "skipping channel '{}' of platform '{}': {}",
                        desc.id, id, e
                    );
                }
            }
        }

        Ok(Self {
            id: id.to_string(),
            path,
            collection_url: collection_url.to_string(),
            channels,
        })
    }

    /// Build a new platform with no channels yet
    pub fn new(collection_path: &str, collection_url: &str, id: impl Into<String>) -> Self {
        let id = id.into();
        let path = join_path(collection_path, &id);
        Self {
            id,
            path,
            collection_url: collection_url.to_string(),
            channels: Vec::new(),
        }
    }

    /// Platform directory on the backend
    pub fn path(&self) -> &str {
        &self.path
    }

    fn channels_doc_path(&self) -> String {
        join_path(&self.path, "channels.json")
    }

    /// Persist the platform's channel list
    pub fn save(&self, backend: &dyn Backend) -> Result<()> {
        let doc = ChannelsDoc {
            format_version: FORMAT_VERSION,
            channels: self.channels.iter().map(|c| c.desc()).collect(),
        };
        write_doc(backend, &doc, &self.channels_doc_path())
    }

    /// Resolve an existing channel. Never creates.
    pub fn channel(&mut self, id: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == id)
    }

    /// Resolve a channel, creating and persisting it with defaults
    /// (name = id, empty description) when it does not exist yet
    pub fn get_or_create_channel(
        &mut self,
        backend: &dyn Backend,
        id: &str,
    ) -> Result<&mut Channel> {
        if let Some(pos) = self.channels.iter().position(|c| c.id == id) {
            return Ok(&mut self.channels[pos]);
        }
        self.new_channel(backend, id, None, "")
    }

    /// Create a channel and immediately persist the channel list.
    ///
    /// The channel URL is derived as `<collection_url>/<platform>/<id>/`.
    pub fn new_channel(
        &mut self,
        backend: &dyn Backend,
        id: &str,
        name: Option<&str>,
        description: &str,
    ) -> Result<&mut Channel> {
        let url = format!(
            "{}/",
            url_join(&self.collection_url, &format!("{}/{}", self.id, id))
        );
        let chan = Channel::new(
            &self.path,
            id,
            name.unwrap_or(id),
            description,
            url,
        );
        chan.save_index(backend)?;

        let idx = self.channels.len();
        self.channels.push(chan);
        self.save(backend)?;
        info!("created channel '{}' in platform '{}'", id, self.id);
        Ok(&mut self.channels[idx])
    }
}
