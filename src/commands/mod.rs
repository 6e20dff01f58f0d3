// src/commands/mod.rs

//! Command handlers for the depot CLI

mod create;
mod info;
mod maintain;
mod publish;

pub use create::{cmd_add_platform, cmd_create};
pub use info::cmd_info;
pub use maintain::{
    cmd_delete_before, cmd_live_versions, cmd_mod_urls, cmd_obsolete_files, cmd_orphan_files,
};
pub use publish::{cmd_push, cmd_push_file};
