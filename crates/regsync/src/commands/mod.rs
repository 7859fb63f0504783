//! CLI command implementations

pub mod completions;
pub mod registry_sync_commands;
pub mod version;
