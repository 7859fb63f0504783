//! Type definitions for regsync configuration

mod config_types;

pub use config_types::*;
