//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Config file (`--config <path>`, else ~/.regsync/config.yaml when present)
//! 3. Environment variables (REGSYNC_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RegsyncConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const DEFAULTS_FILE: &str = "defaults.yaml";
const CONFIG_FILE: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Directory holding the global config file
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at ~/.regsync
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Home directory is not UTF-8: {:?}", p)))?;
        Ok(Self {
            config_dir: home.join(".regsync"),
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Load configuration with hierarchical precedence.
    ///
    /// An explicit path must exist; the global file is optional.
    pub fn load(&self, explicit: Option<&Utf8Path>) -> Result<RegsyncConfig> {
        let mut merged = Self::load_embedded_defaults()?;

        let file = match explicit {
            Some(path) if !path.exists() => return Err(Error::config_not_found(path.as_str())),
            Some(path) => Some(path.to_owned()),
            None => {
                let global = self.config_file();
                global.exists().then_some(global)
            }
        };

        if let Some(path) = &file {
            debug!("Loading configuration from {}", path);
            let overlay = Self::load_yaml_file(path)?;
            merge_values(&mut merged, overlay);
        }

        let mut config: RegsyncConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("Failed to parse configuration: {}", e)))?;

        if let Some(base) = file.as_deref().and_then(Utf8Path::parent) {
            Self::resolve_addon_paths(&mut config, base);
        }

        Self::apply_env_overrides(config)
    }

    fn load_embedded_defaults() -> Result<Value> {
        let embedded_file = EmbeddedConfigs::get(DEFAULTS_FILE).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", DEFAULTS_FILE))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", DEFAULTS_FILE))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                DEFAULTS_FILE, e
            ))
        })
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        match value {
            // An empty file overrides nothing
            Value::Null => Ok(Value::Mapping(Default::default())),
            Value::Mapping(_) => Ok(value),
            _ => Err(Error::invalid_config(format!(
                "{} must contain a YAML mapping",
                path
            ))),
        }
    }

    fn resolve_addon_paths(config: &mut RegsyncConfig, base: &Utf8Path) {
        for addon in &mut config.addons {
            if let Some(manifests) = &addon.manifests {
                if manifests.is_relative() {
                    addon.manifests = Some(base.join(manifests));
                }
            }
        }
    }

    fn apply_env_overrides(mut config: RegsyncConfig) -> Result<RegsyncConfig> {
        if let Ok(val) = env::var("REGSYNC_DEST_REGISTRY") {
            config.destination.registry = val;
        }

        if let Ok(val) = env::var("REGSYNC_DEST_ORGANIZATION") {
            config.destination.organization = val;
        }

        if let Ok(val) = env::var("REGSYNC_RUNTIME") {
            config.runtime = val;
        }

        if let Ok(val) = env::var("REGSYNC_COLLECTION_TIMEOUT_SECS") {
            config.collection.timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("REGSYNC_COLLECTION_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("REGSYNC_REGISTRY_TOKEN") {
            if !val.is_empty() {
                config.core.registry_token = Some(val);
            }
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Global config file used when no explicit path is given
    pub fn config_file(&self) -> Utf8PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

/// Deep-merge `overlay` into `base`. Mappings merge key by key; any other
/// overlay value replaces the base value.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
