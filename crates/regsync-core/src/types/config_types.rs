//! Configuration types for regsync
//!
//! These mirror `embedded/config/defaults.yaml`. Every section has a
//! default so partial files deserialize cleanly.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete regsync configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegsyncConfig {
    /// Where mirrored images are pushed
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Container CLI used in rendered commands
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Core image family
    #[serde(default)]
    pub core: CoreConfig,

    /// Collection behavior
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Registered addons
    #[serde(default)]
    pub addons: Vec<AddonConfig>,
}

/// Destination registry and organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DestinationConfig {
    #[serde(default = "default_dest_registry")]
    pub registry: String,

    #[serde(default = "default_dest_organization")]
    pub organization: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            registry: default_dest_registry(),
            organization: default_dest_organization(),
        }
    }
}

/// Where the core image family is listed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoreConfig {
    /// Registry host the core images live in
    #[serde(default = "default_core_registry")]
    pub registry: String,

    /// Organization (user) of the core images
    #[serde(default = "default_core_organization")]
    pub organization: String,

    /// Repositories to list; discovered from the registry catalog when empty
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Fixed image list. When non-empty the registry is not queried.
    #[serde(default)]
    pub images: Vec<String>,

    /// Registry API endpoint, e.g. `http://localhost:5000` for a plain HTTP mirror
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the registry API, only read from the environment
    #[serde(skip)]
    pub registry_token: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            registry: default_core_registry(),
            organization: default_core_organization(),
            repositories: Vec::new(),
            images: Vec::new(),
            base_url: None,
            registry_token: None,
        }
    }
}

/// Collection phase settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CollectionConfig {
    /// Upper bound for the whole phase in seconds, 0 disables it
    #[serde(default)]
    pub timeout_secs: u64,

    /// Continue with the images collected so far when addons fail
    #[serde(default)]
    pub allow_partial: bool,
}

impl CollectionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// One addon: rendered manifests, a fixed image list, or both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddonConfig {
    pub name: String,

    /// Manifest file or directory, relative paths resolve against the config file
    #[serde(default)]
    pub manifests: Option<Utf8PathBuf>,

    #[serde(default)]
    pub images: Vec<String>,
}

fn default_runtime() -> String {
    regsync_image::DEFAULT_RUNTIME.to_string()
}
fn default_dest_registry() -> String {
    "localhost:1337".to_string()
}
fn default_dest_organization() -> String {
    "wks".to_string()
}
fn default_core_registry() -> String {
    "quay.io".to_string()
}
fn default_core_organization() -> String {
    "wks".to_string()
}
