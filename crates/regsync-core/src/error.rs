//! Error types for regsync-core

use crate::machines::ManifestError;
use std::fmt;
use thiserror::Error;

/// Result type alias using regsync-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for regsync
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image reference or registry error
    #[error(transparent)]
    Image(#[from] regsync_image::Error),

    /// A machines manifest was given but no version could be read from it
    #[error("Failed to extract Kubernetes version from machines manifest: {source}")]
    VersionResolution {
        #[source]
        source: ManifestError,
    },

    /// Version range is not a valid semver requirement
    #[error("Invalid version range '{range}': {source}")]
    InvalidRange {
        range: String,
        #[source]
        source: semver::Error,
    },

    /// The core image family could not be listed
    #[error("Failed to list core images: {source:#}")]
    CoreCollection {
        #[source]
        source: anyhow::Error,
    },

    /// One or more addons failed to list their images
    #[error(transparent)]
    AggregateCollection(#[from] AggregateCollectionError),

    /// Collection did not finish within the configured limit
    #[error("Image collection timed out after {secs}s")]
    CollectionTimeout { secs: u64 },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a core collection error
    pub fn core_collection(source: anyhow::Error) -> Self {
        Self::CoreCollection { source }
    }
}

/// A single addon that failed to list its images
#[derive(Error, Debug)]
#[error("addon '{addon}': {source:#}")]
pub struct AddonFailure {
    /// Name the addon reported for itself
    pub addon: String,
    #[source]
    pub source: anyhow::Error,
}

impl AddonFailure {
    pub fn new(addon: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            addon: addon.into(),
            source,
        }
    }
}

/// All addon failures from one collection pass
#[derive(Debug)]
pub struct AggregateCollectionError {
    failures: Vec<AddonFailure>,
}

impl AggregateCollectionError {
    /// Returns `None` when there is nothing to report
    pub fn from_failures(failures: Vec<AddonFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[AddonFailure] {
        &self.failures
    }

    /// Names of the failing addons, in the order they were registered
    pub fn addon_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.addon.as_str()).collect()
    }
}

impl fmt::Display for AggregateCollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to list images for {} addon(s): ",
            self.failures.len()
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateCollectionError {}
