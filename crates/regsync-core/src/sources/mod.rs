//! Image sources consulted by the collector
//!
//! The core image family comes from a single [`CoreImageSource`]; addons
//! each implement [`AddonSource`]. Both are opaque to the collector: they
//! produce coordinates or fail.

mod addon;
mod catalog;

pub use addon::{ManifestAddon, StaticAddon};
pub use catalog::{RegistryCatalog, StaticCatalog};

use crate::version::VersionRange;
use anyhow::Result;
use async_trait::async_trait;
use regsync_image::ImageCoordinate;

/// Provider of the core image family
#[async_trait]
pub trait CoreImageSource: Send + Sync {
    /// Short description for log lines (e.g., "quay.io/wks")
    fn describe(&self) -> String;

    /// List the images whose version matches `range`
    async fn list_images(&self, range: &VersionRange) -> Result<Vec<ImageCoordinate>>;
}

/// A pluggable provider of additional images
#[async_trait]
pub trait AddonSource: Send + Sync {
    /// Name used to tag failures
    fn name(&self) -> &str;

    /// List every image the addon deploys
    async fn list_images(&self) -> Result<Vec<ImageCoordinate>>;
}

/// Parse a list of references, naming the offending one on failure
pub(crate) fn parse_references<S: AsRef<str>>(references: &[S]) -> Result<Vec<ImageCoordinate>> {
    references
        .iter()
        .map(|r| ImageCoordinate::parse(r.as_ref()).map_err(anyhow::Error::from))
        .collect()
}
