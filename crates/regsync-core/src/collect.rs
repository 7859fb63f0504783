//! Image collection from the core family and every addon
//!
//! The core query and each addon query run concurrently. Each task owns its
//! own result; results are merged into one [`ImageSet`] only after all of
//! them have finished. A core failure is fatal. Addon failures are recorded
//! and returned next to the images that were collected.

use crate::error::{AddonFailure, AggregateCollectionError, Error, Result};
use crate::image_set::ImageSet;
use crate::sources::{AddonSource, CoreImageSource};
use crate::version::VersionRange;
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of a collection pass
#[derive(Debug)]
pub struct Collection {
    /// Union of the core images and the images of every addon that succeeded
    pub images: ImageSet,
    /// Addons that failed, in registration order
    pub failures: Vec<AddonFailure>,
}

impl Collection {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Split into the collected images and the aggregated addon error, if any
    pub fn into_parts(self) -> (ImageSet, Option<AggregateCollectionError>) {
        (
            self.images,
            AggregateCollectionError::from_failures(self.failures),
        )
    }

    /// Treat any addon failure as fatal
    pub fn into_strict(self) -> Result<ImageSet> {
        match self.into_parts() {
            (images, None) => Ok(images),
            (_, Some(aggregate)) => Err(Error::AggregateCollection(aggregate)),
        }
    }
}

/// Gathers images from one core source and any number of addons
pub struct Collector {
    core: Box<dyn CoreImageSource>,
    addons: Vec<Box<dyn AddonSource>>,
    timeout: Option<Duration>,
}

impl Collector {
    pub fn new(core: Box<dyn CoreImageSource>) -> Self {
        Self {
            core,
            addons: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_addon(mut self, addon: Box<dyn AddonSource>) -> Self {
        self.addons.push(addon);
        self
    }

    pub fn with_addons(mut self, addons: impl IntoIterator<Item = Box<dyn AddonSource>>) -> Self {
        self.addons.extend(addons);
        self
    }

    /// Bound the whole collection phase
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addon_names(&self) -> Vec<&str> {
        self.addons.iter().map(|a| a.name()).collect()
    }

    /// Query every source and union the results.
    ///
    /// Returns `Err` only for fatal conditions (core failure, timeout).
    /// Addon failures come back in [`Collection::failures`].
    pub async fn collect(&self, range: &VersionRange) -> Result<Collection> {
        debug!(
            "Collecting images from {} and {} addon(s)",
            self.core.describe(),
            self.addons.len()
        );

        let core_query = self.core.list_images(range);
        let addon_queries = join_all(self.addons.iter().map(|addon| async move {
            (addon.name().to_string(), addon.list_images().await)
        }));
        let work = async { futures::join!(core_query, addon_queries) };

        let (core_result, addon_results) = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| Error::CollectionTimeout {
                    secs: limit.as_secs(),
                })?,
            None => work.await,
        };

        let core_images = core_result.map_err(Error::core_collection)?;
        let mut images = ImageSet::new();
        images.extend(core_images);

        let mut failures = Vec::new();
        for (name, result) in addon_results {
            match result {
                Ok(addon_images) => {
                    debug!(addon = %name, count = addon_images.len(), "Collected addon images");
                    images.extend(addon_images);
                }
                Err(source) => {
                    warn!(
                        addon = %name,
                        error = %format!("{:#}", source),
                        "Failed to get addon's images"
                    );
                    failures.push(AddonFailure::new(name, source));
                }
            }
        }

        info!(
            "Collected {} unique images ({} addon failure(s))",
            images.len(),
            failures.len()
        );
        Ok(Collection { images, failures })
    }
}
