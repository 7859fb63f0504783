//! Mock image sources

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regsync_core::sources::{AddonSource, CoreImageSource};
use regsync_core::VersionRange;
use regsync_image::ImageCoordinate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Core source returning a fixed list and recording the ranges it saw
#[derive(Clone, Default)]
pub struct MockCore {
    images: Vec<ImageCoordinate>,
    fail_with: Option<String>,
    pub ranges: Arc<Mutex<Vec<String>>>,
}

impl MockCore {
    pub fn returning(images: Vec<ImageCoordinate>) -> Self {
        Self {
            images,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn seen_ranges(&self) -> Vec<String> {
        self.ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl CoreImageSource for MockCore {
    fn describe(&self) -> String {
        "mock core".to_string()
    }

    async fn list_images(&self, range: &VersionRange) -> Result<Vec<ImageCoordinate>> {
        self.ranges.lock().unwrap().push(range.to_string());
        match &self.fail_with {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(self.images.clone()),
        }
    }
}

/// Addon returning a fixed list, failing, or stalling
#[derive(Clone)]
pub struct MockAddon {
    name: String,
    images: Vec<ImageCoordinate>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
}

impl MockAddon {
    pub fn returning(name: &str, images: Vec<ImageCoordinate>) -> Self {
        Self {
            name: name.to_string(),
            images,
            fail_with: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::returning(name, vec![])
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn boxed(self) -> Box<dyn AddonSource> {
        Box::new(self)
    }
}

#[async_trait]
impl AddonSource for MockAddon {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_images(&self) -> Result<Vec<ImageCoordinate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(self.images.clone()),
        }
    }
}
