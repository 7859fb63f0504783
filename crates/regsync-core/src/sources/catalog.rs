use super::{parse_references, CoreImageSource};
use crate::version::VersionRange;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use regsync_image::{ImageCoordinate, RegistryClient};
use tracing::{debug, info};

/// Core image family backed by an OCI distribution registry.
///
/// Repositories are either configured up front or discovered through the
/// registry catalog under `<organization>/`. Every tag matching the version
/// range becomes one coordinate.
pub struct RegistryCatalog {
    client: RegistryClient,
    organization: String,
    repositories: Vec<String>,
}

impl RegistryCatalog {
    pub fn new(client: RegistryClient, organization: impl Into<String>) -> Self {
        Self {
            client,
            organization: organization.into(),
            repositories: Vec::new(),
        }
    }

    /// Restrict the catalog to these repositories instead of discovering them.
    /// Bare names are qualified with the organization.
    pub fn with_repositories(mut self, repositories: Vec<String>) -> Self {
        self.repositories = repositories
            .into_iter()
            .map(|repo| {
                if repo.contains('/') || self.organization.is_empty() {
                    repo
                } else {
                    format!("{}/{}", self.organization, repo)
                }
            })
            .collect();
        self
    }

    async fn repositories(&self) -> Result<Vec<String>> {
        if !self.repositories.is_empty() {
            return Ok(self.repositories.clone());
        }
        let discovered = self
            .client
            .list_repositories(Some(&self.organization))
            .await
            .with_context(|| {
                format!(
                    "Failed to discover repositories under {}/{}",
                    self.client.registry(),
                    self.organization
                )
            })?;
        debug!(
            "Discovered {} repositories under {}",
            discovered.len(),
            self.organization
        );
        Ok(discovered)
    }
}

#[async_trait]
impl CoreImageSource for RegistryCatalog {
    fn describe(&self) -> String {
        format!("{}/{}", self.client.registry(), self.organization)
    }

    async fn list_images(&self, range: &VersionRange) -> Result<Vec<ImageCoordinate>> {
        let filter = range.filter()?;
        let filter = &filter;
        let repositories = self.repositories().await?;

        let per_repository = try_join_all(repositories.iter().map(|repository| async move {
            let tags = self
                .client
                .list_tags(repository)
                .await
                .with_context(|| format!("Failed to list tags for '{}'", repository))?;
            let (user, name) = repository
                .rsplit_once('/')
                .unwrap_or(("", repository.as_str()));
            let images: Vec<ImageCoordinate> = tags
                .iter()
                .filter(|tag| filter.matches(tag))
                .map(|tag| {
                    ImageCoordinate::tagged(self.client.registry(), user, name, tag.as_str())
                })
                .collect();
            anyhow::Ok(images)
        }))
        .await?;

        let images: Vec<ImageCoordinate> = per_repository.into_iter().flatten().collect();
        info!(
            "Found {} core images in {} matching {}",
            images.len(),
            self.describe(),
            range
        );
        Ok(images)
    }
}

/// Core image family from a fixed list, filtered by tag against the range
pub struct StaticCatalog {
    images: Vec<ImageCoordinate>,
}

impl StaticCatalog {
    pub fn new(images: Vec<ImageCoordinate>) -> Self {
        Self { images }
    }

    pub fn from_references<S: AsRef<str>>(references: &[S]) -> Result<Self> {
        let images = parse_references(references).context("Invalid core image reference")?;
        Ok(Self::new(images))
    }
}

#[async_trait]
impl CoreImageSource for StaticCatalog {
    fn describe(&self) -> String {
        format!("static catalog ({} images)", self.images.len())
    }

    async fn list_images(&self, range: &VersionRange) -> Result<Vec<ImageCoordinate>> {
        let filter = range.filter()?;
        Ok(self
            .images
            .iter()
            .filter(|image| match image.tag.as_deref() {
                Some(tag) => filter.matches(tag),
                // Digest-pinned images carry no version to compare
                None => true,
            })
            .cloned()
            .collect())
    }
}
