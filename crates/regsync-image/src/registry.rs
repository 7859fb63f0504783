use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

/// Page size requested from list endpoints
const PAGE_SIZE: u32 = 1000;

/// Client for the read-only listing endpoints of an OCI distribution registry
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    /// Registry host as it appears in image references (e.g., "quay.io")
    registry: String,
    /// Base URL requests are issued against
    base_url: Url,
    /// Optional bearer token sent with every request
    auth_token: Option<String>,
}

impl RegistryClient {
    /// Create a client for `registry`, reached over HTTPS
    pub fn new(registry: impl Into<String>) -> Result<Self> {
        let registry = registry.into();
        let base_url = Url::parse(&format!("https://{}/", registry))?;
        Self::build(registry, base_url)
    }

    /// Create a client whose requests go to `base_url` while images keep
    /// `registry` as their host (plain-HTTP mirrors, test servers).
    pub fn with_base_url(registry: impl Into<String>, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self::build(registry.into(), base_url)
    }

    fn build(registry: String, base_url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("regsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(base_url.as_str(), e))?;

        Ok(Self {
            client,
            registry,
            base_url,
            auth_token: None,
        })
    }

    /// Set a bearer token for registries that refuse anonymous listing
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Registry host this client reports for discovered images
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// List all tags for a repository (handles pagination)
    pub async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let first = self
            .base_url
            .join(&format!("v2/{}/tags/list?n={}", repository, PAGE_SIZE))?;
        let pages: Vec<TagsResponse> = self.fetch_all_pages(first).await?;
        let tags: Vec<String> = pages
            .into_iter()
            .flat_map(|p| p.tags.unwrap_or_default())
            .collect();

        trace!("Found {} tags for {}", tags.len(), repository);
        Ok(tags)
    }

    /// List repositories from the registry catalog, optionally restricted to
    /// those under `prefix/` (handles pagination)
    pub async fn list_repositories(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let first = self.base_url.join(&format!("v2/_catalog?n={}", PAGE_SIZE))?;
        let pages: Vec<CatalogResponse> = self.fetch_all_pages(first).await?;

        let mut repositories: Vec<String> = pages
            .into_iter()
            .flat_map(|p| p.repositories.unwrap_or_default())
            .collect();
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            let scoped = format!("{}/", prefix);
            repositories.retain(|repo| repo.starts_with(&scoped));
        }

        trace!("Found {} repositories", repositories.len());
        Ok(repositories)
    }

    /// Follow `Link: <...>; rel="next"` headers until exhausted
    async fn fetch_all_pages<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>> {
        let mut pages = Vec::new();
        let mut url = first;

        loop {
            debug!("Fetching {}", url);

            let response = self
                .client
                .get(url.clone())
                .headers(self.headers()?)
                .send()
                .await
                .map_err(|e| Error::http(url.as_str(), e))?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::RegistryStatus {
                    status,
                    url: url.to_string(),
                    body: if body.is_empty() {
                        "(no response body)".to_string()
                    } else {
                        body
                    },
                });
            }

            let next = response
                .headers()
                .get("link")
                .and_then(|h| h.to_str().ok())
                .and_then(parse_link_header)
                .map(|link| url.join(&link))
                .transpose()?;

            let page: T = response
                .json()
                .await
                .map_err(|e| Error::http(url.as_str(), e))?;
            pages.push(page);

            match next {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(pages)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                Error::InvalidToken {
                    registry: self.registry.clone(),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// Extract the target of the `rel="next"` entry from a Link header.
/// Format: `</v2/repo/tags/list?n=100&last=tag>; rel="next"`
fn parse_link_header(link: &str) -> Option<String> {
    link.split(',')
        .map(str::trim)
        .find(|part| part.contains("rel=\"next\""))
        .and_then(|part| {
            let start = part.find('<')?;
            let end = part.find('>')?;
            (start < end).then(|| part[start + 1..end].to_string())
        })
}

// Distribution answers `"tags": null` for a repository without tags
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}
