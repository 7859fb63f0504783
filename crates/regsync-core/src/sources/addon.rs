use super::{parse_references, AddonSource};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use regsync_image::ImageCoordinate;
use serde::Deserialize;
use serde_yaml_ng::Value;
use tokio::fs;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Addon whose images are read from rendered Kubernetes manifests.
///
/// `path` is a single YAML file or a directory searched recursively for
/// `*.yaml`/`*.yml`. Every string under an `image` key, at any depth and in
/// any document, is an image of the addon.
pub struct ManifestAddon {
    name: String,
    path: Utf8PathBuf,
}

impl ManifestAddon {
    pub fn new(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Manifest files under `root`, in file name order. Blocking.
fn manifest_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    if !root.exists() {
        return Err(anyhow!("manifest path {} does not exist", root));
    }
    if root.is_file() {
        return Ok(vec![root.to_owned()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            trace!("Skipping non UTF-8 path {:?}", entry.path());
            continue;
        };
        if matches!(path.extension(), Some("yaml") | Some("yml")) {
            files.push(path.to_owned());
        }
    }
    Ok(files)
}

#[async_trait]
impl AddonSource for ManifestAddon {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_images(&self) -> Result<Vec<ImageCoordinate>> {
        let root = self.path.clone();
        let files = tokio::task::spawn_blocking(move || manifest_files(&root))
            .await
            .context("Manifest discovery task failed")??;

        let mut references = Vec::new();
        for file in files {
            let content = fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file))?;
            let before = references.len();
            images_in_manifest(&content, &mut references)
                .with_context(|| format!("Failed to parse {}", file))?;
            debug!(
                "{}: {} image references in {}",
                self.name,
                references.len() - before,
                file
            );
        }
        parse_references(&references)
    }
}

/// Collect every `image: <string>` value from a multi-document YAML stream
pub fn images_in_manifest(content: &str, out: &mut Vec<String>) -> Result<()> {
    for document in serde_yaml_ng::Deserializer::from_str(content) {
        let value = Value::deserialize(document)?;
        collect_images(&value, out);
    }
    Ok(())
}

fn collect_images(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                match (key.as_str(), child) {
                    (Some("image"), Value::String(image)) => out.push(image.clone()),
                    _ => collect_images(child, out),
                }
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect_images(item, out);
            }
        }
        Value::Tagged(tagged) => collect_images(&tagged.value, out),
        _ => {}
    }
}

/// Addon with a fixed image list
pub struct StaticAddon {
    name: String,
    images: Vec<ImageCoordinate>,
}

impl StaticAddon {
    pub fn new(name: impl Into<String>, images: Vec<ImageCoordinate>) -> Self {
        Self {
            name: name.into(),
            images,
        }
    }

    pub fn from_references<S: AsRef<str>>(
        name: impl Into<String>,
        references: &[S],
    ) -> Result<Self> {
        let name = name.into();
        let images = parse_references(references)
            .with_context(|| format!("Invalid image reference in addon '{}'", name))?;
        Ok(Self::new(name, images))
    }
}

#[async_trait]
impl AddonSource for StaticAddon {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_images(&self) -> Result<Vec<ImageCoordinate>> {
        Ok(self.images.clone())
    }
}
