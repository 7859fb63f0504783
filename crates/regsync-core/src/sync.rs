//! Registry sync planning from configuration
//!
//! Wires the version resolver, the collector built from [`RegsyncConfig`],
//! the orderer and the retag plan into one pass.

use crate::collect::Collector;
use crate::error::{AggregateCollectionError, Error, Result};
use crate::plan::{Destination, RetagPlan};
use crate::sources::{
    AddonSource, CoreImageSource, ManifestAddon, RegistryCatalog, StaticAddon, StaticCatalog,
};
use crate::types::{AddonConfig, CoreConfig, RegsyncConfig};
use crate::version::{self, VersionRange};
use regsync_image::RegistryClient;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Inputs of one planning pass besides configuration
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    /// Machines manifest pinning the Kubernetes version, empty when unset
    pub machines: String,
    /// Explicit version range, empty when unset
    pub versions: String,
}

/// Result of a planning pass
#[derive(Debug)]
pub struct SyncOutcome {
    pub range: VersionRange,
    pub plan: RetagPlan,
    /// Addons skipped because partial collection was allowed
    pub skipped: Option<AggregateCollectionError>,
}

/// Build the core image source described by `core`
pub fn core_source(core: &CoreConfig) -> Result<Box<dyn CoreImageSource>> {
    if !core.images.is_empty() {
        let catalog = StaticCatalog::from_references(&core.images)
            .map_err(|e| Error::invalid_config(format!("{:#}", e)))?;
        return Ok(Box::new(catalog));
    }

    let mut client = match &core.base_url {
        Some(base_url) => RegistryClient::with_base_url(&core.registry, base_url)?,
        None => RegistryClient::new(&core.registry)?,
    };
    if let Some(token) = &core.registry_token {
        client = client.with_token(token);
    }

    Ok(Box::new(
        RegistryCatalog::new(client, &core.organization)
            .with_repositories(core.repositories.clone()),
    ))
}

/// Build one addon source per entry. Names must be unique and each addon
/// takes either `manifests` or `images`.
pub fn addon_sources(addons: &[AddonConfig]) -> Result<Vec<Box<dyn AddonSource>>> {
    let mut seen = HashSet::new();
    let mut sources: Vec<Box<dyn AddonSource>> = Vec::with_capacity(addons.len());

    for addon in addons {
        if addon.name.trim().is_empty() {
            return Err(Error::invalid_config("addon name must not be empty"));
        }
        if !seen.insert(addon.name.as_str()) {
            return Err(Error::invalid_config(format!(
                "addon '{}' is registered more than once",
                addon.name
            )));
        }

        match (&addon.manifests, addon.images.is_empty()) {
            (Some(_), false) => {
                return Err(Error::invalid_config(format!(
                    "addon '{}' sets both manifests and images",
                    addon.name
                )))
            }
            (Some(path), true) => {
                sources.push(Box::new(ManifestAddon::new(&addon.name, path.clone())));
            }
            (None, _) => {
                let source = StaticAddon::from_references(&addon.name, &addon.images)
                    .map_err(|e| Error::invalid_config(format!("{:#}", e)))?;
                sources.push(Box::new(source));
            }
        }
    }

    Ok(sources)
}

/// Collector for everything `config` registers
pub fn collector(config: &RegsyncConfig) -> Result<Collector> {
    Ok(Collector::new(core_source(&config.core)?)
        .with_addons(addon_sources(&config.addons)?)
        .with_timeout(config.collection.timeout()))
}

/// Resolve, collect, order and plan.
///
/// Addon failures are fatal unless `config.collection.allow_partial` is set,
/// in which case they are logged and returned in [`SyncOutcome::skipped`].
pub async fn plan_registry_sync(
    config: &RegsyncConfig,
    request: &SyncRequest,
) -> Result<SyncOutcome> {
    let range = version::resolve(&request.machines, &request.versions)?;
    let collector = collector(config)?;
    debug!("Registered addons: {:?}", collector.addon_names());

    let collection = collector.collect(&range).await?;
    let (images, skipped) = if config.collection.allow_partial {
        let (images, skipped) = collection.into_parts();
        if let Some(aggregate) = &skipped {
            warn!("Continuing with a partial image set: {}", aggregate);
        }
        (images, skipped)
    } else {
        (collection.into_strict()?, None)
    };

    let destination = Destination::new(
        &config.destination.registry,
        &config.destination.organization,
    );
    let plan = RetagPlan::new(images.finalize(), &destination);

    Ok(SyncOutcome {
        range,
        plan,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addon(name: &str, images: &[&str]) -> AddonConfig {
        AddonConfig {
            name: name.to_string(),
            manifests: None,
            images: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_duplicate_addon_names_are_rejected() {
        let err = addon_sources(&[addon("a", &[]), addon("a", &[])]).err().unwrap();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_manifests_and_images_are_exclusive() {
        let mut both = addon("a", &["busybox:1.31"]);
        both.manifests = Some("addons/a".into());
        assert!(matches!(
            addon_sources(&[both]),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_empty_addon_name_is_rejected() {
        assert!(addon_sources(&[addon("  ", &[])]).is_err());
    }

    #[test]
    fn test_bad_static_reference_is_a_config_error() {
        let mut core = CoreConfig::default();
        core.images = vec!["quay.io//x:1".to_string()];
        assert!(matches!(
            core_source(&core),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_core_source_kinds() {
        let mut core = CoreConfig::default();
        assert_eq!(core_source(&core).unwrap().describe(), "quay.io/wks");

        core.images = vec!["quay.io/wks/x:1.0".to_string()];
        assert!(core_source(&core).unwrap().describe().starts_with("static catalog"));
    }

    #[tokio::test]
    async fn test_plan_from_static_config() {
        let mut config = RegsyncConfig::default();
        config.destination.organization = "acme".to_string();
        config.core.images = vec!["quay.io/wks/x:1.0".to_string()];
        config.addons = vec![addon("extra", &["quay.io/wks/y:2.0", "quay.io/wks/x:1.0"])];

        let outcome = plan_registry_sync(&config, &SyncRequest::default()).await.unwrap();
        assert!(outcome.range.is_any());
        assert!(outcome.skipped.is_none());
        assert_eq!(outcome.plan.len(), 2);
        assert_eq!(
            outcome.plan.render("docker")[1],
            "docker tag quay.io/wks/x:1.0 localhost:1337/acme/x:1.0"
        );
    }
}
