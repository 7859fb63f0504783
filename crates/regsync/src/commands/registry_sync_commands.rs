//! registry-sync-commands: print the commands that mirror every cluster
//! image into the destination registry

use crate::cli::RegistrySyncArgs;
use crate::output;
use anyhow::{Context, Result};
use camino::Utf8Path;
use regsync_core::{plan_registry_sync, HierarchicalConfigLoader, SyncRequest};
use std::io;
use tracing::info;

pub async fn run(
    args: RegistrySyncArgs,
    config_path: Option<&Utf8Path>,
    quiet: bool,
) -> Result<()> {
    let loader = HierarchicalConfigLoader::new()?;
    let mut config = loader.load(config_path)?;
    args.apply_to(&mut config);

    let request = SyncRequest {
        machines: args
            .machines
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        versions: args.versions.clone().unwrap_or_default(),
    };

    let spinner = if quiet {
        None
    } else {
        output::spinner("Collecting images")
    };
    let result = plan_registry_sync(&config, &request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let outcome = result?;

    if let Some(skipped) = &outcome.skipped {
        output::warning(&format!(
            "Skipped {} addon(s): {}",
            skipped.failures().len(),
            skipped.addon_names().join(", ")
        ));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    outcome
        .plan
        .write_to(&config.runtime, &mut out)
        .context("Failed to write commands")?;

    info!(
        "Generated {} commands for {} images (versions {})",
        outcome.plan.len() * 3,
        outcome.plan.len(),
        outcome.range
    );
    Ok(())
}
