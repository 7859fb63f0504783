//! Version command
//!
//! Reports the build (from `build.rs`) and where the global config file is
//! looked up.

use crate::cli::VersionArgs;
use anyhow::Result;
use camino::Utf8PathBuf;
use regsync_core::HierarchicalConfigLoader;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    /// RFC 3339 build time
    pub built_at: Option<&'static str>,
    pub target: Option<&'static str>,
    /// Global config file consulted when `--config` is not given
    pub config_file: Option<Utf8PathBuf>,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_SHA"),
            built_at: option_env!("BUILD_TIMESTAMP"),
            target: option_env!("TARGET"),
            config_file: HierarchicalConfigLoader::new()
                .ok()
                .map(|loader| loader.config_file()),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "regsync {}", self.version)?;
        let details: Vec<&str> = [self.commit, self.target].into_iter().flatten().collect();
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

pub fn run(args: VersionArgs) -> Result<()> {
    let info = BuildInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info);
    if let Some(built_at) = info.built_at {
        println!("Built:  {}", built_at);
    }
    if let Some(config_file) = &info.config_file {
        println!("Config: {}", config_file);
    }
    Ok(())
}
