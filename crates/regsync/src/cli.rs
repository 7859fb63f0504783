//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use regsync_core::RegsyncConfig;

/// regsync - mirror cluster bootstrap images into a private registry
#[derive(Parser, Debug)]
#[command(name = "regsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a regsync config file (default: ~/.regsync/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the pull/tag/push commands that mirror all cluster images
    RegistrySyncCommands(RegistrySyncArgs),

    /// Show version information
    Version(VersionArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// Registry sync command
#[derive(Args, Debug, Default)]
pub struct RegistrySyncArgs {
    /// Destination registry host[:port] [default: localhost:1337]
    #[arg(long)]
    pub dest_registry: Option<String>,

    /// Destination organization [default: wks]
    #[arg(long)]
    pub dest_organization: Option<String>,

    /// Machines manifest pinning the Kubernetes version
    #[arg(long)]
    pub machines: Option<Utf8PathBuf>,

    /// Kubernetes version range for core images, e.g. ">=1.17,<1.19"
    #[arg(long)]
    pub versions: Option<String>,

    /// Container CLI used in the generated commands [default: docker]
    #[arg(long)]
    pub runtime: Option<String>,

    /// Abort image collection after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Emit commands for the images collected even if some addons fail
    #[arg(long)]
    pub allow_partial: bool,
}

impl RegistrySyncArgs {
    /// Flags take precedence over every configuration layer
    pub fn apply_to(&self, config: &mut RegsyncConfig) {
        if let Some(registry) = &self.dest_registry {
            config.destination.registry = registry.clone();
        }
        if let Some(organization) = &self.dest_organization {
            config.destination.organization = organization.clone();
        }
        if let Some(runtime) = &self.runtime {
            config.runtime = runtime.clone();
        }
        if let Some(timeout) = self.timeout {
            config.collection.timeout_secs = timeout;
        }
        if self.allow_partial {
            config.collection.allow_partial = true;
        }
    }
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Completions command
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
