//! # regsync-core
//!
//! Core library for the regsync CLI providing:
//! - Configuration loading (embedded defaults, config file, environment)
//! - Kubernetes version range resolution from a machines manifest
//! - Concurrent image collection from the core family and addons
//! - Deduplication, deterministic ordering and retag planning

pub mod collect;
pub mod config;
pub mod error;
pub mod image_set;
pub mod machines;
pub mod plan;
pub mod sources;
pub mod sync;
pub mod types;
pub mod version;

pub use collect::{Collection, Collector};
pub use config::HierarchicalConfigLoader;
pub use error::{AddonFailure, AggregateCollectionError, Error, Result};
pub use image_set::ImageSet;
pub use plan::{plan, Destination, RetagEntry, RetagPlan};
pub use sync::{plan_registry_sync, SyncOutcome, SyncRequest};
pub use types::RegsyncConfig;
pub use version::{resolve, RangeSource, VersionRange, ANY_RANGE};
