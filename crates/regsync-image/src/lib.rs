//! Container image coordinates for the regsync CLI
//!
//! This crate provides:
//! - The [`ImageCoordinate`] value type with identity and total ordering
//! - Retag command generation (pull, tag, push)
//! - A small client for the listing endpoints of OCI-compatible registries
//!
//! # Example
//!
//! ```
//! use regsync_image::ImageCoordinate;
//!
//! let source = ImageCoordinate::parse("quay.io/wks/x:1.0").unwrap();
//! let dest = source.with_destination("localhost:1337", "acme");
//!
//! for command in source.commands_to_retag_as(&dest) {
//!     println!("{}", command);
//! }
//! ```

pub mod error;
pub mod registry;
pub mod retag;
pub mod types;

pub use error::{Error, Result};
pub use registry::RegistryClient;
pub use retag::{RetagCommand, DEFAULT_RUNTIME};
pub use types::ImageCoordinate;
