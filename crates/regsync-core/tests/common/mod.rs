//! Common test utilities for regsync-core
//!
//! Provides shared test infrastructure including:
//! - Mock core and addon sources that record how often they were queried
//! - Coordinate helpers

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use regsync_image::ImageCoordinate;

/// Parse a reference, panicking on invalid input
pub fn image(reference: &str) -> ImageCoordinate {
    ImageCoordinate::parse(reference).unwrap()
}

pub fn images(references: &[&str]) -> Vec<ImageCoordinate> {
    references.iter().map(|r| image(r)).collect()
}
