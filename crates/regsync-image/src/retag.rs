//! Retag commands: pull a source image, tag it under a new coordinate, push it.

use crate::types::ImageCoordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container CLI used when rendering commands
pub const DEFAULT_RUNTIME: &str = "docker";

/// One step of a retag sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RetagCommand {
    /// Fetch the source image
    Pull { image: ImageCoordinate },
    /// Add the destination reference to the local copy of the source image
    Tag {
        source: ImageCoordinate,
        dest: ImageCoordinate,
    },
    /// Upload the destination reference
    Push { image: ImageCoordinate },
}

impl RetagCommand {
    /// Render as a shell command line for the given container CLI
    pub fn render(&self, runtime: &str) -> String {
        match self {
            Self::Pull { image } => format!("{} pull {}", runtime, image),
            Self::Tag { source, dest } => format!("{} tag {} {}", runtime, source, dest),
            Self::Push { image } => format!("{} push {}", runtime, image),
        }
    }
}

impl fmt::Display for RetagCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_RUNTIME))
    }
}

impl ImageCoordinate {
    /// Commands that make this image available as `dest`: pull, tag, push
    pub fn commands_to_retag_as(&self, dest: &ImageCoordinate) -> [RetagCommand; 3] {
        [
            RetagCommand::Pull {
                image: self.clone(),
            },
            RetagCommand::Tag {
                source: self.clone(),
                dest: dest.clone(),
            },
            RetagCommand::Push {
                image: dest.clone(),
            },
        ]
    }
}
