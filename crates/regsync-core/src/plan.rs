//! Retag planning: map each source image to its destination and expand to
//! pull/tag/push commands.

use regsync_image::{ImageCoordinate, RetagCommand};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Registry and organization images are mirrored into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub registry: String,
    pub organization: String,
}

impl Destination {
    pub fn new(registry: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            organization: organization.into(),
        }
    }

    /// Where `source` lands: registry and user replaced, name and selector kept
    pub fn relocate(&self, source: &ImageCoordinate) -> ImageCoordinate {
        source.with_destination(&self.registry, &self.organization)
    }
}

/// One source image and the coordinate it is retagged as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetagEntry {
    pub source: ImageCoordinate,
    pub dest: ImageCoordinate,
}

impl RetagEntry {
    pub fn commands(&self) -> [RetagCommand; 3] {
        self.source.commands_to_retag_as(&self.dest)
    }
}

/// Ordered retag entries for a whole planning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetagPlan {
    entries: Vec<RetagEntry>,
}

impl RetagPlan {
    /// Build entries in the order of `images`. Empty destination components
    /// are passed through untouched.
    pub fn new(images: Vec<ImageCoordinate>, destination: &Destination) -> Self {
        let entries = images
            .into_iter()
            .map(|source| RetagEntry {
                dest: destination.relocate(&source),
                source,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[RetagEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All commands, three per entry, entries in plan order
    pub fn commands(&self) -> Vec<RetagCommand> {
        self.entries.iter().flat_map(RetagEntry::commands).collect()
    }

    /// Command lines rendered for the given container CLI
    pub fn render(&self, runtime: &str) -> Vec<String> {
        self.commands().iter().map(|c| c.render(runtime)).collect()
    }

    /// Write one command per line
    pub fn write_to<W: Write>(&self, runtime: &str, out: &mut W) -> io::Result<()> {
        for line in self.render(runtime) {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }
}

/// Commands that mirror `images`, in order, into `dest_registry/dest_org`
pub fn plan(images: &[ImageCoordinate], dest_registry: &str, dest_org: &str) -> Vec<RetagCommand> {
    RetagPlan::new(images.to_vec(), &Destination::new(dest_registry, dest_org)).commands()
}
