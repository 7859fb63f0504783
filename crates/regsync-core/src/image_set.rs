//! Identity-keyed image set and its deterministic ordering

use regsync_image::ImageCoordinate;
use std::collections::HashSet;

/// Unique image coordinates gathered during one planning pass.
///
/// Identity is the full `(registry, user, name, tag, digest)` tuple:
/// re-inserting a present coordinate is a no-op, while the same name with
/// another tag is a distinct entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    images: HashSet<ImageCoordinate>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the coordinate was not already present
    pub fn insert(&mut self, image: ImageCoordinate) -> bool {
        self.images.insert(image)
    }

    pub fn contains(&self, image: &ImageCoordinate) -> bool {
        self.images.contains(image)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Consume the set into a sequence sorted by registry, user, name, then
    /// tag/digest. Equal sets always produce equal sequences, whatever the
    /// insertion order.
    pub fn finalize(self) -> Vec<ImageCoordinate> {
        let mut images: Vec<ImageCoordinate> = self.images.into_iter().collect();
        images.sort();
        images
    }
}

impl Extend<ImageCoordinate> for ImageSet {
    fn extend<T: IntoIterator<Item = ImageCoordinate>>(&mut self, iter: T) {
        self.images.extend(iter);
    }
}

impl FromIterator<ImageCoordinate> for ImageSet {
    fn from_iter<T: IntoIterator<Item = ImageCoordinate>>(iter: T) -> Self {
        Self {
            images: iter.into_iter().collect(),
        }
    }
}
