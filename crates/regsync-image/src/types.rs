use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// OCI tag grammar: `[\w][\w.-]{0,127}`
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").unwrap());

/// OCI digest grammar: `algorithm:encoded`
static DIGEST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[.+_-][a-z0-9]+)*:[A-Fa-f0-9]{32,}$").unwrap()
});

/// Container image coordinate: registry, user/organization, name and selector.
///
/// Field order matters: the derived `Eq`, `Hash` and `Ord` implementations
/// compare `(registry, user, name, tag, digest)` in that order, so identity
/// and sort order are the same tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct ImageCoordinate {
    /// Registry host with optional port (e.g., "quay.io", "localhost:1337").
    /// Empty means the runtime's default registry.
    #[serde(default)]
    pub registry: String,
    /// Namespace inside the registry (e.g., "wks"). May be empty.
    #[serde(default)]
    pub user: String,
    /// Image name (e.g., "kube-apiserver")
    pub name: String,
    /// Tag (e.g., "v1.18.3")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ImageCoordinate {
    /// Build a tagged coordinate
    pub fn tagged(
        registry: impl Into<String>,
        user: impl Into<String>,
        name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            user: user.into(),
            name: name.into(),
            tag: Some(tag.into()),
            digest: None,
        }
    }

    /// Parse a reference like "quay.io/wks/kube-apiserver:v1.18.3"
    ///
    /// The first path segment is treated as a registry only when it looks
    /// like a host (contains `.` or `:`, or is `localhost`). Everything
    /// between the registry and the last segment becomes `user`. A reference
    /// without tag or digest keeps both unset.
    pub fn parse(s: &str) -> Result<Self> {
        let reference = s.trim();
        if reference.is_empty() {
            return Err(Error::invalid_reference(s, "empty reference"));
        }

        let (image_part, digest) = match reference.split_once('@') {
            Some((before, after)) => {
                if !DIGEST_PATTERN.is_match(after) {
                    return Err(Error::invalid_reference(
                        reference,
                        format!("malformed digest '{}'", after),
                    ));
                }
                (before, Some(after.to_string()))
            }
            None => (reference, None),
        };

        // A ':' followed by a '/' belongs to a registry port, not a tag
        let (path, tag) = match image_part.rfind(':') {
            Some(idx) if !image_part[idx + 1..].contains('/') => {
                let tag = &image_part[idx + 1..];
                if !TAG_PATTERN.is_match(tag) {
                    return Err(Error::invalid_reference(
                        reference,
                        format!("malformed tag '{}'", tag),
                    ));
                }
                (&image_part[..idx], Some(tag.to_string()))
            }
            _ => (image_part, None),
        };

        let mut segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(Error::invalid_reference(reference, "empty path segment"));
        }

        let registry = if segments.len() > 1 && is_registry_host(segments[0]) {
            segments.remove(0).to_string()
        } else {
            String::new()
        };

        let name = segments
            .pop()
            .ok_or_else(|| Error::invalid_reference(reference, "missing image name"))?
            .to_string();
        let user = segments.join("/");

        Ok(Self {
            registry,
            user,
            name,
            tag,
            digest,
        })
    }

    /// The selector this image was discovered with (tag, else digest)
    pub fn selector(&self) -> Option<&str> {
        self.tag.as_deref().or(self.digest.as_deref())
    }

    /// Copy of this coordinate relocated under another registry and user.
    /// Name, tag and digest are preserved.
    pub fn with_destination(&self, registry: &str, user: &str) -> Self {
        Self {
            registry: registry.to_string(),
            user: user.to_string(),
            ..self.clone()
        }
    }
}

fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

impl fmt::Display for ImageCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.registry.is_empty() {
            write!(f, "{}/", self.registry)?;
        }
        if !self.user.is_empty() {
            write!(f, "{}/", self.user)?;
        }
        f.write_str(&self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ImageCoordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_parse_image_coordinate() {
        let cases = vec![
            ("quay.io/wks/x:1.0", ("quay.io", "wks", "x", Some("1.0"), None)),
            ("nginx:1.19", ("", "", "nginx", Some("1.19"), None)),
            ("weaveworks/weave-kube:2.6.2", ("", "weaveworks", "weave-kube", Some("2.6.2"), None)),
            ("localhost:5000/foo", ("localhost:5000", "", "foo", None, None)),
            ("localhost/wks/foo:v1", ("localhost", "wks", "foo", Some("v1"), None)),
            ("gcr.io/a/b/c:3", ("gcr.io", "a/b", "c", Some("3"), None)),
        ];

        for (input, (registry, user, name, tag, digest)) in cases {
            let img = ImageCoordinate::parse(input)
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", input, e));
            assert_eq!(img.registry, registry, "registry mismatch for {}", input);
            assert_eq!(img.user, user, "user mismatch for {}", input);
            assert_eq!(img.name, name, "name mismatch for {}", input);
            assert_eq!(img.tag.as_deref(), tag, "tag mismatch for {}", input);
            assert_eq!(img.digest.as_deref(), digest, "digest mismatch for {}", input);
        }
    }

    #[test]
    fn test_parse_digest_reference() {
        let input = format!("quay.io/wks/etcd@{}", DIGEST);
        let img = ImageCoordinate::parse(&input).unwrap();
        assert_eq!(img.name, "etcd");
        assert_eq!(img.tag, None);
        assert_eq!(img.digest.as_deref(), Some(DIGEST));
        assert_eq!(img.selector(), Some(DIGEST));
        assert_eq!(img.to_string(), input);
    }

    #[test]
    fn test_parse_rejects_malformed_references() {
        for input in ["", "   ", "quay.io//x:1", "x:", "x@sha256:", "x:bad tag", "/x"] {
            assert!(
                ImageCoordinate::parse(input).is_err(),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_display_omits_empty_components() {
        let img = ImageCoordinate::tagged("", "", "busybox", "1.31");
        assert_eq!(img.to_string(), "busybox:1.31");

        let img = ImageCoordinate::tagged("quay.io", "", "busybox", "1.31");
        assert_eq!(img.to_string(), "quay.io/busybox:1.31");

        let img = ImageCoordinate::tagged("", "wks", "busybox", "1.31");
        assert_eq!(img.to_string(), "wks/busybox:1.31");
    }

    #[test]
    fn test_with_destination_preserves_name_and_selector() {
        let src = ImageCoordinate::tagged("quay.io", "wks", "x", "1.0");
        let dest = src.with_destination("localhost:1337", "acme");
        assert_eq!(dest.registry, "localhost:1337");
        assert_eq!(dest.user, "acme");
        assert_eq!(dest.name, src.name);
        assert_eq!(dest.tag, src.tag);
        assert_eq!(dest.digest, src.digest);
        assert_eq!(dest.to_string(), "localhost:1337/acme/x:1.0");
    }

    #[test]
    fn test_identity_distinguishes_tags() {
        let a = ImageCoordinate::tagged("quay.io", "wks", "x", "1.0");
        let b = ImageCoordinate::tagged("quay.io", "wks", "x", "1.1");
        assert_ne!(a, b);
        assert_eq!(a, ImageCoordinate::parse("quay.io/wks/x:1.0").unwrap());
    }

    #[test]
    fn test_ordering_is_registry_then_user_then_name_then_tag() {
        let mut images = vec![
            ImageCoordinate::tagged("quay.io", "wks", "y", "1.0"),
            ImageCoordinate::tagged("docker.io", "zz", "a", "1.0"),
            ImageCoordinate::tagged("quay.io", "abc", "z", "1.0"),
            ImageCoordinate::tagged("quay.io", "wks", "x", "2.0"),
            ImageCoordinate::tagged("quay.io", "wks", "x", "10.0"),
        ];
        images.sort();

        let rendered: Vec<String> = images.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "docker.io/zz/a:1.0",
                "quay.io/abc/z:1.0",
                "quay.io/wks/x:10.0",
                "quay.io/wks/x:2.0",
                "quay.io/wks/y:1.0",
            ]
        );
    }

    #[test]
    fn test_ordering_is_case_sensitive() {
        let upper = ImageCoordinate::tagged("", "", "Zed", "1");
        let lower = ImageCoordinate::tagged("", "", "alpha", "1");
        assert!(upper < lower);
    }

    #[test]
    fn test_from_str() {
        let img: ImageCoordinate = "quay.io/wks/x:1.0".parse().unwrap();
        assert_eq!(img, ImageCoordinate::tagged("quay.io", "wks", "x", "1.0"));
    }
}
