//! Kubernetes version range resolution
//!
//! The range used to filter the core image family comes from one of three
//! places, highest precedence first:
//! 1. A machines manifest, pinning an exact version (`=<version>`)
//! 2. An explicit range supplied by the caller
//! 3. The "any version" sentinel

use crate::error::{Error, Result};
use crate::machines::{self, ManifestError, ManifestVersion};
use camino::Utf8Path;
use semver::{Version, VersionReq};
use std::fmt;
use tracing::{debug, trace};

/// Sentinel matching every version
pub const ANY_RANGE: &str = "*";

/// Where a [`VersionRange`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSource {
    /// Exact version read from a machines manifest
    Manifest,
    /// Range supplied by the caller
    Explicit,
    /// Nothing supplied
    Any,
}

/// Filter expression applied to the core image family's tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    expr: String,
    source: RangeSource,
}

impl VersionRange {
    /// Exact-version filter, rendered as `=<version>`
    pub fn exact(version: &Version) -> Self {
        Self {
            expr: format!("={}", version),
            source: RangeSource::Manifest,
        }
    }

    /// Caller-supplied range, kept verbatim
    pub fn explicit(range: impl Into<String>) -> Self {
        Self {
            expr: range.into(),
            source: RangeSource::Explicit,
        }
    }

    /// The "any version" sentinel
    pub fn any() -> Self {
        Self {
            expr: ANY_RANGE.to_string(),
            source: RangeSource::Any,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.expr
    }

    pub fn source(&self) -> RangeSource {
        self.source
    }

    pub fn is_any(&self) -> bool {
        self.source == RangeSource::Any
    }

    /// Compile the range into a tag filter
    pub fn filter(&self) -> Result<VersionFilter> {
        if self.is_any() {
            return Ok(VersionFilter { requirement: None });
        }
        let requirement = VersionReq::parse(&self.expr).map_err(|source| Error::InvalidRange {
            range: self.expr.clone(),
            source,
        })?;
        Ok(VersionFilter {
            requirement: Some(requirement),
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

/// Compiled [`VersionRange`]
#[derive(Debug, Clone)]
pub struct VersionFilter {
    requirement: Option<VersionReq>,
}

impl VersionFilter {
    /// Whether `tag` is selected by the range.
    ///
    /// A leading `v` is ignored. Tags that are not semantic versions only
    /// pass the "any version" filter.
    pub fn matches(&self, tag: &str) -> bool {
        let Some(requirement) = &self.requirement else {
            return true;
        };
        let version_str = tag.strip_prefix('v').unwrap_or(tag);
        match Version::parse(version_str) {
            Ok(version) => requirement.matches(&version),
            Err(_) => {
                trace!("Skipping non-semver tag: {}", tag);
                false
            }
        }
    }
}

/// Resolve the version range, reading the machines manifest if one is given.
///
/// Empty strings mean "not supplied".
pub fn resolve(manifest_path: &str, explicit_range: &str) -> Result<VersionRange> {
    resolve_with(
        manifest_path,
        explicit_range,
        machines::kubernetes_version_from_manifest,
    )
}

/// [`resolve`] with a custom manifest reader
pub fn resolve_with<F>(
    manifest_path: &str,
    explicit_range: &str,
    read_manifest: F,
) -> Result<VersionRange>
where
    F: FnOnce(&Utf8Path) -> std::result::Result<ManifestVersion, ManifestError>,
{
    let range = if !manifest_path.is_empty() {
        let pinned = read_manifest(Utf8Path::new(manifest_path))
            .map_err(|source| Error::VersionResolution { source })?;
        VersionRange::exact(&pinned.version)
    } else if !explicit_range.is_empty() {
        VersionRange::explicit(explicit_range)
    } else {
        VersionRange::any()
    };

    debug!("Using Kubernetes version range {} ({:?})", range, range.source());
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    type ReaderResult = std::result::Result<ManifestVersion, ManifestError>;

    fn pinned(version: &str) -> impl FnOnce(&Utf8Path) -> ReaderResult {
        let version = Version::parse(version).unwrap();
        move |_| {
            Ok(ManifestVersion {
                version,
                namespace: None,
            })
        }
    }

    fn unreachable_reader(_: &Utf8Path) -> ReaderResult {
        panic!("manifest reader should not be called");
    }

    #[test]
    fn test_manifest_takes_precedence_over_explicit_range() {
        let range = resolve_with("machines.yaml", ">=1.17,<1.19", pinned("1.18.3")).unwrap();
        assert_eq!(range.as_str(), "=1.18.3");
        assert_eq!(range.source(), RangeSource::Manifest);
    }

    #[test]
    fn test_explicit_range_is_verbatim() {
        let range = resolve_with("", ">=1.17,<1.19", unreachable_reader).unwrap();
        assert_eq!(range.as_str(), ">=1.17,<1.19");
        assert_eq!(range.source(), RangeSource::Explicit);
    }

    #[test]
    fn test_any_when_nothing_supplied() {
        let range = resolve_with("", "", unreachable_reader).unwrap();
        assert_eq!(range, VersionRange::any());
        assert_eq!(range.as_str(), ANY_RANGE);
        assert!(range.is_any());
    }

    #[test]
    fn test_explicit_range_is_not_validated_at_resolution() {
        let range = resolve_with("", "not a range", unreachable_reader).unwrap();
        assert_eq!(range.as_str(), "not a range");
        assert!(matches!(range.filter(), Err(Error::InvalidRange { .. })));
    }

    #[test]
    fn test_manifest_failure_is_fatal() {
        let err = resolve_with("machines.yaml", ">=1.17", |path: &Utf8Path| {
            Err(ManifestError::NoMachines {
                path: Utf8PathBuf::from(path),
            })
        })
        .unwrap_err();
        assert!(matches!(err, Error::VersionResolution { .. }));
        assert!(err.to_string().contains("no machines found in machines.yaml"));
    }

    #[test]
    fn test_filter_matches_exact_and_ranges() {
        let exact = VersionRange::exact(&Version::new(1, 18, 3)).filter().unwrap();
        assert!(exact.matches("v1.18.3"));
        assert!(exact.matches("1.18.3"));
        assert!(!exact.matches("v1.18.4"));

        let range = VersionRange::explicit(">=1.17,<1.19").filter().unwrap();
        assert!(range.matches("v1.17.0"));
        assert!(range.matches("v1.18.9"));
        assert!(!range.matches("v1.19.0"));
        assert!(!range.matches("v1.16.15"));
    }

    #[test]
    fn test_non_semver_tags_only_pass_any() {
        let any = VersionRange::any().filter().unwrap();
        assert!(any.matches("latest"));
        assert!(any.matches("v1.18.3"));

        let range = VersionRange::explicit(">=1.17").filter().unwrap();
        assert!(!range.matches("latest"));
        assert!(!range.matches("1.18"));
    }
}
