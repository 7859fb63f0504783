//! Kubernetes version extraction from a Cluster API machines manifest
//!
//! The manifest is either a single `List` (or `MachineList`) document with
//! `items`, or a stream of `Machine` documents separated by `---`. Every
//! machine must declare the same `spec.version`.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::Deserialize;
use std::fs;
use thiserror::Error;
use tracing::debug;

/// Errors reading a version out of a machines manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("no machines found in {path}")]
    NoMachines { path: Utf8PathBuf },

    #[error("machine '{machine}' in {path} has no spec.version")]
    MissingVersion { path: Utf8PathBuf, machine: String },

    #[error("machine '{machine}' in {path} has version {found}, expected {expected}")]
    VersionMismatch {
        path: Utf8PathBuf,
        machine: String,
        expected: String,
        found: String,
    },

    #[error("'{version}' in {path} is not a valid semantic version")]
    InvalidVersion { path: Utf8PathBuf, version: String },
}

/// Version shared by all machines, with the namespace they live in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestVersion {
    pub version: Version,
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestObject {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: Option<MachineSpec>,
    #[serde(default)]
    items: Vec<ManifestObject>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMeta {
    name: Option<String>,
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MachineSpec {
    /// Unquoted versions such as `1.18` arrive as YAML numbers
    version: Option<serde_yaml_ng::Value>,
}

/// Read the Kubernetes version all machines in `path` agree on
pub fn kubernetes_version_from_manifest(
    path: &Utf8Path,
) -> std::result::Result<ManifestVersion, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    kubernetes_version_from_str(&content, path)
}

/// Same as [`kubernetes_version_from_manifest`] over already-loaded content.
/// `path` is only used in error messages.
pub fn kubernetes_version_from_str(
    content: &str,
    path: &Utf8Path,
) -> std::result::Result<ManifestVersion, ManifestError> {
    let mut machines = Vec::new();
    for document in serde_yaml_ng::Deserializer::from_str(content) {
        let object: Option<ManifestObject> =
            Option::deserialize(document).map_err(|source| ManifestError::Parse {
                path: path.to_owned(),
                source,
            })?;
        if let Some(object) = object {
            flatten_machines(object, &mut machines);
        }
    }

    let first = machines.first().ok_or_else(|| ManifestError::NoMachines {
        path: path.to_owned(),
    })?;
    let expected = machine_version(first, path)?;
    let version = parse_version(&expected, path)?;

    for machine in &machines[1..] {
        let found = machine_version(machine, path)?;
        if parse_version(&found, path)? != version {
            return Err(ManifestError::VersionMismatch {
                path: path.to_owned(),
                machine: machine_name(machine),
                expected: expected.clone(),
                found,
            });
        }
    }

    debug!(
        "Machines manifest {} pins Kubernetes {} ({} machines)",
        path,
        version,
        machines.len()
    );

    Ok(ManifestVersion {
        version,
        namespace: first.metadata.namespace.clone(),
    })
}

fn flatten_machines(object: ManifestObject, out: &mut Vec<ManifestObject>) {
    if object.kind.ends_with("List") {
        for item in object.items {
            flatten_machines(item, out);
        }
    } else if object.kind == "Machine" {
        out.push(object);
    }
}

fn machine_version(
    machine: &ManifestObject,
    path: &Utf8Path,
) -> std::result::Result<String, ManifestError> {
    machine
        .spec
        .as_ref()
        .and_then(|spec| spec.version.as_ref())
        .and_then(|value| match value {
            serde_yaml_ng::Value::String(s) => Some(s.trim().to_string()),
            serde_yaml_ng::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ManifestError::MissingVersion {
            path: path.to_owned(),
            machine: machine_name(machine),
        })
}

/// Parse a machine version, ignoring a leading `v`
fn parse_version(raw: &str, path: &Utf8Path) -> std::result::Result<Version, ManifestError> {
    let trimmed = raw.strip_prefix('v').unwrap_or(raw);
    Version::parse(trimmed).map_err(|_| ManifestError::InvalidVersion {
        path: path.to_owned(),
        version: raw.to_string(),
    })
}

fn machine_name(machine: &ManifestObject) -> String {
    machine
        .metadata
        .name
        .clone()
        .unwrap_or_else(|| "<unnamed>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> std::result::Result<ManifestVersion, ManifestError> {
        kubernetes_version_from_str(content, Utf8Path::new("machines.yaml"))
    }

    #[test]
    fn test_list_document() {
        let manifest = r#"
apiVersion: v1
kind: List
items:
  - apiVersion: cluster.x-k8s.io/v1alpha3
    kind: Machine
    metadata:
      name: master-0
      namespace: weavek8sops
    spec:
      version: 1.18.3
  - apiVersion: cluster.x-k8s.io/v1alpha3
    kind: Machine
    metadata:
      name: worker-0
      namespace: weavek8sops
    spec:
      version: 1.18.3
"#;
        let result = parse(manifest).unwrap();
        assert_eq!(result.version, Version::new(1, 18, 3));
        assert_eq!(result.namespace.as_deref(), Some("weavek8sops"));
    }

    #[test]
    fn test_multi_document_stream_with_v_prefix() {
        let manifest = r#"
kind: Machine
metadata:
  name: master-0
spec:
  version: v1.17.9
---
kind: MachineDeployment
metadata:
  name: ignored
---
kind: Machine
metadata:
  name: worker-0
spec:
  version: v1.17.9
"#;
        let result = parse(manifest).unwrap();
        assert_eq!(result.version, Version::new(1, 17, 9));
        assert_eq!(result.namespace, None);
    }

    #[test]
    fn test_empty_documents_are_skipped() {
        let manifest = "---\n---\nkind: Machine\nspec:\n  version: 1.16.0\n";
        assert_eq!(parse(manifest).unwrap().version, Version::new(1, 16, 0));
    }

    #[test]
    fn test_no_machines() {
        let err = parse("kind: List\nitems: []\n").unwrap_err();
        assert!(matches!(err, ManifestError::NoMachines { .. }));
    }

    #[test]
    fn test_missing_version() {
        let err = parse("kind: Machine\nmetadata:\n  name: m0\nspec: {}\n").unwrap_err();
        match err {
            ManifestError::MissingVersion { machine, .. } => assert_eq!(machine, "m0"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_mismatched_versions() {
        let manifest = r#"
kind: List
items:
  - kind: Machine
    metadata: { name: m0 }
    spec: { version: 1.18.3 }
  - kind: Machine
    metadata: { name: m1 }
    spec: { version: 1.17.0 }
"#;
        let err = parse(manifest).unwrap_err();
        match err {
            ManifestError::VersionMismatch {
                machine,
                expected,
                found,
                ..
            } => {
                assert_eq!(machine, "m1");
                assert_eq!(expected, "1.18.3");
                assert_eq!(found, "1.17.0");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_v_prefix_does_not_cause_mismatch() {
        let manifest = r#"
kind: List
items:
  - kind: Machine
    metadata: { name: m0 }
    spec: { version: v1.18.3 }
  - kind: Machine
    metadata: { name: m1 }
    spec: { version: "1.18.3" }
"#;
        assert_eq!(parse(manifest).unwrap().version, Version::new(1, 18, 3));
    }

    #[test]
    fn test_invalid_version_on_later_machine() {
        let manifest = r#"
kind: List
items:
  - kind: Machine
    metadata: { name: m0 }
    spec: { version: 1.18.3 }
  - kind: Machine
    metadata: { name: m1 }
    spec: { version: latest }
"#;
        match parse(manifest).unwrap_err() {
            ManifestError::InvalidVersion { version, .. } => assert_eq!(version, "latest"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_semver() {
        let err = parse("kind: Machine\nspec:\n  version: latest\n").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidVersion { .. }));
    }

    #[test]
    fn test_unquoted_numeric_version_is_rejected_as_semver() {
        let err = parse("kind: Machine\nspec:\n  version: 1.18\n").unwrap_err();
        match err {
            ManifestError::InvalidVersion { version, .. } => assert_eq!(version, "1.18"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse("kind: [unterminated\n").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = kubernetes_version_from_manifest(Utf8Path::new("/nonexistent/machines.yaml"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
