//! Core domain types for pkgbuild packages.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// File name of the package manifest that marks a package root.
pub const MANIFEST_FILE_NAME: &str = "manifest.yml";

/// Directory name reserved for development tooling.
pub const DEV_DIR_NAME: &str = "_dev";

/// Package types accepted as package roots.
const PACKAGE_TYPES: &[&str] = &["integration", "input", "content"];

// ---------------------------------------------------------------------------
// PackageManifest
// ---------------------------------------------------------------------------

/// The `manifest.yml` structure stored at the root of each package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name; also the first path segment of the build artifact.
    pub name: String,
    /// Package version; the second path segment of the build artifact.
    #[serde(deserialize_with = "scalar_as_string")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Package type (`integration`, `input`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub format_version: Option<String>,
    /// Every other key, kept so templates can reference it.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl PackageManifest {
    /// Whether this manifest describes a package (as opposed to, say, a data stream).
    pub fn is_package_manifest(&self) -> bool {
        let typed = self
            .package_type
            .as_deref()
            .is_none_or(|t| PACKAGE_TYPES.contains(&t));
        !self.name.trim().is_empty() && !self.version.trim().is_empty() && typed
    }
}

/// Accept `version: 2` as well as `version: "1.0.0"`.
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, found {other:?}"
        ))),
    }
}

fn optional_scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(value) => scalar_as_string(value)
            .map(Some)
            .map_err(<D::Error as serde::de::Error>::custom),
    }
}

// ---------------------------------------------------------------------------
// PackageRoot
// ---------------------------------------------------------------------------

/// A located package: its root directory and parsed manifest.
#[derive(Debug, Clone)]
pub struct PackageRoot {
    path: PathBuf,
    manifest: PackageManifest,
}

impl PackageRoot {
    pub fn new(path: impl Into<PathBuf>, manifest: PackageManifest) -> Self {
        Self {
            path: path.into(),
            manifest,
        }
    }

    /// Absolute path of the package root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// `<root>/_dev/build/docs`, where documentation templates live.
    pub fn docs_templates_dir(&self) -> PathBuf {
        self.path.join(DEV_DIR_NAME).join("build").join("docs")
    }

    /// `<root>/docs`, where rendered documentation is written.
    pub fn docs_dir(&self) -> PathBuf {
        self.path.join("docs")
    }
}

// ---------------------------------------------------------------------------
// Template entries and stage results
// ---------------------------------------------------------------------------

/// One entry of the documentation templates directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    /// File name within the templates directory.
    pub file_name: String,
    /// Directory the entry was listed from.
    pub parent: PathBuf,
}

impl TemplateEntry {
    pub fn path(&self) -> PathBuf {
        self.parent.join(&self.file_name)
    }
}

/// Outcome of rendering one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// Written documentation file; `None` when no output was necessary.
    pub target: Option<PathBuf>,
}

impl RenderResult {
    pub fn written(target: impl Into<PathBuf>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }

    pub fn skipped() -> Self {
        Self::default()
    }
}

/// Outcome of assembling the package into the build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// Root of the built package tree.
    pub target: PathBuf,
}
