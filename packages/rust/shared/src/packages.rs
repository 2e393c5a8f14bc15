//! Package root discovery.
//!
//! Walks from a starting directory up through its ancestors until a
//! directory holding a package `manifest.yml` is found.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, instrument};

use crate::error::{PkgBuildError, Result};
use crate::types::{MANIFEST_FILE_NAME, PackageManifest, PackageRoot};

/// Locate the package root starting from the current working directory.
pub fn locate() -> Result<Option<PackageRoot>> {
    let cwd = std::env::current_dir().map_err(|e| PkgBuildError::io(".", e))?;
    locate_from(&cwd)
}

/// Locate the package root starting from `start` and walking upward.
///
/// Returns `Ok(None)` when no ancestor holds a package manifest. Errors are
/// reserved for I/O failures other than "not found" and for manifests that
/// are not valid YAML.
#[instrument(skip_all, fields(start = %start.display()))]
pub fn locate_from(start: &Path) -> Result<Option<PackageRoot>> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| PkgBuildError::io(start, e))?
            .join(start)
    };

    for dir in start.ancestors() {
        if let Some(manifest) = read_package_manifest(dir)? {
            debug!(root = %dir.display(), name = %manifest.name, "package root found");
            return Ok(Some(PackageRoot::new(dir, manifest)));
        }
    }

    debug!("no package manifest in ancestor chain");
    Ok(None)
}

/// Read `dir/manifest.yml` if it is a package manifest.
///
/// Manifests that do not describe a package (data-stream manifests, missing
/// name or version) yield `Ok(None)`. A YAML syntax error is a
/// [`PkgBuildError::Manifest`].
pub fn read_package_manifest(dir: &Path) -> Result<Option<PackageManifest>> {
    let path = dir.join(MANIFEST_FILE_NAME);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) if path.is_dir() => {
            debug!(path = %path.display(), error = %e, "manifest path is a directory");
            return Ok(None);
        }
        Err(e) => return Err(PkgBuildError::io(&path, e)),
    };

    let document: serde_yaml::Value = serde_yaml::from_str(&content)
        .map_err(|e| PkgBuildError::manifest(&path, e.to_string()))?;

    match serde_yaml::from_value::<PackageManifest>(document) {
        Ok(manifest) if manifest.is_package_manifest() => Ok(Some(manifest)),
        Ok(_) => {
            debug!(path = %path.display(), "manifest is not a package manifest");
            Ok(None)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "manifest does not describe a package");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_manifest(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE_NAME), body).unwrap();
    }

    #[test]
    fn finds_root_from_nested_directory() {
        let tmp = tempdir().unwrap();
        let pkg = tmp.path().join("packages/foo");
        write_manifest(&pkg, "name: foo\nversion: 1.0.0\ntype: integration\n");
        let nested = pkg.join("data_stream/logs/fields");
        fs::create_dir_all(&nested).unwrap();

        let root = locate_from(&nested).unwrap().expect("root");
        assert_eq!(root.path(), pkg.as_path());
        assert_eq!(root.manifest().name, "foo");
    }

    #[test]
    fn skips_data_stream_manifests() {
        let tmp = tempdir().unwrap();
        let pkg = tmp.path().join("foo");
        write_manifest(&pkg, "name: foo\nversion: 0.1.0\n");
        let ds = pkg.join("data_stream/logs");
        write_manifest(&ds, "title: Logs\ntype: logs\n");

        let root = locate_from(&ds).unwrap().expect("root");
        assert_eq!(root.path(), pkg.as_path());
    }

    #[test]
    fn returns_none_without_manifest() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("a/b");
        fs::create_dir_all(&dir).unwrap();

        // The temp dir's ancestors are assumed to carry no package manifest.
        assert!(locate_from(&dir).unwrap().is_none());
    }

    #[test]
    fn invalid_yaml_is_a_manifest_error() {
        let tmp = tempdir().unwrap();
        let pkg = tmp.path().join("foo");
        write_manifest(&pkg, "name: foo\nversion: 1.0.0\n  bad: [\n");
        let nested = pkg.join("docs");
        fs::create_dir_all(&nested).unwrap();

        let err = locate_from(&nested).unwrap_err();
        match err {
            PkgBuildError::Manifest { path, .. } => {
                assert_eq!(path, pkg.join(MANIFEST_FILE_NAME))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn manifest_missing_required_keys_is_skipped() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("foo");
        write_manifest(&dir, "title: Logs\nstreams: []\n");

        assert!(read_package_manifest(&dir).unwrap().is_none());
    }
}
