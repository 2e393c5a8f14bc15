//! Package assembly.
//!
//! Copies a package source tree into `<repo>/build/<name>/<version>`,
//! leaving out every development-only directory at any depth.
//!
//! ```text
//! <repo>/
//! ├── .git/
//! ├── packages/foo/          (package root)
//! │   ├── manifest.yml
//! │   ├── _dev/              (never shipped)
//! │   └── docs/README.md
//! └── build/foo/1.0.0/       (build artifact)
//!     ├── manifest.yml
//!     └── docs/README.md
//! ```

pub mod filter;
pub mod repository;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use pkgbuild_shared::{BuildResult, PackageRoot, PkgBuildError, Result};

pub use filter::{EntryClass, classify, is_development_path};
pub use repository::{BUILD_DIR_NAME, default_build_dir, find_repository_root};

/// Assembles a package into its build destination.
pub trait PackageAssembler {
    fn build(&self) -> Result<BuildResult>;
}

/// Default assembler copying the package tree on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct PackageBuilder {
    /// Already-resolved root; `None` re-resolves the root on each build.
    root: Option<PackageRoot>,
    /// Where re-resolution starts; `None` means the working directory.
    start: Option<PathBuf>,
    /// Build output root override; `None` means `<repo>/build`.
    output_dir: Option<PathBuf>,
}

/// Counters collected while copying.
#[derive(Debug, Default, Clone, Copy)]
struct CopyStats {
    files: usize,
    dirs_skipped: usize,
}

impl PackageBuilder {
    pub fn new(root: PackageRoot) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    /// A builder that locates the package root itself at build time.
    pub fn from_current_dir() -> Self {
        Self::default()
    }

    /// Like [`from_current_dir`](Self::from_current_dir), searching upward from `start`.
    pub fn from_dir(start: impl Into<PathBuf>) -> Self {
        Self {
            start: Some(start.into()),
            ..Self::default()
        }
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    /// Build output root for `root`.
    pub fn build_dir(&self, root: &PackageRoot) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => std::path::absolute(dir).map_err(|e| PkgBuildError::io(dir, e)),
            None => default_build_dir(root.path()),
        }
    }

    fn resolve_root(&self) -> Result<PackageRoot> {
        let located = match (&self.root, &self.start) {
            (Some(root), _) => return Ok(root.clone()),
            (None, Some(start)) => pkgbuild_shared::locate_from(start)?,
            (None, None) => pkgbuild_shared::locate()?,
        };
        located.ok_or(PkgBuildError::RootNotFound)
    }
}

impl PackageAssembler for PackageBuilder {
    #[instrument(skip_all)]
    fn build(&self) -> Result<BuildResult> {
        let root = self.resolve_root()?;
        let manifest = root.manifest();
        let manifest_path = root.path().join(pkgbuild_shared::MANIFEST_FILE_NAME);
        check_path_segment(&manifest_path, "name", &manifest.name)?;
        check_path_segment(&manifest_path, "version", &manifest.version)?;

        let build_dir = self.build_dir(&root)?;
        let target = build_dir.join(&manifest.name).join(&manifest.version);

        info!(
            package = %manifest.name,
            version = %manifest.version,
            target = %target.display(),
            "building package"
        );

        // Compare resolved paths so `..` and symlinks cannot hide an overlap.
        std::fs::create_dir_all(&build_dir).map_err(|e| PkgBuildError::io(&build_dir, e))?;
        let source = canonical(root.path())?;
        let resolved_build_dir = canonical(&build_dir)?;
        let resolved_target = resolved_build_dir.join(&manifest.name).join(&manifest.version);
        if source.starts_with(&resolved_target) {
            return Err(PkgBuildError::config(format!(
                "build destination {} would replace the package source {}",
                resolved_target.display(),
                source.display()
            )));
        }

        if target.exists() {
            std::fs::remove_dir_all(&target).map_err(|e| PkgBuildError::io(&target, e))?;
            debug!(path = %target.display(), "cleared previous build");
        }

        let excluded = [resolved_build_dir, resolved_target];
        let mut stats = CopyStats::default();
        copy_tree(&source, &target, &excluded, &mut stats)?;

        info!(
            files = stats.files,
            dirs_skipped = stats.dirs_skipped,
            "package build complete"
        );

        Ok(BuildResult { target })
    }
}

/// Reject manifest values that would escape the build directory.
fn check_path_segment(manifest_path: &Path, field: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(PkgBuildError::manifest(
            manifest_path,
            format!("{field} '{value}' cannot be used as a directory name"),
        ))
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| PkgBuildError::io(path, e))
}

/// Recursively copy `src` into `dst`, skipping development-only directories
/// and the `excluded` paths (the build output, when it lives inside the package).
///
/// `src` and `excluded` must be canonical.
fn copy_tree(src: &Path, dst: &Path, excluded: &[PathBuf], stats: &mut CopyStats) -> Result<()> {
    std::fs::create_dir_all(dst).map_err(|e| PkgBuildError::io(dst, e))?;

    let entries = std::fs::read_dir(src).map_err(|e| PkgBuildError::io(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PkgBuildError::io(src, e))?;
        let path = entry.path();
        if excluded.contains(&path) {
            debug!(path = %path.display(), "skipping build output directory");
            continue;
        }

        let name = entry.file_name();
        let file_type = entry.file_type().map_err(|e| PkgBuildError::io(&path, e))?;

        if file_type.is_dir() {
            if classify(&name) == EntryClass::DevelopmentOnly {
                debug!(path = %path.display(), "skipping development-only directory");
                stats.dirs_skipped += 1;
                continue;
            }
            copy_tree(&path, &dst.join(&name), excluded, stats)?;
        } else if file_type.is_file() {
            copy_file(&path, &dst.join(&name), stats)?;
        } else if file_type.is_symlink() {
            // Links to files are copied by content; directory links are not followed.
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => copy_file(&path, &dst.join(&name), stats)?,
                Ok(_) => warn!(path = %path.display(), "skipping symlinked directory"),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping broken symlink"),
            }
        }
    }

    Ok(())
}

fn copy_file(from: &Path, to: &Path, stats: &mut CopyStats) -> Result<()> {
    std::fs::copy(from, to).map_err(|e| PkgBuildError::io(from, e))?;
    stats.files += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    use pkgbuild_shared::PackageManifest;

    /// `<tmp>/.git`, `<tmp>/packages/foo` with a typical package layout.
    fn fixture() -> (TempDir, PackageRoot) {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();

        let pkg = tmp.path().join("packages/foo");
        let files = [
            ("manifest.yml", "name: foo\nversion: 1.0.0\n"),
            ("docs/README.md", "# Foo\n"),
            ("_dev/build/docs/README.md", "# {{ package.title }}\n"),
            ("_dev/build/build.yml", "dependencies: {}\n"),
            ("data_stream/logs/manifest.yml", "title: Logs\n"),
            ("data_stream/logs/fields/fields.yml", "- name: message\n"),
            ("data_stream/logs/_dev/test/pipeline/test.log", "line\n"),
            ("kibana/_dev", "a file, not a directory\n"),
        ];
        for (rel, body) in files {
            let path = pkg.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        let manifest: PackageManifest =
            serde_yaml::from_str("name: foo\nversion: 1.0.0\n").unwrap();
        (tmp, PackageRoot::new(pkg, manifest))
    }

    fn relative_files(root: &Path) -> Vec<PathBuf> {
        fn walk(dir: &Path, base: &Path, out: &mut Vec<PathBuf>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                out.push(path.strip_prefix(base).unwrap().to_path_buf());
                if path.is_dir() {
                    walk(&path, base, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(root, root, &mut out);
        out.sort();
        out
    }

    #[test]
    fn builds_into_repository_build_directory() {
        let (tmp, root) = fixture();

        let result = PackageBuilder::new(root).build().unwrap();

        assert_eq!(result.target, tmp.path().join("build/foo/1.0.0"));
        assert!(result.target.join("manifest.yml").is_file());
        assert!(result.target.join("docs/README.md").is_file());
        assert!(result.target.join("data_stream/logs/fields/fields.yml").is_file());
    }

    #[test]
    fn development_directories_are_never_copied() {
        let (_tmp, root) = fixture();

        let result = PackageBuilder::new(root).build().unwrap();

        for rel in relative_files(&result.target) {
            let is_dir = result.target.join(&rel).is_dir();
            assert!(
                !is_development_path(&rel, is_dir),
                "development path shipped: {}",
                rel.display()
            );
        }
        // A plain file that happens to be named `_dev` is kept.
        assert!(result.target.join("kibana/_dev").is_file());
    }

    #[test]
    fn rebuild_removes_stale_files() {
        let (_tmp, root) = fixture();
        let builder = PackageBuilder::new(root.clone());

        let first = builder.build().unwrap();
        fs::write(first.target.join("stale.txt"), "old").unwrap();

        let second = builder.build().unwrap();
        assert_eq!(first, second);
        assert!(!second.target.join("stale.txt").exists());
    }

    #[test]
    fn source_tree_is_left_untouched() {
        let (_tmp, root) = fixture();
        let before = relative_files(root.path());

        PackageBuilder::new(root.clone()).build().unwrap();

        assert_eq!(relative_files(root.path()), before);
    }

    #[test]
    fn output_dir_inside_package_is_not_copied_into_itself() {
        let (_tmp, root) = fixture();
        let out = root.path().join("out");

        let result = PackageBuilder::new(root.clone())
            .with_output_dir(Some(out.clone()))
            .build()
            .unwrap();

        assert_eq!(result.target, out.join("foo/1.0.0"));
        assert!(!result.target.join("out").exists());
    }

    #[test]
    fn output_dir_reaching_into_package_through_parent_components() {
        let (_tmp, root) = fixture();
        let out = root.path().join("sub/../out");

        let result = PackageBuilder::new(root.clone())
            .with_output_dir(Some(out))
            .build()
            .unwrap();

        assert!(result.target.join("manifest.yml").is_file());
        assert!(!result.target.join("out").exists());
        assert!(!root.path().join("out/foo/1.0.0/out").exists());
    }

    #[cfg(unix)]
    #[test]
    fn output_dir_symlinked_into_package() {
        let (tmp, root) = fixture();
        fs::create_dir_all(root.path().join("out")).unwrap();
        let link = tmp.path().join("out-link");
        std::os::unix::fs::symlink(root.path().join("out"), &link).unwrap();

        let result = PackageBuilder::new(root.clone())
            .with_output_dir(Some(link))
            .build()
            .unwrap();

        assert!(result.target.join("manifest.yml").is_file());
        assert!(!result.target.join("out").exists());
    }

    #[test]
    fn destination_covering_the_package_is_refused() {
        let tmp = tempdir().unwrap();
        let pkg = tmp.path().join("foo/1.0.0");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("manifest.yml"), "name: foo\nversion: 1.0.0\n").unwrap();
        let manifest: PackageManifest =
            serde_yaml::from_str("name: foo\nversion: 1.0.0\n").unwrap();
        let root = PackageRoot::new(&pkg, manifest);

        let err = PackageBuilder::new(root)
            .with_output_dir(Some(tmp.path().to_path_buf()))
            .build()
            .unwrap_err();

        assert!(matches!(err, PkgBuildError::Config { .. }));
        assert!(pkg.join("manifest.yml").is_file());
    }

    #[test]
    fn from_dir_locates_the_package_itself() {
        let (tmp, root) = fixture();

        let result = PackageBuilder::from_dir(root.path().join("data_stream/logs/fields"))
            .build()
            .unwrap();

        assert_eq!(result.target, tmp.path().join("build/foo/1.0.0"));
        assert!(result.target.join("manifest.yml").is_file());
    }

    #[test]
    fn from_dir_without_package_is_root_not_found() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let dir = tmp.path().join("not-a-package");
        fs::create_dir_all(&dir).unwrap();

        let err = PackageBuilder::from_dir(&dir).build().unwrap_err();

        assert!(matches!(err, PkgBuildError::RootNotFound));
        assert!(!tmp.path().join("build").exists());
    }

    #[test]
    fn unsafe_version_is_rejected() {
        let (_tmp, root) = fixture();
        let manifest: PackageManifest =
            serde_yaml::from_str("name: foo\nversion: ../escape\n").unwrap();
        let root = PackageRoot::new(root.path(), manifest);

        let err = PackageBuilder::new(root).build().unwrap_err();
        assert!(err.to_string().contains("cannot be used as a directory name"));
    }
}
