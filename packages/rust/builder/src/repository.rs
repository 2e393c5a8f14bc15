//! Repository root lookup.

use std::path::{Path, PathBuf};

use tracing::debug;

use pkgbuild_shared::{PkgBuildError, Result};

/// Marker of a repository checkout; a directory, or a file for worktrees.
const REPOSITORY_MARKER: &str = ".git";

/// Name of the build output directory at the repository root.
pub const BUILD_DIR_NAME: &str = "build";

/// Find the nearest ancestor of `start` (inclusive) containing `.git`.
pub fn find_repository_root(start: &Path) -> Result<PathBuf> {
    for dir in start.ancestors() {
        let marker = dir.join(REPOSITORY_MARKER);
        match std::fs::symlink_metadata(&marker) {
            Ok(_) => {
                debug!(root = %dir.display(), "repository root found");
                return Ok(dir.to_path_buf());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(PkgBuildError::io(&marker, e)),
        }
    }

    Err(PkgBuildError::io(
        start,
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no repository root (.git) found in ancestor chain",
        ),
    ))
}

/// `<repo>/build`, the default build output root.
pub fn default_build_dir(package_root: &Path) -> Result<PathBuf> {
    Ok(find_repository_root(package_root)?.join(BUILD_DIR_NAME))
}
