//! Classification of package directories into shippable and development-only.

use std::ffi::OsStr;
use std::path::Path;

use pkgbuild_shared::DEV_DIR_NAME;

/// Whether a directory ends up in the built package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    /// Reserved for development tooling; never copied.
    DevelopmentOnly,
    Shippable,
}

/// Classify a single directory name.
pub fn classify(dir_name: &OsStr) -> EntryClass {
    if dir_name == DEV_DIR_NAME {
        EntryClass::DevelopmentOnly
    } else {
        EntryClass::Shippable
    }
}

/// Whether any directory segment of `relative` is development-only.
///
/// `relative` is a path relative to the package root. Every segment except
/// the last is a directory; the last is only classified when `is_dir` is set.
pub fn is_development_path(relative: &Path, is_dir: bool) -> bool {
    let segments: Vec<&OsStr> = relative.iter().collect();
    let dir_segments = if is_dir {
        &segments[..]
    } else {
        &segments[..segments.len().saturating_sub(1)]
    };
    dir_segments
        .iter()
        .any(|segment| classify(segment) == EntryClass::DevelopmentOnly)
}
