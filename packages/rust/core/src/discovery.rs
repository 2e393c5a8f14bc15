//! Documentation template discovery.

use tracing::{debug, instrument};

use pkgbuild_shared::{PackageRoot, PkgBuildError, Result, TemplateEntry};

/// List every entry of `<root>/_dev/build/docs` in native directory order.
///
/// A missing directory is an error, not an empty listing. Entries are not
/// filtered; the renderer decides what to do with directories.
#[instrument(skip_all, fields(root = %root.path().display()))]
pub fn list_templates(root: &PackageRoot) -> Result<Vec<TemplateEntry>> {
    let dir = root.docs_templates_dir();
    let read_error = |source: std::io::Error| PkgBuildError::DirectoryRead {
        path: dir.clone(),
        source,
    };

    let mut templates = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        templates.push(TemplateEntry {
            file_name: entry.file_name().to_string_lossy().into_owned(),
            parent: dir.clone(),
        });
    }

    debug!(count = templates.len(), "templates listed");
    Ok(templates)
}
