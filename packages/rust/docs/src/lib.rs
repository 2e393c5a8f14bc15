//! Documentation rendering for packages.
//!
//! Templates under `_dev/build/docs/` are rendered with `minijinja` and
//! written to the package's `docs/` directory. Templates see:
//! - `package` — the package manifest (every key, including unknown ones)
//! - `fields("<data_stream>")` — the exported-fields table of a data stream
//! - `event("<data_stream>")` — the sample event of a data stream
//!
//! Undefined variables are errors.

mod event;
mod fields;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use minijinja::{Environment, UndefinedBehavior, context};
use tracing::{debug, info, instrument};

use pkgbuild_shared::{PackageRoot, PkgBuildError, RenderResult, Result};

type HelperResult = std::result::Result<String, minijinja::Error>;

/// Renders one documentation template by file name.
pub trait DocsRenderer {
    /// Render `file_name` from the templates directory into final documentation.
    ///
    /// Returns a result with no target when nothing needed to be written.
    fn render(&self, file_name: &str) -> Result<RenderResult>;
}

/// Default renderer: `_dev/build/docs/<file>` → `docs/<file>`.
#[derive(Debug, Clone)]
pub struct ReadmeRenderer {
    root: PackageRoot,
}

impl ReadmeRenderer {
    pub fn new(root: PackageRoot) -> Self {
        Self { root }
    }

    /// Render template source into a string without touching the filesystem.
    pub fn render_source(&self, name: &str, source: &str) -> Result<String> {
        let env = self.environment();
        let template = env
            .template_from_named_str(name, source)
            .map_err(|e| template_error(name, &e))?;

        template
            .render(context! { package => self.root.manifest() })
            .map_err(|e| template_error(name, &e))
    }

    fn environment<'source>(&self) -> Environment<'source> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        let package_dir = self.root.path().to_path_buf();
        env.add_function("fields", move |data_stream: String| -> HelperResult {
            let dir = data_stream_dir(&package_dir, &data_stream)?;
            fields::render_fields_table(&dir).map_err(helper_error)
        });

        let package_dir = self.root.path().to_path_buf();
        env.add_function("event", move |data_stream: String| -> HelperResult {
            let dir = data_stream_dir(&package_dir, &data_stream)?;
            event::render_sample_event(&data_stream, &dir).map_err(helper_error)
        });

        env
    }
}

impl DocsRenderer for ReadmeRenderer {
    #[instrument(skip(self), fields(package = %self.root.manifest().name))]
    fn render(&self, file_name: &str) -> Result<RenderResult> {
        if file_name.starts_with('.') {
            debug!(file_name, "hidden template entry, skipping");
            return Ok(RenderResult::skipped());
        }

        let template_path = self.root.docs_templates_dir().join(file_name);
        match std::fs::metadata(&template_path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                debug!(path = %template_path.display(), "not a regular file, skipping");
                return Ok(RenderResult::skipped());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %template_path.display(), "template not found, skipping");
                return Ok(RenderResult::skipped());
            }
            Err(e) => return Err(PkgBuildError::io(&template_path, e)),
        }

        let source = std::fs::read_to_string(&template_path)
            .map_err(|e| PkgBuildError::io(&template_path, e))?;
        let rendered = self.render_source(file_name, &source)?;

        let docs_dir = self.root.docs_dir();
        let target = docs_dir.join(file_name);
        if is_up_to_date(&target, &rendered) {
            debug!(path = %target.display(), "rendered documentation already up to date");
            return Ok(RenderResult::skipped());
        }

        std::fs::create_dir_all(&docs_dir).map_err(|e| PkgBuildError::io(&docs_dir, e))?;
        std::fs::write(&target, &rendered).map_err(|e| PkgBuildError::io(&target, e))?;

        info!(path = %target.display(), bytes = rendered.len(), "documentation rendered");
        Ok(RenderResult::written(target))
    }
}

fn is_up_to_date(target: &Path, rendered: &str) -> bool {
    std::fs::read_to_string(target).is_ok_and(|existing| existing == rendered)
}

/// Resolve `data_stream/<name>` under the package, rejecting path tricks.
fn data_stream_dir(package_dir: &Path, name: &str) -> std::result::Result<PathBuf, minijinja::Error> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);
    if !valid {
        return Err(minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            format!("invalid data stream name '{name}'"),
        ));
    }
    Ok(package_dir.join("data_stream").join(name))
}

fn helper_error(err: PkgBuildError) -> minijinja::Error {
    minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
}

fn template_error(name: &str, err: &minijinja::Error) -> PkgBuildError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = std::error::Error::source(cause);
    }
    PkgBuildError::template(name, message)
}
