//! Error types for pkgbuild.
//!
//! Library crates use [`PkgBuildError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pkgbuild operations.
#[derive(Debug, thiserror::Error)]
pub enum PkgBuildError {
    /// No package manifest was found in the ancestor chain.
    #[error("package root not found")]
    RootNotFound,

    /// Locating the package root failed for a reason other than "not found".
    #[error("locating package root failed: {0}")]
    LocateRoot(#[source] Box<PkgBuildError>),

    /// The documentation templates directory could not be listed.
    #[error("failed to return a list of directory entries from {path:?}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A documentation template failed to render.
    #[error("updating {file} file failed: {source}")]
    Render {
        file: String,
        #[source]
        source: Box<PkgBuildError>,
    },

    /// Assembling the package into the build directory failed.
    #[error("building package failed: {0}")]
    Build(#[source] Box<PkgBuildError>),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The package manifest could not be parsed.
    #[error("invalid package manifest {path:?}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// Template syntax or evaluation error.
    #[error("template error in {name}: {message}")]
    Template { name: String, message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PkgBuildError>;

impl PkgBuildError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a template error for the named template.
    pub fn template(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Template {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a manifest error for the manifest at `path`.
    pub fn manifest(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an error raised while rendering `file`.
    pub fn render(file: impl Into<String>, source: PkgBuildError) -> Self {
        Self::Render {
            file: file.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an error raised while building the package.
    pub fn build(source: PkgBuildError) -> Self {
        Self::Build(Box::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PkgBuildError::config("unknown build mode");
        assert_eq!(err.to_string(), "config error: unknown build mode");

        assert_eq!(
            PkgBuildError::RootNotFound.to_string(),
            "package root not found"
        );
    }

    #[test]
    fn stage_wrappers_keep_cause_in_message() {
        let inner = PkgBuildError::template("README.md", "undefined value");
        let err = PkgBuildError::render("README.md", inner);
        assert_eq!(
            err.to_string(),
            "updating README.md file failed: template error in README.md: undefined value"
        );

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = PkgBuildError::build(PkgBuildError::io("/repo/build", io));
        assert!(err.to_string().starts_with("building package failed: I/O error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
