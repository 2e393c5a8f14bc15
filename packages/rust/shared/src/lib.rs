//! Shared types, error model, configuration and package root discovery for pkgbuild.
//!
//! This crate is the foundation depended on by all other pkgbuild crates.
//! It provides:
//! - [`PkgBuildError`] — the unified error type
//! - Domain types ([`PackageManifest`], [`PackageRoot`], [`TemplateEntry`])
//! - Configuration ([`AppConfig`], [`BuildOptions`], config loading)
//! - The root locator ([`locate`], [`locate_from`])

pub mod config;
pub mod error;
pub mod packages;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildMode, BuildOptions, BuildSection, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{PkgBuildError, Result};
pub use packages::{locate, locate_from, read_package_manifest};
pub use types::{
    BuildResult, DEV_DIR_NAME, MANIFEST_FILE_NAME, PackageManifest, PackageRoot,
    RenderResult, TemplateEntry,
};
