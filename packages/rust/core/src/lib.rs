//! Core pipeline orchestration for pkgbuild.
//!
//! This crate ties together root location, template discovery, documentation
//! rendering and package assembly into the `build` workflow.

pub mod discovery;
pub mod pipeline;

pub use discovery::list_templates;
pub use pipeline::{BuildPipeline, BuildReporter, BuildSummary, SilentReporter, run_build};
