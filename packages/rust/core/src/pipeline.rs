//! End-to-end `build` pipeline: locate root → list templates → render → build.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use pkgbuild_builder::{PackageAssembler, PackageBuilder};
use pkgbuild_docs::{DocsRenderer, ReadmeRenderer};
use pkgbuild_shared::{BuildMode, BuildOptions, PackageRoot, PkgBuildError, Result, TemplateEntry};

use crate::discovery::list_templates;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Package root the run operated on.
    pub package_root: PathBuf,
    /// Number of template entries discovered.
    pub templates: usize,
    /// Documentation files written, in processing order.
    pub rendered: Vec<PathBuf>,
    /// Build artifacts produced, one per build.
    pub built: Vec<PathBuf>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait BuildReporter {
    /// Called once before the package root is located.
    fn started(&self);
    /// Called when a template produced a documentation file.
    fn rendered(&self, file_name: &str, target: &Path);
    /// Called after each package build.
    fn built(&self, target: &Path);
    /// Called when every template was processed without error.
    fn done(&self, summary: &BuildSummary);
}

/// No-op reporter for headless/test usage.
pub struct SilentReporter;

impl BuildReporter for SilentReporter {
    fn started(&self) {}
    fn rendered(&self, _file_name: &str, _target: &Path) {}
    fn built(&self, _target: &Path) {}
    fn done(&self, _summary: &BuildSummary) {}
}

/// Pipeline stages, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    RootResolved,
    TemplatesListed,
    Rendering,
    Building,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::RootResolved => "root-resolved",
            Self::TemplatesListed => "templates-listed",
            Self::Rendering => "rendering",
            Self::Building => "building",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Run the full `build` pipeline from `start` with the default components.
///
/// 1. Locate the package root (fatal if absent)
/// 2. List `_dev/build/docs`
/// 3. Render each template, building the package per [`BuildMode`]
#[instrument(skip_all, fields(start = %start.display(), mode = %options.mode))]
pub fn run_build(
    start: &Path,
    options: &BuildOptions,
    reporter: &dyn BuildReporter,
) -> Result<BuildSummary> {
    reporter.started();
    debug!(stage = %Stage::Start, "starting build pipeline");

    let root = pkgbuild_shared::locate_from(start)
        .map_err(|e| PkgBuildError::LocateRoot(Box::new(e)))?
        .ok_or(PkgBuildError::RootNotFound)?;

    let renderer = ReadmeRenderer::new(root.clone());
    let builder = PackageBuilder::new(root.clone()).with_output_dir(options.output_dir.clone());

    BuildPipeline::new(&renderer, &builder)
        .with_mode(options.mode)
        .run(&root, reporter)
}

/// Sequences rendering and building over the templates of one package.
pub struct BuildPipeline<'a> {
    renderer: &'a dyn DocsRenderer,
    assembler: &'a dyn PackageAssembler,
    mode: BuildMode,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(renderer: &'a dyn DocsRenderer, assembler: &'a dyn PackageAssembler) -> Self {
        Self {
            renderer,
            assembler,
            mode: BuildMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    /// Process every template of an already-resolved package root.
    ///
    /// Fails fast: the first error stops the run and nothing already written
    /// is rolled back.
    #[instrument(skip_all, fields(root = %root.path().display(), mode = %self.mode))]
    pub fn run(&self, root: &PackageRoot, reporter: &dyn BuildReporter) -> Result<BuildSummary> {
        let start = Instant::now();
        debug!(stage = %Stage::RootResolved, package = %root.manifest().name);

        let entries = list_templates(root).inspect_err(|e| warn!(error = %e, "pipeline failed"))?;
        debug!(stage = %Stage::TemplatesListed, count = entries.len());

        let mut summary = BuildSummary {
            package_root: root.path().to_path_buf(),
            templates: entries.len(),
            rendered: Vec::new(),
            built: Vec::new(),
            elapsed: Duration::ZERO,
        };

        if let Err(e) = self.process(&entries, reporter, &mut summary) {
            warn!(error = %e, "pipeline failed");
            return Err(e);
        }

        summary.elapsed = start.elapsed();
        debug!(stage = %Stage::Done);
        reporter.done(&summary);

        info!(
            templates = summary.templates,
            rendered = summary.rendered.len(),
            builds = summary.built.len(),
            elapsed_ms = summary.elapsed.as_millis(),
            "build pipeline complete"
        );

        Ok(summary)
    }

    fn process(
        &self,
        entries: &[TemplateEntry],
        reporter: &dyn BuildReporter,
        summary: &mut BuildSummary,
    ) -> Result<()> {
        match self.mode {
            BuildMode::PerTemplate => {
                for entry in entries {
                    self.render_entry(entry, reporter, summary)?;
                    self.build_package(reporter, summary)?;
                }
            }
            BuildMode::Once => {
                for entry in entries {
                    self.render_entry(entry, reporter, summary)?;
                }
                if !entries.is_empty() {
                    self.build_package(reporter, summary)?;
                }
            }
        }
        Ok(())
    }

    fn render_entry(
        &self,
        entry: &TemplateEntry,
        reporter: &dyn BuildReporter,
        summary: &mut BuildSummary,
    ) -> Result<()> {
        debug!(stage = %Stage::Rendering, file = %entry.file_name);
        let result = self
            .renderer
            .render(&entry.file_name)
            .map_err(|e| PkgBuildError::render(&entry.file_name, e))?;

        if let Some(target) = result.target {
            reporter.rendered(&entry.file_name, &target);
            summary.rendered.push(target);
        }
        Ok(())
    }

    fn build_package(&self, reporter: &dyn BuildReporter, summary: &mut BuildSummary) -> Result<()> {
        debug!(stage = %Stage::Building);
        let result = self.assembler.build().map_err(PkgBuildError::build)?;

        reporter.built(&result.target);
        summary.built.push(result.target);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
