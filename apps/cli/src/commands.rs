//! CLI command definitions, routing, and tracing setup.

use std::path::Path;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use pkgbuild_core::pipeline::{BuildReporter, BuildSummary};
use pkgbuild_shared::{AppConfig, BuildMode, BuildOptions, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pkgbuild — build packages from their source tree.
#[derive(Parser)]
#[command(
    name = "pkgbuild",
    version,
    about = "Render package documentation and assemble packages into the build directory.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the package containing the current directory.
    ///
    /// Renders every template found in `_dev/build/docs/` into `docs/`, then
    /// copies the package into `build/<name>/<version>` at the root of the
    /// repository checkout. All `_dev` directories are left out.
    Build {
        /// When to assemble the package: per-template or once.
        #[arg(long, env = "PKGBUILD_BUILD_MODE")]
        mode: Option<BuildMode>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr; stdout carries the build progress lines.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pkgbuild=info",
        1 => "pkgbuild=debug",
        _ => "pkgbuild=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build { mode } => cmd_build(mode),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_build(mode: Option<BuildMode>) -> Result<()> {
    let config = load_config()?;
    let mut options = BuildOptions::from(&config);
    if let Some(mode) = mode {
        options.mode = mode;
    }

    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    info!(cwd = %cwd.display(), mode = %options.mode, "building package");

    pkgbuild_core::run_build(&cwd, &options, &ConsoleReporter)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Prints one line per pipeline event to stdout.
struct ConsoleReporter;

impl BuildReporter for ConsoleReporter {
    fn started(&self) {
        println!("Build the package");
    }

    fn rendered(&self, file_name: &str, target: &Path) {
        println!("{file_name} file rendered: {}", target.display());
    }

    fn built(&self, target: &Path) {
        println!("Package built: {}", target.display());
    }

    fn done(&self, _summary: &BuildSummary) {
        println!("Done");
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
