//! pkgbuild CLI — builds a package from its source tree.
//!
//! Renders documentation templates and assembles the package into the
//! repository's `build/` directory.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
