//! `ben-gdf` CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, dispatch to the
//! selected pipeline command, and exit with appropriate status.
//! For programmatic use, prefer the library API (`ben_gdf_builder::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
