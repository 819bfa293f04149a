//! benchtree CLI — catalog benchmark result trees.
//!
//! Walks a results directory, recognises experiment and instance
//! directories, and writes the run hierarchy to `catalog.json`.

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
