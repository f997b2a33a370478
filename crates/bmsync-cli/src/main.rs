//! bmsync CLI - Sync browser bookmarks into markdown notes
//!
//! This is the main entry point for the bmsync command-line interface.
//! Command implementations live in the library crate.

use anyhow::Result;
use bmsync_cli::cli::Cli;
use bmsync_cli::execute_command;
use bmsync_cli::utils::logging::initialize_logging;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute_command(cli))
}
