//! bmsync CLI library
//!
//! Argument definitions and command implementations behind the `bmsync`
//! binary, exposed as a library so they can be tested directly.

pub mod cli;
pub mod commands;
pub mod utils;

use anyhow::Result;

use cli::{Cli, Commands};
use utils::settings::load_config;

/// Run the command selected by `cli`.
pub async fn execute_command(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.into_command() {
        Commands::Completions { shell } => commands::generate(shell),
        Commands::ClearCache { cache_dir } => {
            let dir = match cache_dir {
                Some(dir) => dir,
                None => load_config(config_path.as_deref())?.paths.cache_dir,
            };
            commands::clear_cache_command(&dir)?;
        },
        Commands::List(args) => {
            let config = load_config(config_path.as_deref())?;
            commands::list_bookmarks(config, &args).await?;
        },
        Commands::Sync(args) => {
            let config = load_config(config_path.as_deref())?;
            commands::run_sync(config, &args).await?;
        },
    }
    Ok(())
}
