//! # CLI Structure and Argument Parsing
//!
//! The command line follows a command-subcommand pattern:
//!
//! - **Global options**: `--verbose`, `--quiet`, `--config`
//! - **Default command**: with no subcommand, `bmsync` runs a sync and
//!   accepts the sync flags directly
//! - **Subcommands**: `sync`, `list`, `clear-cache`, `completions`
//!
//! ```bash
//! # Sync the toolbar into ./bookmarks
//! bmsync
//!
//! # Sync a subfolder somewhere else, skipping two folders
//! bmsync sync --folder toolbar/reading --output ~/notes --ignore Archive,Old
//!
//! # Show what would be synced
//! bmsync list --bookmarks-file bookmarks.json
//! ```
//!
//! Flags override the config file; anything not given on the command line
//! keeps its configured value.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for the `bmsync` command
#[derive(Parser, Clone, Debug)]
#[command(name = "bmsync")]
#[command(version)]
#[command(about = "bmsync - Sync browser bookmarks into markdown notes", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Sync options used when no explicit command is provided
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "BMSYNC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The command to run, falling back to `sync` with the top-level flags.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Sync(self.sync))
    }
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Sync bookmarks into the output directory (default)
    Sync(SyncArgs),

    /// List the bookmarks a sync would cover
    List(ListArgs),

    /// Delete every cached extraction and cleanup result
    #[command(name = "clear-cache")]
    ClearCache {
        /// Cache directory to wipe
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Where the bookmark tree comes from and which part of it to use.
#[derive(Args, Clone, Debug, Default)]
pub struct SelectionArgs {
    /// Base folder path, e.g. `toolbar` or `toolbar/reading`
    #[arg(long, value_name = "PATH")]
    pub folder: Option<String>,

    /// Comma-separated folder titles to skip
    #[arg(long, value_delimiter = ',', value_name = "TITLES")]
    pub ignore: Vec<String>,

    /// Read the bookmark JSON from a file instead of running the source command
    #[arg(long, value_name = "FILE")]
    pub bookmarks_file: Option<PathBuf>,
}

/// Flags of the `sync` command
#[derive(Args, Clone, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SyncArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output directory for the generated notes
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Base URL of the page extraction service
    #[arg(long, value_name = "URL")]
    pub extract_url: Option<String>,

    /// Base URL of the screenshot service
    #[arg(long, value_name = "URL")]
    pub screenshot_api: Option<String>,

    /// Do not request or embed screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    /// API key for content cleanup (falls back to GEMINI_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub llm_key: Option<String>,

    /// Base URL of the OpenAI-compatible cleanup API
    #[arg(long, value_name = "URL")]
    pub llm_url: Option<String>,

    /// Model used for cleanup
    #[arg(long, value_name = "MODEL")]
    pub llm_model: Option<String>,

    /// Keep extracted content as-is
    #[arg(long)]
    pub no_cleanup: bool,

    /// Content cache directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Flags of the `list` command
#[derive(Args, Clone, Debug, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Output format for listings
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One path per line
    #[default]
    Text,
    /// JSON array
    Json,
}
