//! Merging command-line flags into the loaded configuration.

use anyhow::{Context, Result};
use bmsync_core::{BookmarkRoot, BookmarkSource, CommandSource, Config, FileSource};
use std::path::Path;
use tracing::debug;

use crate::cli::{SelectionArgs, SyncArgs};

/// Load the config file (explicit path, platform default or built-in
/// defaults) with environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).context("Failed to load configuration")?;
    debug!(?config.sync, "configuration loaded");
    Ok(config)
}

/// Apply folder and ignore flags.
///
/// `--ignore` replaces the configured list when given.
pub fn apply_selection(config: &mut Config, args: &SelectionArgs) {
    if let Some(folder) = &args.folder {
        config.sync.folder.clone_from(folder);
    }
    if !args.ignore.is_empty() {
        config.sync.ignore.clone_from(&args.ignore);
    }
}

/// Apply every `sync` flag.
pub fn apply_sync(config: &mut Config, args: &SyncArgs) {
    apply_selection(config, &args.selection);

    if let Some(output) = &args.output {
        config.sync.output.clone_from(output);
    }
    if let Some(url) = &args.extract_url {
        config.extract.base_url.clone_from(url);
    }
    if let Some(url) = &args.screenshot_api {
        config.screenshots.base_url.clone_from(url);
    }
    if args.no_screenshots {
        config.screenshots.enabled = false;
    }
    if let Some(key) = &args.llm_key {
        config.cleanup.api_key = Some(key.clone());
    }
    if let Some(url) = &args.llm_url {
        config.cleanup.base_url.clone_from(url);
    }
    if let Some(model) = &args.llm_model {
        config.cleanup.model.clone_from(model);
    }
    if args.no_cleanup {
        config.cleanup.enabled = false;
    }
    if let Some(dir) = &args.cache_dir {
        config.paths.cache_dir.clone_from(dir);
    }
}

/// Fetch the bookmark tree from `--bookmarks-file` or the configured command.
pub async fn fetch_bookmarks(config: &Config, args: &SelectionArgs) -> Result<BookmarkRoot> {
    let source: Box<dyn BookmarkSource> = match &args.bookmarks_file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(CommandSource::from_config(&config.source)),
    };
    Ok(source.fetch().await?)
}
