//! Sync command implementation

use anyhow::{Context, Result};
use bmsync_core::{
    Config, ContentCache, ContentResolver, HttpClient, ScreenshotService, SyncEngine, SyncReport,
    cleaner_from_config,
};
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::SyncArgs;
use crate::utils::settings::{apply_sync, fetch_bookmarks};

/// Execute the sync command
///
/// Fatal failures (unreadable bookmarks, missing base folder, output
/// directories) are returned as errors. Per-bookmark failures only show up
/// in the printed summary.
pub async fn execute(mut config: Config, args: &SyncArgs) -> Result<SyncReport> {
    apply_sync(&mut config, args);

    let root = fetch_bookmarks(&config, &args.selection).await?;
    let base = root.require(&config.sync.folder)?;

    let http = HttpClient::new(config.http.timeout(), config.http.retry_policy())
        .context("Failed to build HTTP client")?;
    let cache = Arc::new(ContentCache::open_or_disabled(config.paths.cache_dir.clone()));
    if !cache.is_enabled() {
        warn!(dir = %config.paths.cache_dir.display(), "content cache unavailable, continuing without it");
    }

    let cleaner = cleaner_from_config(&config, &http, &cache);
    if cleaner.is_some() {
        info!(model = %config.cleanup.model, "content cleanup enabled");
    }
    let resolver = ContentResolver::from_config(&config, &http, &cache, cleaner);

    let mut engine = SyncEngine::new(&config.sync.output, &config.sync.ignore, resolver);
    if config.screenshots.enabled {
        engine = engine.with_screenshots(ScreenshotService::new(
            http.clone(),
            config.screenshots.base_url.clone(),
        ));
    }

    let report = engine.sync(base).await?;
    print_report(&report, std::io::stdout().lock())?;
    Ok(report)
}

/// Human-readable summary of a run.
pub fn print_report<W: Write>(report: &SyncReport, mut writer: W) -> Result<()> {
    writeln!(
        writer,
        "{} Created {}, already synced {}, failed {}",
        "✓".green(),
        report.created,
        report.skipped,
        report.failed()
    )?;
    if report.screenshots_submitted > 0 {
        writeln!(
            writer,
            "  Requested {} screenshot(s)",
            report.screenshots_submitted
        )?;
    }
    if !report.year_indexes.is_empty() {
        writeln!(writer, "  Updated {} year index(es)", report.year_indexes.len())?;
    }
    for failure in &report.failures {
        writeln!(
            writer,
            "  {} {} ({}): {}",
            "✗".red(),
            failure.title,
            failure.url,
            failure.reason
        )?;
    }
    Ok(())
}
