//! Content cache wipe

use anyhow::{Context, Result};
use bmsync_core::ContentCache;
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// Remove every entry under `dir`, reporting to `writer`.
///
/// Returns the number of entries removed.
pub fn clear_cache<W: Write>(dir: &Path, mut writer: W) -> Result<usize> {
    if !dir.exists() {
        writeln!(writer, "{} Cache is already empty", "ℹ".blue())?;
        return Ok(0);
    }

    let cache = ContentCache::open(dir)
        .with_context(|| format!("Failed to open cache at {}", dir.display()))?;
    let removed = cache.clear().context("Failed to clear cache")?;

    writeln!(
        writer,
        "{} Cleared {removed} cached entr{} from {}",
        "✓".green(),
        if removed == 1 { "y" } else { "ies" },
        dir.display()
    )?;
    Ok(removed)
}

/// Execute the clear-cache command
pub fn execute(dir: &Path) -> Result<()> {
    clear_cache(dir, std::io::stdout().lock())?;
    Ok(())
}
