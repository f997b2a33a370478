//! List command implementation

use anyhow::Result;
use bmsync_core::{BookmarkNode, Config, eligible_bookmarks, ignore_set};
use serde::Serialize;

use crate::cli::{ListArgs, OutputFormat};
use crate::utils::settings::{apply_selection, fetch_bookmarks};

/// One eligible bookmark as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Bookmark id
    pub id: String,
    /// Bookmark title
    pub title: String,
    /// Bookmark URL
    pub url: String,
    /// `<folder>/<title>` relative to the base folder
    pub path: String,
}

/// Eligible bookmarks below `base` in traversal order.
pub fn list_entries(base: &BookmarkNode, ignore: &[String]) -> Vec<ListEntry> {
    eligible_bookmarks(base, &ignore_set(ignore))
        .into_iter()
        .map(|e| ListEntry {
            id: e.node.id.clone(),
            title: e.node.title.clone(),
            url: e.node.url().to_string(),
            path: e.full_path(),
        })
        .collect()
}

/// Execute the list command
pub async fn execute(mut config: Config, args: &ListArgs) -> Result<()> {
    apply_selection(&mut config, &args.selection);

    let root = fetch_bookmarks(&config, &args.selection).await?;
    let base = root.require(&config.sync.folder)?;
    let entries = list_entries(base, &config.sync.ignore);

    match args.format {
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}", entry.path);
            }
        },
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}
