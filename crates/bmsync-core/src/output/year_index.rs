//! Per-year index notes (`<YYYY>.md`).
//!
//! Each index is a dataview query over the `#bookmark` tag filtered to one
//! year, so its content depends only on the year. Indexes are rewritten on
//! every run for every year that has at least one eligible bookmark.

use crate::bookmarks::BookmarkNode;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Eligible bookmarks created in one calendar year (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearIndex<'a> {
    /// Calendar year
    pub year: i32,
    /// Bookmarks, newest first
    pub entries: Vec<&'a BookmarkNode>,
}

impl YearIndex<'_> {
    /// Filename of this index.
    pub fn file_name(&self) -> String {
        format!("{}.md", self.year)
    }

    /// Index note content.
    pub fn render(&self) -> String {
        render_year_index(self.year)
    }
}

/// Group bookmarks by UTC creation year, each group newest first.
///
/// Years come back in ascending order.
pub fn group_by_year<'a, I>(bookmarks: I) -> Vec<YearIndex<'a>>
where
    I: IntoIterator<Item = &'a BookmarkNode>,
{
    let mut years: BTreeMap<i32, Vec<&'a BookmarkNode>> = BTreeMap::new();
    for node in bookmarks {
        years.entry(node.added_year()).or_default().push(node);
    }

    years
        .into_iter()
        .map(|(year, mut entries)| {
            entries.sort_by(|a, b| b.added_unix.cmp(&a.added_unix));
            YearIndex { year, entries }
        })
        .collect()
}

/// Content of the index note for `year`.
pub fn render_year_index(year: i32) -> String {
    format!(
        "---\n\
         cssclasses: [\"line3\"]\n\
         ---\n\
         ```dataview\n\
         TABLE path, url, dateformat(created_at, \"dd.MM\") as \"date\"\n\
         FROM #bookmark\n\
         WHERE dateformat(created_at, \"yyyy\") = \"{year}\"\n\
         SORT created_at DESC\n\
         ```\n"
    )
}

/// Write one index file per group into `output_dir`.
pub fn write_year_indexes(output_dir: &Path, indexes: &[YearIndex<'_>]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(indexes.len());
    for index in indexes {
        let path = output_dir.join(index.file_name());
        fs::write(&path, index.render()).map_err(|source| Error::FileWrite {
            path: path.clone(),
            source,
        })?;
        debug!(year = index.year, entries = index.entries.len(), "wrote year index");
        written.push(path);
    }
    Ok(written)
}
