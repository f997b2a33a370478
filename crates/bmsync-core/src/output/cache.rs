//! Index of notes already present in the output tree.
//!
//! Rebuilt every run by scanning the frontmatter of existing `*.md` files;
//! a bookmark whose id is in the index is considered synced and is never
//! fetched again.

use super::frontmatter::Frontmatter;
use crate::bookmarks::BookmarkNode;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What the output tree remembers about one generated note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    /// Bookmark id
    pub id: String,
    /// Bookmark title
    pub title: String,
    /// Bookmark URL
    pub url: String,
    /// Folder path relative to the sync base
    pub path: String,
    /// Creation date as written (`YYYY-MM-DD`)
    pub created_at: String,
    /// Optional description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// File the record was read from or written to
    pub file: PathBuf,
}

impl OutputRecord {
    /// Record for `frontmatter` stored in `file`.
    pub fn from_frontmatter(frontmatter: Frontmatter, file: PathBuf) -> Self {
        Self {
            id: frontmatter.id,
            title: frontmatter.title,
            url: frontmatter.url,
            path: frontmatter.path,
            created_at: frontmatter.created_at,
            description: frontmatter.description,
            tags: frontmatter.tags,
            file,
        }
    }
}

/// Id-keyed index of synced notes.
#[derive(Debug, Default)]
pub struct OutputCache {
    records: HashMap<String, OutputRecord>,
    owners: HashMap<PathBuf, String>,
}

impl OutputCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `output_dir` for generated notes.
    ///
    /// A missing directory yields an empty cache. Files that cannot be read
    /// or parsed are skipped with a warning; files without frontmatter or
    /// without an id (year indexes, hand-written notes) are skipped quietly.
    pub fn build(output_dir: &Path) -> Self {
        let mut cache = Self::new();
        if !output_dir.exists() {
            debug!(dir = %output_dir.display(), "output directory absent, starting empty");
            return cache;
        }

        for entry in WalkDir::new(output_dir).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("failed to access output entry: {e}");
                    continue;
                },
            };
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }

            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), "failed to read note: {e}");
                    continue;
                },
            };

            match Frontmatter::parse(&text) {
                Ok(Some(frontmatter)) if !frontmatter.id.is_empty() => {
                    cache.insert(OutputRecord::from_frontmatter(
                        frontmatter,
                        path.to_path_buf(),
                    ));
                },
                Ok(_) => debug!(path = %path.display(), "no bookmark id, skipping"),
                Err(e) => warn!(path = %path.display(), "failed to parse frontmatter: {e}"),
            }
        }

        info!(entries = cache.len(), "output cache built");
        cache
    }

    /// Whether a note for `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Record for `id`.
    pub fn get(&self, id: &str) -> Option<&OutputRecord> {
        self.records.get(id)
    }

    /// Add or replace the record for `record.id`.
    pub fn insert(&mut self, record: OutputRecord) {
        if let Some(previous) = self.records.get(&record.id) {
            self.owners.remove(&previous.file);
        }
        self.owners.insert(record.file.clone(), record.id.clone());
        self.records.insert(record.id.clone(), record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the cache has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id of the bookmark that owns `file`, if any.
    pub fn owner_of(&self, file: &Path) -> Option<&str> {
        self.owners.get(file).map(String::as_str)
    }

    /// URLs of candidates without a note, in input order.
    pub fn collect_unsynced_urls<'a, I>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a BookmarkNode>,
    {
        candidates
            .into_iter()
            .filter(|node| !self.contains(&node.id))
            .map(|node| node.url().to_string())
            .collect()
    }
}
