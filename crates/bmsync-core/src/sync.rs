//! Incremental synchronization of a bookmark folder into a markdown tree.
//!
//! One run of [`SyncEngine::sync`]:
//!
//! 1. Ensure the output root exists.
//! 2. Collect the eligible bookmarks below the base folder (live bookmarks
//!    outside ignored folders).
//! 3. Ask the screenshot service for captures of URLs that have no note yet.
//! 4. Walk the base folder, mirroring folders as directories and writing a
//!    note for every eligible bookmark missing from the output cache.
//! 5. Rewrite the per-year index notes.
//!
//! Structural failures (missing output root, directory creation) abort the
//! run. Everything else is isolated to the bookmark it concerns: the note is
//! not written, the failure is logged and counted, and the next run retries.

use crate::bookmarks::{BookmarkNode, NodeKind, join_path, parent_path};
use crate::output::{
    Frontmatter, OutputCache, OutputRecord, folder_dir_name, group_by_year, render_document,
    sanitize_filename, with_id_suffix, write_year_indexes,
};
use crate::resolver::ContentResolver;
use crate::screenshots::ScreenshotService;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A bookmark selected for syncing, with the folder path it lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleBookmark<'a> {
    /// Folder path relative to the base, empty at the base itself
    pub folder: String,
    /// The bookmark
    pub node: &'a BookmarkNode,
}

impl EligibleBookmark<'_> {
    /// `<folder>/<title>` relative to the base.
    pub fn full_path(&self) -> String {
        join_path(&self.folder, &self.node.title)
    }
}

/// A bookmark whose note could not be produced this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Bookmark id
    pub id: String,
    /// Bookmark title
    pub title: String,
    /// Bookmark URL
    pub url: String,
    /// Error category (see [`Error::category`])
    pub category: &'static str,
    /// Human-readable reason
    pub reason: String,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Notes written this run
    pub created: usize,
    /// Eligible bookmarks that already had a note
    pub skipped: usize,
    /// Bookmarks whose note could not be written
    pub failures: Vec<SyncFailure>,
    /// URLs submitted to the screenshot service
    pub screenshots_submitted: usize,
    /// Year index files written
    pub year_indexes: Vec<PathBuf>,
}

impl SyncReport {
    /// Number of failed bookmarks.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Drives a sync run and owns the output cache for its lifetime.
#[derive(Debug)]
pub struct SyncEngine {
    output_dir: PathBuf,
    ignore: HashSet<String>,
    resolver: ContentResolver,
    screenshots: Option<ScreenshotService>,
    cache: OutputCache,
}

impl SyncEngine {
    /// Engine writing under `output_dir`, skipping folders titled in
    /// `ignore`. The output cache is built from `output_dir` right away.
    pub fn new<I, S>(output_dir: impl Into<PathBuf>, ignore: I, resolver: ContentResolver) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let output_dir = output_dir.into();
        let cache = OutputCache::build(&output_dir);
        Self {
            output_dir,
            ignore: ignore_set(ignore),
            resolver,
            screenshots: None,
            cache,
        }
    }

    /// Request and embed screenshots through `service`.
    #[must_use]
    pub fn with_screenshots(mut self, service: ScreenshotService) -> Self {
        self.screenshots = Some(service);
        self
    }

    /// Output root.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Index of notes already on disk.
    pub const fn output_cache(&self) -> &OutputCache {
        &self.cache
    }

    /// Live bookmarks below `base` that are not inside an ignored folder.
    pub fn eligible_bookmarks<'a>(&self, base: &'a BookmarkNode) -> Vec<EligibleBookmark<'a>> {
        eligible_bookmarks(base, &self.ignore)
    }

    /// Run one sync of `base` into the output tree.
    #[tracing::instrument(skip_all, fields(base = %base.title, output = %self.output_dir.display()))]
    pub async fn sync(&mut self, base: &BookmarkNode) -> Result<SyncReport> {
        create_dir(&self.output_dir)?;

        let eligible = self.eligible_bookmarks(base);
        let mut report = SyncReport::default();
        info!(eligible = eligible.len(), synced = self.cache.len(), "starting sync");

        report.screenshots_submitted = self.request_screenshots(&eligible).await;

        // Logical folder path -> directory on disk
        let mut dirs = HashMap::from([(String::new(), self.output_dir.clone())]);
        let ignore = &self.ignore;
        let children = base.walk_pruned(move |n| is_ignored_folder(n, ignore)).skip(1);
        for (path, node) in children {
            let folder = parent_path(&path, &node.title);
            let parent_dir = dirs
                .get(folder)
                .cloned()
                .unwrap_or_else(|| self.output_dir.clone());
            match node.kind {
                NodeKind::Folder if ignore.contains(node.title.as_str()) => {
                    info!(folder = %node.title, "skipping ignored folder");
                },
                NodeKind::Folder => {
                    let dir = parent_dir.join(folder_dir_name(&node.title));
                    create_dir(&dir)?;
                    dirs.insert(path, dir);
                },
                NodeKind::Bookmark if !node.deleted => {
                    if self.cache.contains(&node.id) {
                        report.skipped += 1;
                        continue;
                    }
                    match self.create_note(node, folder, &parent_dir).await {
                        Ok(record) => {
                            self.cache.insert(record);
                            report.created += 1;
                        },
                        Err(e) => {
                            error!(
                                title = %node.title,
                                url = node.url(),
                                category = e.category(),
                                "failed to create note: {e}"
                            );
                            report.failures.push(SyncFailure {
                                id: node.id.clone(),
                                title: node.title.clone(),
                                url: node.url().to_string(),
                                category: e.category(),
                                reason: e.to_string(),
                            });
                        },
                    }
                },
                NodeKind::Bookmark | NodeKind::Other => {},
            }
        }

        let years = group_by_year(eligible.iter().map(|e| e.node));
        report.year_indexes = write_year_indexes(&self.output_dir, &years)?;

        info!(
            created = report.created,
            skipped = report.skipped,
            failed = report.failed(),
            "sync finished"
        );
        Ok(report)
    }

    async fn request_screenshots(&self, eligible: &[EligibleBookmark<'_>]) -> usize {
        let Some(service) = &self.screenshots else {
            return 0;
        };

        let unsynced = self
            .cache
            .collect_unsynced_urls(eligible.iter().map(|e| e.node));
        if unsynced.is_empty() {
            return 0;
        }

        let existing = match service.existing().await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("skipping screenshots: {e}");
                return 0;
            },
        };

        let mut seen = HashSet::new();
        let missing: Vec<String> = unsynced
            .into_iter()
            .filter(|url| !existing.contains(url) && seen.insert(url.clone()))
            .collect();
        if missing.is_empty() {
            debug!("all screenshots already captured");
            return 0;
        }

        match service.submit(&missing).await {
            Ok(()) => missing.len(),
            Err(e) => {
                warn!("screenshot submission failed: {e}");
                0
            },
        }
    }

    async fn create_note(
        &self,
        node: &BookmarkNode,
        folder: &str,
        dir: &Path,
    ) -> Result<OutputRecord> {
        info!(title = %node.title, url = node.url(), path = folder, "creating note");
        let body = self.resolver.resolve(node.url()).await?;

        let frontmatter = Frontmatter::for_bookmark(node, folder);
        let screenshot = self.screenshots.as_ref().map(|s| s.url_for(node.url()));
        let document = render_document(&frontmatter, screenshot.as_deref(), &body);

        let file = self.note_path(node, dir);
        fs::write(&file, document).map_err(|source| Error::FileWrite {
            path: file.clone(),
            source,
        })?;
        debug!(file = %file.display(), "wrote note");

        Ok(OutputRecord::from_frontmatter(frontmatter, file))
    }

    /// Target file for `node`, disambiguated when another bookmark already
    /// owns the derived name.
    fn note_path(&self, node: &BookmarkNode, dir: &Path) -> PathBuf {
        let name = sanitize_filename(&node.title, node.url());
        let candidate = dir.join(&name);
        match self.cache.owner_of(&candidate) {
            Some(owner) if owner != node.id => {
                warn!(file = %candidate.display(), owner, id = %node.id, "filename taken, appending id");
                dir.join(with_id_suffix(&name, &node.id))
            },
            _ => candidate,
        }
    }
}

/// Live bookmarks below `base`, outside folders titled in `ignore`, paired
/// with their folder path.
pub fn eligible_bookmarks<'a>(
    base: &'a BookmarkNode,
    ignore: &HashSet<String>,
) -> Vec<EligibleBookmark<'a>> {
    let ignore = ignore.clone();
    base.walk_pruned(move |n| is_ignored_folder(n, &ignore))
        .filter(|(_, node)| node.is_live_bookmark())
        .map(|(path, node)| EligibleBookmark {
            folder: parent_path(&path, &node.title).to_string(),
            node,
        })
        .collect()
}

/// Trimmed, non-empty folder titles.
pub fn ignore_set<I, S>(titles: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    titles
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_ignored_folder(node: &BookmarkNode, ignore: &HashSet<String>) -> bool {
    node.is_folder() && ignore.contains(node.title.as_str())
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content_cache::ContentCache;
    use crate::http::{HttpClient, RetryPolicy};
    use crate::resolver::{GenericStrategy, VideoStrategy};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tree() -> BookmarkNode {
        BookmarkNode::folder(
            "toolbar",
            "toolbar",
            vec![
                BookmarkNode::folder(
                    "f1",
                    "docs",
                    vec![BookmarkNode::bookmark("b1", "page1", "https://example.com/a", 1_700_000_000)],
                ),
                BookmarkNode::folder(
                    "f2",
                    "Archive",
                    vec![BookmarkNode::bookmark("b2", "old", "https://example.com/old", 1_600_000_000)],
                ),
                BookmarkNode::bookmark("b3", "gone", "https://example.com/gone", 0).into_deleted(),
            ],
        )
    }

    fn resolver(extract_base: &str) -> ContentResolver {
        let http = HttpClient::new(Duration::from_secs(5), RetryPolicy::no_retry()).unwrap();
        ContentResolver::new(GenericStrategy::new(
            http,
            Arc::new(ContentCache::disabled()),
            extract_base,
            None,
        ))
        .with_strategy(VideoStrategy)
    }

    #[test]
    fn test_eligible_respects_ignore_and_deleted() {
        let base = tree();
        let ignore = ignore_set(["Archive"]);

        let eligible = eligible_bookmarks(&base, &ignore);

        let ids: Vec<_> = eligible.iter().map(|e| e.node.id.as_str()).collect();
        assert_eq!(ids, ["b1"]);
        assert_eq!(eligible[0].folder, "docs");
        assert_eq!(eligible[0].full_path(), "docs/page1");
    }

    #[test]
    fn test_ignore_set_trims_entries() {
        let set = ignore_set([" Archive ", "", "  "]);
        assert_eq!(set.len(), 1);
        assert!(set.contains("Archive"));
    }

    #[tokio::test]
    async fn test_sync_writes_notes_and_skips_ignored() {
        // Given: an extraction server and an empty output dir
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("url", "https://example.com/a"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Page A"))
            .expect(1)
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");

        // When: syncing with Archive ignored
        let mut engine = SyncEngine::new(&out, ["Archive"], resolver(&server.uri()));
        let report = engine.sync(&tree()).await.unwrap();

        // Then: one note, no Archive directory, one year index
        assert_eq!(report.created, 1);
        assert_eq!(report.failed(), 0);
        let note = fs::read_to_string(out.join("docs/example.com - page1.md")).unwrap();
        assert!(note.contains("id: b1\n"));
        assert!(note.contains("path: docs\n"));
        assert!(note.ends_with("---\n# Page A\n"));
        assert!(!out.join("Archive").exists());
        assert_eq!(report.year_indexes, vec![out.join("2023.md")]);
    }

    #[tokio::test]
    async fn test_folder_titles_cannot_escape_output_dir() {
        // Given: folders titled like absolute and parent paths
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("root").join("out");
        let base = BookmarkNode::folder(
            "t",
            "toolbar",
            vec![
                BookmarkNode::folder(
                    "f1",
                    "/abs/dir",
                    vec![BookmarkNode::bookmark("a", "a", "https://youtu.be/a", 0)],
                ),
                BookmarkNode::folder(
                    "f2",
                    "..",
                    vec![
                        BookmarkNode::bookmark("b", "b", "https://youtu.be/b", 0),
                        BookmarkNode::folder(
                            "f3",
                            "../escape",
                            vec![BookmarkNode::bookmark("c", "c", "https://youtu.be/c", 0)],
                        ),
                    ],
                ),
            ],
        );

        // When: syncing
        let mut engine = SyncEngine::new(&out, Vec::<String>::new(), resolver("http://127.0.0.1:9"));
        let report = engine.sync(&base).await.unwrap();

        // Then: every note lands below the output dir
        assert_eq!(report.created, 3);
        assert!(out.join("abs dir/youtu.be - a.md").exists());
        assert!(out.join("__/youtu.be - b.md").exists());
        assert!(out.join("__/.. escape/youtu.be - c.md").exists());
        let outside: Vec<_> = fs::read_dir(temp.path().join("root"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(outside, ["out"]);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);

        // And: the notes keep their logical folder paths
        let cache = OutputCache::build(&out);
        assert_eq!(cache.get("a").unwrap().path, "/abs/dir");
        assert_eq!(cache.get("c").unwrap().path, "../../escape");
    }

    #[tokio::test]
    async fn test_failed_resolution_is_isolated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();

        let base = BookmarkNode::folder(
            "t",
            "toolbar",
            vec![
                BookmarkNode::bookmark("bad", "bad", "https://example.com/bad", 0),
                BookmarkNode::bookmark("vid", "video", "https://youtu.be/xyz", 0),
            ],
        );
        let mut engine = SyncEngine::new(temp.path(), Vec::<String>::new(), resolver(&server.uri()));
        let report = engine.sync(&base).await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].id, "bad");
        assert_eq!(report.failures[0].category, "content");
        assert!(!engine.output_cache().contains("bad"));
        assert!(engine.output_cache().contains("vid"));
    }

    #[tokio::test]
    async fn test_output_root_creation_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let mut engine = SyncEngine::new(blocker.join("out"), Vec::<String>::new(), resolver("http://127.0.0.1:9"));
        let err = engine.sync(&tree()).await.unwrap_err();
        assert!(matches!(err, Error::DirectoryCreate { .. }));
    }

    #[tokio::test]
    async fn test_colliding_filenames_get_id_suffix() {
        let temp = TempDir::new().unwrap();
        let base = BookmarkNode::folder(
            "t",
            "toolbar",
            vec![
                BookmarkNode::bookmark("v1", "Clip", "https://youtu.be/one", 0),
                BookmarkNode::bookmark("v2", "Clip", "https://youtu.be/two", 0),
            ],
        );

        let mut engine = SyncEngine::new(temp.path(), Vec::<String>::new(), resolver("http://127.0.0.1:9"));
        let report = engine.sync(&base).await.unwrap();

        assert_eq!(report.created, 2);
        assert!(temp.path().join("youtu.be - Clip.md").exists());
        let second = fs::read_to_string(temp.path().join("youtu.be - Clip [v2].md")).unwrap();
        assert!(second.contains("embed/two"));
    }
}
