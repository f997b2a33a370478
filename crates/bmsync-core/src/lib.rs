//! # bmsync-core
//!
//! Core functionality for bmsync - incremental synchronization of a browser
//! bookmark folder into a tree of markdown notes.
//!
//! Every bookmark below a base folder becomes one note with YAML frontmatter
//! and a markdown body produced from the bookmarked page. Folders become
//! directories. A run only creates notes for bookmarks that do not have one
//! yet; the output tree itself is the record of what has been synced.
//!
//! ## Architecture
//!
//! - **Bookmarks**: the tree model, path addressing and the sources it is
//!   loaded from
//! - **Resolver**: ordered strategies turning a URL into markdown (video
//!   embed, repository readme, generic extraction with optional cleanup)
//! - **Output**: note format, filenames, the index of existing notes and the
//!   per-year index notes
//! - **Sync**: the engine tying the above together
//! - **Content cache**: durable key/value store for network results
//!
//! ## Quick Start
//!
//! ```rust
//! use bmsync_core::bookmarks::BookmarkRoot;
//!
//! let json = r#"{"bookmarks": {"toolbar": {
//!     "id": "t", "title": "toolbar", "type": "folder",
//!     "children": [{"id": "b1", "title": "Rust", "type": "bookmark",
//!                   "uri": "https://rust-lang.org", "added_unix": 1700000000}]
//! }}}"#;
//!
//! let root = BookmarkRoot::from_json(json.as_bytes())?;
//! let toolbar = root.require("toolbar")?;
//! assert_eq!(toolbar.walk().count(), 2);
//! # Ok::<(), bmsync_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Structural failures are
//! fatal ([`Error::is_fatal`]); per-bookmark failures are reported in the
//! [`SyncReport`] and retried on the next run.

/// Bookmark tree model and sources
pub mod bookmarks;
/// LLM cleanup of extracted content
pub mod cleanup;
/// Configuration loading and defaults
pub mod config;
/// Durable content cache
pub mod content_cache;
/// Error types and result aliases
pub mod error;
/// Retrying HTTP client
pub mod http;
/// Generated note tree
pub mod output;
/// URL to markdown strategies
pub mod resolver;
/// Screenshot service client
pub mod screenshots;
/// Sync engine
pub mod sync;

// Re-export commonly used types
pub use bookmarks::{BookmarkNode, BookmarkRoot, BookmarkSource, CommandSource, FileSource};
pub use cleanup::{ContentCleaner, LlmCleaner};
pub use config::Config;
pub use content_cache::ContentCache;
pub use error::{Error, Result};
pub use http::{HttpClient, RetryPolicy};
pub use output::{Frontmatter, OutputCache, OutputRecord};
pub use resolver::{ContentResolver, ContentStrategy, cleaner_from_config};
pub use screenshots::ScreenshotService;
pub use sync::{EligibleBookmark, SyncEngine, SyncFailure, SyncReport, eligible_bookmarks, ignore_set};
