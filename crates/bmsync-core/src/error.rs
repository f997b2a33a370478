//! Error types and handling for bmsync-core operations.
//!
//! A single [`Error`] enum covers every failure the sync pipeline can hit.
//! Variants fall into two groups, and callers rely on the split:
//!
//! - **Structural** failures abort the run: the bookmark source is
//!   unreachable ([`Error::SourceUnavailable`]), the configured base folder
//!   does not exist ([`Error::BaseFolderNotFound`]), or an output directory
//!   cannot be created ([`Error::DirectoryCreate`]).
//! - **Per-item** failures are isolated to one bookmark: content resolution
//!   ([`Error::ContentResolution`]), file writes ([`Error::FileWrite`]),
//!   cleanup ([`Error::Cleanup`]) and the screenshot service
//!   ([`Error::Screenshot`]). The engine logs them and moves on.
//!
//! ```rust
//! use bmsync_core::Error;
//!
//! let err = Error::BaseFolderNotFound("toolbar/missing".to_string());
//! assert!(err.is_fatal());
//! assert_eq!(err.category(), "base_folder");
//!
//! let err = Error::ContentResolution {
//!     url: "https://example.com".to_string(),
//!     reason: "status 502".to_string(),
//! };
//! assert!(!err.is_fatal());
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for bmsync-core operations.
///
/// All public functions in bmsync-core return `Result<T, Error>`. The
/// `Display` output is meant for users; `Debug` keeps the source chain.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Generic file system failure that does not map onto one of the more
    /// specific variants below.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Transport-level failure from `reqwest` (connection refused, TLS,
    /// timeout, body read).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Parsing operation failed.
    ///
    /// Frontmatter blocks, bookmark JSON or service responses that do not
    /// have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Content cache storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The bookmark source could not be read.
    ///
    /// Covers spawn failures, non-zero exit status and malformed JSON from
    /// the external source process or file. Always fatal for the run.
    #[error("Bookmark source unavailable: {0}")]
    SourceUnavailable(String),

    /// The configured base folder does not exist in the bookmark tree.
    #[error("Folder '{0}' not found in bookmarks")]
    BaseFolderNotFound(String),

    /// An output directory could not be created.
    ///
    /// Aborts recursion into the affected subtree and propagates to the
    /// caller, ending the run.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreate {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Content for a single bookmark could not be resolved.
    ///
    /// ## Recoverability
    ///
    /// The bookmark stays unsynced and is retried on the next run.
    #[error("Failed to resolve content for '{url}': {reason}")]
    ContentResolution {
        /// URL being resolved.
        url: String,
        /// Reason for the failure.
        reason: String,
    },

    /// A generated markdown file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    FileWrite {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cleanup (LLM) service failed.
    ///
    /// Callers degrade to the uncleaned content.
    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    /// The screenshot service failed.
    #[error("Screenshot service error: {0}")]
    Screenshot(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Whether this error must abort the whole run.
    ///
    /// Only structural failures are fatal; everything else is isolated to
    /// the bookmark or collaborator that produced it.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable(_) | Self::BaseFolderNotFound(_) | Self::DirectoryCreate { .. }
        )
    }

    /// Get the error category as a string identifier for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::SourceUnavailable(_) => "source",
            Self::BaseFolderNotFound(_) => "base_folder",
            Self::DirectoryCreate { .. } => "directory",
            Self::ContentResolution { .. } => "content",
            Self::FileWrite { .. } => "file_write",
            Self::Cleanup(_) => "cleanup",
            Self::Screenshot(_) => "screenshot",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
