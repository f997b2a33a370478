//! Bookmark sources: the external sync client and plain JSON files.

use super::tree::BookmarkNode;
use crate::config::SourceConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::process::Command;

/// The four named top-level folders of a bookmark document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLevelFolders {
    /// Bookmarks menu
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<BookmarkNode>,
    /// Mobile bookmarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<BookmarkNode>,
    /// Bookmarks toolbar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolbar: Option<BookmarkNode>,
    /// Other (unfiled) bookmarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfiled: Option<BookmarkNode>,
}

/// Root of a bookmark document as produced by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRoot {
    /// Named top-level folders
    pub bookmarks: TopLevelFolders,
    /// Ids referenced but absent from the store
    #[serde(default)]
    pub missing: Vec<String>,
    /// Ids present but not reachable from any root
    #[serde(default)]
    pub unreferenced: Vec<String>,
}

impl BookmarkRoot {
    /// Decode a bookmark document.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::SourceUnavailable(format!("malformed bookmark JSON: {e}")))
    }

    /// Top-level folder by name.
    pub fn top_level(&self, name: &str) -> Option<&BookmarkNode> {
        match name {
            "menu" => self.bookmarks.menu.as_ref(),
            "mobile" => self.bookmarks.mobile.as_ref(),
            "toolbar" => self.bookmarks.toolbar.as_ref(),
            "unfiled" => self.bookmarks.unfiled.as_ref(),
            _ => None,
        }
    }

    /// Resolve a folder path such as `toolbar/docs`.
    ///
    /// The first segment picks the top-level folder; the rest are matched
    /// against titles below it.
    pub fn find(&self, path: &str) -> Option<&BookmarkNode> {
        let mut segments = path.trim_matches('/').split('/');
        let top = self.top_level(segments.next()?)?;
        top.find_segments(segments)
    }

    /// Like [`Self::find`], failing with [`Error::BaseFolderNotFound`].
    pub fn require(&self, path: &str) -> Result<&BookmarkNode> {
        self.find(path)
            .ok_or_else(|| Error::BaseFolderNotFound(path.to_string()))
    }
}

/// Anything that can produce the bookmark document for a run.
#[async_trait]
pub trait BookmarkSource: Send + Sync {
    /// Fetch and decode the full bookmark document.
    async fn fetch(&self) -> Result<BookmarkRoot>;
}

/// Runs an external command and decodes its stdout.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    /// Build from an explicit program and arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from the `[source]` config section.
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

#[async_trait]
impl BookmarkSource for CommandSource {
    #[tracing::instrument(skip(self), fields(program = %self.program))]
    async fn fetch(&self) -> Result<BookmarkRoot> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                Error::SourceUnavailable(format!("failed to run {}: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                exit_code = ?output.status.code(),
                stderr = %stderr.trim(),
                "bookmark source command failed"
            );
            return Err(Error::SourceUnavailable(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        tracing::debug!(bytes = output.stdout.len(), "read bookmark document");
        BookmarkRoot::from_json(&output.stdout)
    }
}

/// Reads a previously exported bookmark document.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Read from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BookmarkSource for FileSource {
    async fn fetch(&self) -> Result<BookmarkRoot> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::SourceUnavailable(format!("failed to read {}: {e}", self.path.display()))
        })?;
        BookmarkRoot::from_json(&bytes)
    }
}
