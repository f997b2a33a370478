//! Content-addressed cache for fetched and cleaned content.
//!
//! Keys are URL-safe base64 SHA-256 digests of the semantically relevant
//! input: the URL for fetched content, and model + prompt + content for
//! cleanup output. Each entry is one file named after its key; values are
//! never expired or overwritten implicitly. The only purge is [`ContentCache::clear`].
//!
//! ## Storage Layout
//!
//! ```text
//! <cache_dir>/
//!   3q2-7w....          # one file per key, raw UTF-8 payload
//!   Zm9v-b2....
//! ```

use crate::{Error, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cache key for content fetched from `url`.
pub fn url_key(url: &str) -> String {
    hash_key(url.as_bytes())
}

/// Cache key for cleanup output of `content` under `model` and `prompt`.
pub fn cleanup_key(model: &str, prompt: &str, content: &str) -> String {
    hash_key(format!("{model}\n---\n{prompt}\n---\n{content}").as_bytes())
}

fn hash_key(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    URL_SAFE.encode(digest)
}

/// File-backed key/value store.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: Option<PathBuf>,
}

impl ContentCache {
    /// Open (and create) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create cache directory {}: {e}",
                dir.display()
            ))
        })?;
        debug!(dir = %dir.display(), "opened content cache");
        Ok(Self { dir: Some(dir) })
    }

    /// Open `dir`, degrading to a disabled cache when it cannot be created.
    pub fn open_or_disabled(dir: impl Into<PathBuf>) -> Self {
        match Self::open(dir) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("content cache disabled: {e}");
                Self::disabled()
            },
        }
    }

    /// A cache that always misses and never persists.
    pub const fn disabled() -> Self {
        Self { dir: None }
    }

    /// Whether entries are persisted.
    pub const fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Backing directory, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Look up a key. Misses and unreadable entries both return `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let path = self.dir.as_ref()?.join(key);
        match fs::read_to_string(&path) {
            Ok(value) => {
                debug!(key, "content cache hit");
                Some(value)
            },
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(key, "unreadable cache entry: {e}");
                None
            },
        }
    }

    /// Store a value under `key`.
    ///
    /// Uses atomic write (temp file + rename) so an interrupted run never
    /// leaves a truncated entry behind.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = dir.join(key);
        let tmp_path = dir.join(format!("{key}.tmp"));

        fs::write(&tmp_path, value)
            .map_err(|e| Error::Storage(format!("Failed to write cache entry {key}: {e}")))?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to replace cache entry {key}: {e}")))?;
        }

        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Storage(format!("Failed to commit cache entry {key}: {e}")))?;
        debug!(key, bytes = value.len(), "stored cache entry");
        Ok(())
    }

    /// Store a value, logging failures instead of returning them.
    pub fn set_or_warn(&self, key: &str, value: &str) {
        if let Err(e) = self.set(key, value) {
            warn!("{e}");
        }
    }

    /// Remove every entry. Returns how many entries were deleted.
    pub fn clear(&self) -> Result<usize> {
        let Some(dir) = &self.dir else {
            return Ok(0);
        };
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(dir)
            .map_err(|e| Error::Storage(format!("Failed to list cache directory: {e}")))?
        {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| {
                    Error::Storage(format!("Failed to remove {}: {e}", path.display()))
                })?;
                removed += 1;
            }
        }
        debug!(removed, "cleared content cache");
        Ok(removed)
    }
}
