//! Configuration management for bmsync.
//!
//! Configuration is stored in TOML format. Every section is optional; a
//! missing section (or a missing file) falls back to the defaults below.
//!
//! ## Resolution order
//!
//! 1. **Explicit path**: `--config <FILE>` or `BMSYNC_CONFIG`
//! 2. **Platform config directory**: `<config dir>/config.toml`
//! 3. **Environment overrides**: `BMSYNC_CACHE_DIR`, `GEMINI_API_KEY`
//!
//! Command-line flags are applied last by the CLI.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [sync]
//! folder = "toolbar/reading"
//! output = "/home/user/notes/bookmarks"
//! ignore = ["Archive", "Private"]
//!
//! [screenshots]
//! enabled = false
//!
//! [cleanup]
//! model = "gemini-2.0-flash"
//!
//! [http]
//! max_attempts = 2
//! ```
//!
//! ```rust
//! use bmsync_core::Config;
//!
//! let config = Config::from_toml_str("[sync]\nfolder = \"menu\"\n")?;
//! assert_eq!(config.sync.folder, "menu");
//! assert_eq!(config.sync.output.to_str(), Some("bookmarks"));
//! # Ok::<(), bmsync_core::Error>(())
//! ```

use crate::http::RetryPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the content cache directory.
pub const CACHE_DIR_ENV: &str = "BMSYNC_CACHE_DIR";
/// Environment variable holding the cleanup service API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to sync and where to write it
    pub sync: SyncConfig,
    /// Where the bookmark tree comes from
    pub source: SourceConfig,
    /// Page-to-markdown extraction service
    pub extract: ExtractConfig,
    /// Repository readme endpoints
    pub repo: RepoConfig,
    /// Screenshot service
    pub screenshots: ScreenshotConfig,
    /// Optional LLM cleanup of extracted content
    pub cleanup: CleanupConfig,
    /// Outbound HTTP behavior
    pub http: HttpConfig,
    /// File system locations
    pub paths: PathsConfig,
}

/// Sync selection and output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base folder path, e.g. `toolbar` or `toolbar/reading`.
    ///
    /// The first segment names one of the four top-level folders
    /// (`menu`, `mobile`, `toolbar`, `unfiled`).
    pub folder: String,
    /// Root directory for generated markdown.
    pub output: PathBuf,
    /// Folder titles whose subtrees are skipped (exact match).
    pub ignore: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            folder: "toolbar".to_string(),
            output: PathBuf::from("bookmarks"),
            ignore: Vec::new(),
        }
    }
}

/// External command producing the bookmark JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Program to run
    pub command: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            command: "ffsclient".to_string(),
            args: vec![
                "bookmarks".to_string(),
                "list".to_string(),
                "--format=json".to_string(),
            ],
        }
    }
}

/// Extraction service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Base URL; requests go to `<base_url>/?url=...`
    pub base_url: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: "https://md.dhr.wtf".to_string(),
        }
    }
}

/// Repository host endpoints used by the readme strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Raw file host serving `<owner>/<repo>/HEAD/<file>`
    pub raw_base: String,
    /// Web host used to rewrite relative readme links
    pub blob_base: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            raw_base: "https://raw.githubusercontent.com".to_string(),
            blob_base: "https://github.com".to_string(),
        }
    }
}

/// Screenshot service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Whether screenshots are requested and embedded
    pub enabled: bool,
    /// Gallery service base URL
    pub base_url: String,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://gowitness.cloud.x-truder.net".to_string(),
        }
    }
}

/// Cleanup (chat completion) service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Whether cleanup may run at all
    pub enabled: bool,
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Bearer token. Falls back to `GEMINI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai/".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
        }
    }
}

impl CleanupConfig {
    /// The API key when cleanup should actually run.
    ///
    /// Cleanup is active only when enabled and a non-empty key is present.
    pub fn active_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Outbound HTTP settings shared by every collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// First backoff delay in milliseconds
    pub min_backoff_ms: u64,
    /// Upper bound for backoff delays in milliseconds
    pub max_backoff_ms: u64,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            min_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            timeout_secs: 60,
        }
    }
}

impl HttpConfig {
    /// Retry policy described by this section.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            min_backoff: Duration::from_millis(self.min_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.min_backoff_ms)),
        }
    }

    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// File system paths configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Content cache directory.
    ///
    /// Default locations:
    /// - Linux: `~/.cache/bmsync`
    /// - macOS: `~/Library/Caches/dev.bmsync.bmsync`
    /// - Windows: `%LOCALAPPDATA%\bmsync\bmsync\cache`
    pub cache_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: project_dirs().map_or_else(
                || {
                    directories::BaseDirs::new().map_or_else(
                        || PathBuf::from(".bmsync-cache"),
                        |base| base.cache_dir().join("bmsync"),
                    )
                },
                |dirs| dirs.cache_dir().to_path_buf(),
            ),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "bmsync", "bmsync")
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, the
    /// platform config file is used when present and defaults otherwise.
    /// Environment overrides are applied in both cases.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit config file does not exist
    /// - The config file cannot be read
    /// - The config file contains invalid TOML or unknown value types
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            },
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Platform config file location (`<config dir>/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// `BMSYNC_CACHE_DIR` replaces the cache directory. `GEMINI_API_KEY`
    /// only fills the cleanup key when the file did not set one.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.paths.cache_dir = PathBuf::from(dir);
        }

        let has_key = self
            .cleanup
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
                self.cleanup.api_key = Some(key);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_values() {
        // Given: Default configuration is requested
        let config = Config::default();

        // Then: Should carry the documented defaults
        assert_eq!(config.sync.folder, "toolbar");
        assert_eq!(config.sync.output, PathBuf::from("bookmarks"));
        assert!(config.sync.ignore.is_empty());
        assert_eq!(config.source.command, "ffsclient");
        assert_eq!(config.source.args, ["bookmarks", "list", "--format=json"]);
        assert_eq!(config.extract.base_url, "https://md.dhr.wtf");
        assert_eq!(config.repo.raw_base, "https://raw.githubusercontent.com");
        assert!(config.screenshots.enabled);
        assert_eq!(config.cleanup.model, "gemini-2.0-flash");
        assert_eq!(config.http.max_attempts, 4);
        assert!(!config.paths.cache_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> Result<()> {
        // Given: a config file touching only two sections
        let toml = r#"
            [sync]
            ignore = ["Archive"]

            [http]
            max_attempts = 2
        "#;

        // When: parsing it
        let config = Config::from_toml_str(toml)?;

        // Then: untouched keys keep their defaults
        assert_eq!(config.sync.folder, "toolbar");
        assert_eq!(config.sync.ignore, ["Archive"]);
        assert_eq!(config.http.max_attempts, 2);
        assert_eq!(config.http.timeout_secs, 60);
        assert_eq!(config.extract, ExtractConfig::default());
        Ok(())
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");

        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_load_explicit_file() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[sync]\nfolder = \"menu/reading\"\n")?;

        let config = Config::load(Some(&path))?;
        assert_eq!(config.sync.folder, "menu/reading");
        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("[sync\nfolder = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_toml_str("[http]\nmax_attempts = \"many\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides_cache_dir_and_key() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            (CACHE_DIR_ENV, "/tmp/bm-cache"),
            (API_KEY_ENV, "secret"),
        ]));

        assert_eq!(config.paths.cache_dir, PathBuf::from("/tmp/bm-cache"));
        assert_eq!(config.cleanup.active_key(), Some("secret"));
    }

    #[test]
    fn test_env_key_does_not_replace_configured_key() -> Result<()> {
        let mut config = Config::from_toml_str("[cleanup]\napi_key = \"from-file\"\n")?;
        config.apply_env_overrides(env(&[(API_KEY_ENV, "from-env")]));
        assert_eq!(config.cleanup.active_key(), Some("from-file"));
        Ok(())
    }

    #[test]
    fn test_cleanup_requires_enabled_and_non_empty_key() {
        let mut cleanup = CleanupConfig::default();
        assert_eq!(cleanup.active_key(), None);

        cleanup.api_key = Some("   ".to_string());
        assert_eq!(cleanup.active_key(), None);

        cleanup.api_key = Some("k".to_string());
        assert_eq!(cleanup.active_key(), Some("k"));

        cleanup.enabled = false;
        assert_eq!(cleanup.active_key(), None);
    }

    #[test]
    fn test_retry_policy_is_sane_for_degenerate_values() {
        let http = HttpConfig {
            max_attempts: 0,
            min_backoff_ms: 500,
            max_backoff_ms: 100,
            timeout_secs: 5,
        };
        let policy = http.retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert!(policy.max_backoff >= policy.min_backoff);
        assert_eq!(http.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_roundtrips_through_toml() -> Result<()> {
        let mut config = Config::default();
        config.sync.ignore = vec!["Archive".to_string(), "Später".to_string()];
        config.screenshots.enabled = false;

        let text = toml::to_string_pretty(&config)?;
        let back = Config::from_toml_str(&text)?;
        assert_eq!(config, back);
        Ok(())
    }
}
