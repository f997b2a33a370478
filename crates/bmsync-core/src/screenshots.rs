//! Client for the screenshot gallery service.
//!
//! The service captures pages asynchronously: URLs are submitted in one
//! batch, and finished captures are served from a predictable path. Only
//! URLs without a successful capture are submitted, so repeated runs are
//! cheap.

use crate::http::HttpClient;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Characters replaced by `-` when deriving a capture filename.
const PATH_CHARS: &[char] = &['/', ':', '?', '=', '&', '_', '#'];

/// One capture in the gallery listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotResult {
    /// Capture id
    #[serde(default)]
    pub id: i64,
    /// Probe timestamp as reported by the service
    #[serde(default)]
    pub probed_at: String,
    /// Captured URL
    pub url: String,
    /// HTTP status seen while capturing
    #[serde(default)]
    pub response_code: i64,
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Stored image name
    #[serde(default)]
    pub file_name: String,
    /// Whether the capture failed
    #[serde(default)]
    pub failed: bool,
    /// Detected technologies
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Gallery {
    #[serde(default)]
    results: Vec<ScreenshotResult>,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    urls: &'a [String],
}

/// Screenshot service handle.
#[derive(Debug, Clone)]
pub struct ScreenshotService {
    http: HttpClient,
    base_url: String,
}

impl ScreenshotService {
    /// Service at `base_url`.
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URLs that already have a successful capture.
    #[tracing::instrument(skip(self))]
    pub async fn existing(&self) -> Result<HashSet<String>> {
        let url = format!("{}/api/results/gallery?limit=10000", self.base_url);
        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| Error::Screenshot(format!("gallery request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Screenshot(format!("gallery returned {status}")));
        }

        let gallery: Gallery = response
            .json()
            .await
            .map_err(|e| Error::Screenshot(format!("invalid gallery response: {e}")))?;

        let existing: HashSet<String> = gallery
            .results
            .into_iter()
            .filter(|r| !r.failed)
            .map(|r| r.url)
            .collect();
        info!(count = existing.len(), "fetched existing screenshots");
        Ok(existing)
    }

    /// Request captures for `urls`.
    #[tracing::instrument(skip_all, fields(count = urls.len()))]
    pub async fn submit(&self, urls: &[String]) -> Result<()> {
        let url = format!("{}/api/submit", self.base_url);
        let response = self
            .http
            .post_json(&url, &SubmitRequest { urls })
            .await
            .map_err(|e| Error::Screenshot(format!("submit request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Screenshot(format!("submission returned {status}")));
        }
        info!("submitted screenshot request");
        Ok(())
    }

    /// Where the capture of `source` is (or will be) served.
    pub fn url_for(&self, source: &str) -> String {
        format!(
            "{}/screenshots/{}.jpeg",
            self.base_url,
            source.replace(PATH_CHARS, "-")
        )
    }
}
