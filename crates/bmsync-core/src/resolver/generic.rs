//! Fallback strategy: any page through the extraction service.

use super::{ContentStrategy, rewrite_links};
use crate::cleanup::ContentCleaner;
use crate::content_cache::{ContentCache, url_key};
use crate::http::HttpClient;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use url::form_urlencoded::byte_serialize;

/// Page-to-markdown extraction with optional cleanup.
///
/// The raw extraction response is cached per URL; link rewriting and
/// cleanup run on every resolve (cleanup has its own cache).
#[derive(Clone)]
pub struct GenericStrategy {
    http: HttpClient,
    cache: Arc<ContentCache>,
    extract_base: String,
    cleaner: Option<Arc<dyn ContentCleaner>>,
}

impl std::fmt::Debug for GenericStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericStrategy")
            .field("extract_base", &self.extract_base)
            .field("cleanup", &self.cleaner.is_some())
            .finish_non_exhaustive()
    }
}

impl GenericStrategy {
    /// New strategy using the extraction service at `extract_base`.
    pub fn new(
        http: HttpClient,
        cache: Arc<ContentCache>,
        extract_base: impl Into<String>,
        cleaner: Option<Arc<dyn ContentCleaner>>,
    ) -> Self {
        Self {
            http,
            cache,
            extract_base: extract_base.into().trim_end_matches('/').to_string(),
            cleaner,
        }
    }

    /// Extraction request URL for `page`.
    pub fn extract_url(&self, page: &str) -> String {
        let escaped: String = byte_serialize(page.as_bytes()).collect();
        format!(
            "{}/?url={escaped}&enableDetailedResponse=true",
            self.extract_base
        )
    }

    /// Base that relative links in `page` resolve against.
    pub fn link_base(page: &Url) -> String {
        let host = page.host_str().unwrap_or_default();
        let port = page.port().map(|p| format!(":{p}")).unwrap_or_default();
        format!("{}://{host}{port}{}", page.scheme(), page.path())
    }

    async fn fetch_raw(&self, page: &Url) -> Result<String> {
        let key = url_key(page.as_str());
        if let Some(cached) = self.cache.get(&key) {
            debug!("using cached extraction");
            return Ok(cached);
        }

        info!("fetching page through extraction service");
        let response = self.http.get(&self.extract_url(page.as_str())).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::ContentResolution {
                url: page.to_string(),
                reason: format!("extraction service returned {status}"),
            });
        }

        self.cache.set_or_warn(&key, &body);
        Ok(body)
    }
}

#[async_trait]
impl ContentStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn matches(&self, _url: &Url) -> bool {
        true
    }

    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<String> {
        let raw = self.fetch_raw(url).await?;
        let mut content = rewrite_links(&raw, &Self::link_base(url));

        if let Some(cleaner) = &self.cleaner {
            match cleaner.clean(&content).await {
                Ok(cleaned) => content = cleaned,
                Err(e) => warn!("cleanup failed, keeping extracted content: {e}"),
            }
        }

        Ok(content.trim().to_string())
    }
}
