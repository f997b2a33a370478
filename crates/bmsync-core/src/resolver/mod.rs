//! URL → markdown resolution.
//!
//! A [`ContentResolver`] holds an ordered list of [`ContentStrategy`]
//! implementations and hands each URL to the first one that claims it. The
//! generic extraction strategy is the fallback and claims everything.
//!
//! ```text
//! youtube.com / youtu.be   → VideoStrategy    (embed, no I/O)
//! github.com               → RepoStrategy     (readme, cached)
//! anything else            → GenericStrategy  (extraction + cleanup, cached)
//! ```

pub mod generic;
pub mod links;
pub mod repo;
pub mod video;

pub use generic::GenericStrategy;
pub use links::rewrite_links;
pub use repo::{README_CANDIDATES, RepoStrategy};
pub use video::VideoStrategy;

use crate::cleanup::{ContentCleaner, LlmCleaner};
use crate::config::Config;
use crate::content_cache::ContentCache;
use crate::http::HttpClient;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// One way of turning a URL into markdown.
#[async_trait]
pub trait ContentStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy handles `url`.
    fn matches(&self, url: &Url) -> bool;

    /// Produce markdown for `url`.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Ordered strategy dispatcher.
pub struct ContentResolver {
    strategies: Vec<Box<dyn ContentStrategy>>,
    fallback: Box<dyn ContentStrategy>,
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("ContentResolver")
            .field("strategies", &names)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl ContentResolver {
    /// Resolver with only a fallback.
    pub fn new(fallback: impl ContentStrategy + 'static) -> Self {
        Self {
            strategies: Vec::new(),
            fallback: Box::new(fallback),
        }
    }

    /// Append a strategy; earlier strategies win.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl ContentStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Standard resolver: video, repository, then generic extraction.
    pub fn from_config(
        config: &Config,
        http: &HttpClient,
        cache: &Arc<ContentCache>,
        cleaner: Option<Arc<dyn ContentCleaner>>,
    ) -> Self {
        Self::new(GenericStrategy::new(
            http.clone(),
            Arc::clone(cache),
            config.extract.base_url.clone(),
            cleaner,
        ))
        .with_strategy(VideoStrategy)
        .with_strategy(RepoStrategy::new(
            http.clone(),
            Arc::clone(cache),
            config.repo.raw_base.clone(),
            config.repo.blob_base.clone(),
        ))
    }

    /// Strategy that would handle `url`.
    pub fn strategy_for(&self, url: &Url) -> &dyn ContentStrategy {
        self.strategies
            .iter()
            .find(|s| s.matches(url))
            .map_or(self.fallback.as_ref(), AsRef::as_ref)
    }

    /// Resolve `url` to markdown.
    ///
    /// Every failure, including an unparsable URL, comes back as
    /// [`Error::ContentResolution`].
    pub async fn resolve(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| Error::ContentResolution {
            url: url.to_string(),
            reason: format!("invalid URL: {e}"),
        })?;

        let strategy = self.strategy_for(&parsed);
        debug!(url, strategy = strategy.name(), "resolving");
        strategy.fetch(&parsed).await.map_err(|e| match e {
            Error::ContentResolution { reason, .. } => Error::ContentResolution {
                url: url.to_string(),
                reason,
            },
            other => Error::ContentResolution {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })
    }
}

/// Cleaner described by the `[cleanup]` section, if it should run.
pub fn cleaner_from_config(
    config: &Config,
    http: &HttpClient,
    cache: &Arc<ContentCache>,
) -> Option<Arc<dyn ContentCleaner>> {
    let key = config.cleanup.active_key()?;
    Some(Arc::new(LlmCleaner::new(
        http.clone(),
        Arc::clone(cache),
        &config.cleanup.base_url,
        key,
        config.cleanup.model.clone(),
    )))
}
