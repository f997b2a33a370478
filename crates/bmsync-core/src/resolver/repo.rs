//! Repository links resolve to the repository's readme.

use super::{ContentStrategy, rewrite_links};
use crate::content_cache::{ContentCache, url_key};
use crate::http::HttpClient;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Readme filenames tried in order.
pub const README_CANDIDATES: &[&str] = &[
    "README.md",
    "README.MD",
    "README.org",
    "Readme.md",
    "readme.md",
];

/// Fetches `<owner>/<repo>` readmes from the raw file host.
#[derive(Debug, Clone)]
pub struct RepoStrategy {
    http: HttpClient,
    cache: Arc<ContentCache>,
    raw_base: String,
    blob_base: String,
}

impl RepoStrategy {
    /// New strategy against the given raw and blob hosts.
    pub fn new(
        http: HttpClient,
        cache: Arc<ContentCache>,
        raw_base: impl Into<String>,
        blob_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            cache,
            raw_base: raw_base.into().trim_end_matches('/').to_string(),
            blob_base: blob_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// `owner/repo` from the first two path segments.
    pub fn repo_slug(url: &Url) -> Option<String> {
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let repo = segments.next()?;
        Some(format!("{owner}/{repo}"))
    }

    async fn fetch_readme(&self, slug: &str) -> Result<String> {
        let mut last_error: Option<String> = None;

        for candidate in README_CANDIDATES {
            let raw_url = format!("{}/{slug}/HEAD/{candidate}", self.raw_base);
            let response = match self.http.get(&raw_url).await {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(e.to_string());
                    continue;
                },
            };

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!(candidate, "readme candidate not found");
                continue;
            }
            if !status.is_success() {
                last_error = Some(format!("{raw_url} returned {status}"));
                continue;
            }

            match response.text().await {
                Ok(body) => {
                    info!(candidate, slug, "fetched repository readme");
                    return Ok(body);
                },
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        Err(Error::ContentResolution {
            url: slug.to_string(),
            reason: format!(
                "no readme found ({})",
                last_error.as_deref().unwrap_or("all candidates returned 404")
            ),
        })
    }
}

#[async_trait]
impl ContentStrategy for RepoStrategy {
    fn name(&self) -> &'static str {
        "repo"
    }

    fn matches(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| HOSTS.contains(&h))
    }

    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<String> {
        let key = url_key(url.as_str());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let slug = Self::repo_slug(url).ok_or_else(|| Error::ContentResolution {
            url: url.to_string(),
            reason: "expected /<owner>/<repo>".to_string(),
        })?;

        let readme = self.fetch_readme(&slug).await?;
        let base = format!("{}/{slug}/blob/HEAD", self.blob_base);
        let content = rewrite_links(&readme, &base);

        self.cache.set_or_warn(&key, &content);
        Ok(content)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn strategy(server: &MockServer, cache: ContentCache) -> RepoStrategy {
        let http = HttpClient::new(Duration::from_secs(5), RetryPolicy::no_retry()).unwrap();
        RepoStrategy::new(http, Arc::new(cache), server.uri(), "https://github.com")
    }

    #[test]
    fn test_repo_slug() {
        let slug = |s: &str| RepoStrategy::repo_slug(&Url::parse(s).unwrap());
        assert_eq!(slug("https://github.com/o/r").as_deref(), Some("o/r"));
        assert_eq!(slug("https://github.com/o/r/tree/main/x").as_deref(), Some("o/r"));
        assert_eq!(slug("https://github.com/o"), None);
        assert_eq!(slug("https://github.com/"), None);
    }

    #[tokio::test]
    async fn test_falls_back_to_later_candidate_and_rewrites() {
        // Given: only the fourth candidate exists
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/o/r/HEAD/Readme.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("![x](img/x.png)"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        // When: resolving the repository
        let s = strategy(&server, ContentCache::disabled());
        let body = s
            .fetch(&Url::parse("https://github.com/o/r").unwrap())
            .await
            .unwrap();

        // Then: relative links point at the blob host
        assert_eq!(body, "![x](https://github.com/o/r/blob/HEAD/img/x.png)");
    }

    #[tokio::test]
    async fn test_all_candidates_missing_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(5)
            .mount(&server)
            .await;

        let s = strategy(&server, ContentCache::disabled());
        let err = s
            .fetch(&Url::parse("https://github.com/o/r").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ContentResolution { .. }));
    }

    #[tokio::test]
    async fn test_non_404_failure_is_remembered() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let s = strategy(&server, ContentCache::disabled());
        match s.fetch(&Url::parse("https://github.com/o/r").unwrap()).await {
            Err(Error::ContentResolution { reason, .. }) => assert!(reason.contains("403")),
            other => panic!("expected ContentResolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_cache() {
        let temp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/o/r/HEAD/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Readme"))
            .expect(1)
            .mount(&server)
            .await;

        let s = strategy(&server, ContentCache::open(temp.path()).unwrap());
        let url = Url::parse("https://github.com/o/r").unwrap();
        assert_eq!(s.fetch(&url).await.unwrap(), "# Readme");
        assert_eq!(s.fetch(&url).await.unwrap(), "# Readme");
    }

    #[test]
    fn test_matches_hosts() {
        let server_less = RepoStrategy::new(
            HttpClient::new(Duration::from_secs(1), RetryPolicy::no_retry()).unwrap(),
            Arc::new(ContentCache::disabled()),
            "https://raw.example",
            "https://github.com",
        );
        assert!(server_less.matches(&Url::parse("https://www.github.com/o/r").unwrap()));
        assert!(!server_less.matches(&Url::parse("https://gitlab.com/o/r").unwrap()));
    }
}
