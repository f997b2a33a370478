//! Shared HTTP client with retry and backoff.
//!
//! Every outbound collaborator (extraction, readme host, screenshot
//! gallery, cleanup service) receives the same [`HttpClient`]. Requests are
//! retried on transport errors, 429 and 5xx up to the policy's attempt
//! budget, sleeping with exponential backoff between attempts. A transient
//! status on the last attempt is handed back to the caller unchanged so it
//! can report the status.

use crate::{Error, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry budget and backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub min_backoff: Duration,
    /// Upper bound for any delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping.
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based), doubling each time.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.min_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Whether a response status deserves another attempt.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// `reqwest` client decorated with a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Build a client with the given request timeout and retry policy.
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bmsync/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client, policy })
    }

    /// Underlying client, for building requests passed to [`Self::execute`].
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Active retry policy.
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Send a request, retrying transient failures.
    ///
    /// Requests with streaming bodies cannot be cloned and are sent once.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let mut attempt = 0;
        loop {
            let Some(current) = request.try_clone() else {
                return Ok(request.send().await?);
            };
            attempt += 1;
            let last = attempt >= self.policy.max_attempts;

            match current.send().await {
                Ok(response) if !last && is_transient_status(response.status()) => {
                    warn!(
                        url = %response.url(),
                        status = response.status().as_u16(),
                        attempt,
                        "transient HTTP status, retrying"
                    );
                },
                Ok(response) => return Ok(response),
                Err(err) if !last && is_transient_error(&err) => {
                    warn!(error = %err, attempt, "request failed, retrying");
                },
                Err(err) => return Err(Error::Network(err)),
            }

            let delay = self.policy.backoff(attempt - 1);
            debug!(?delay, "backing off");
            sleep(delay).await;
        }
    }

    /// `GET url` with retries.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.execute(self.client.get(url)).await
    }

    /// `POST url` with a JSON body, with retries.
    pub async fn post_json<T>(&self, url: &str, body: &T) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.execute(self.client.post(url).json(body)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            min_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        };
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(4), Duration::from_secs(16));
        assert_eq!(policy.backoff(5), Duration::from_secs(30));
        assert_eq!(policy.backoff(63), Duration::from_secs(30));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_retries_until_success() -> anyhow::Result<()> {
        // Given: a server failing twice with 503, then succeeding
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        // When: fetching with a three-attempt budget
        let client = HttpClient::new(Duration::from_secs(5), fast_policy(3))?;
        let response = client.get(&format!("{}/page", server.uri())).await?;

        // Then: the third attempt's body is returned
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await?, "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_status() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), fast_policy(2))?;
        let response = client.get(&server.uri()).await?;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        Ok(())
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), fast_policy(4))?;
        let response = client.get(&server.uri()).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_post_json_sends_body() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .and(body_json(serde_json::json!({"urls": ["https://a.dev"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), RetryPolicy::no_retry())?;
        let body = serde_json::json!({"urls": ["https://a.dev"]});
        let response = client
            .post_json(&format!("{}/api/submit", server.uri()), &body)
            .await?;
        assert!(response.status().is_success());
        Ok(())
    }

    #[tokio::test]
    async fn test_transport_error_surfaces_after_budget() -> anyhow::Result<()> {
        // Nothing listens on port 9 (discard) in test environments
        let client = HttpClient::new(Duration::from_millis(200), fast_policy(2))?;
        let err = client.get("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        Ok(())
    }
}
