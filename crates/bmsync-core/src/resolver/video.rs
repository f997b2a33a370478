//! Video links become an embedded player. No network, no cache.

use super::ContentStrategy;
use crate::{Error, Result};
use async_trait::async_trait;
use url::Url;

const CANONICAL_HOSTS: &[&str] = &["youtube.com", "www.youtube.com"];
const SHORT_HOST: &str = "youtu.be";

/// Embed fragment for YouTube URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoStrategy;

impl VideoStrategy {
    /// Video id: the path on the short host, `v` on `/watch` otherwise.
    pub fn video_id(url: &Url) -> Option<String> {
        let host = url.host_str()?;
        let id = if host == SHORT_HOST {
            url.path().trim_start_matches('/').to_string()
        } else if CANONICAL_HOSTS.contains(&host) && url.path() == "/watch" {
            url.query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        };
        (!id.is_empty()).then_some(id)
    }

    /// Player markup for `id`.
    pub fn embed(id: &str) -> String {
        format!(
            r#"<iframe width="560" height="315" src="https://www.youtube.com/embed/{id}" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#
        )
    }
}

#[async_trait]
impl ContentStrategy for VideoStrategy {
    fn name(&self) -> &'static str {
        "video"
    }

    fn matches(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|h| h == SHORT_HOST || CANONICAL_HOSTS.contains(&h))
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let id = Self::video_id(url).ok_or_else(|| Error::ContentResolution {
            url: url.to_string(),
            reason: "could not extract video id".to_string(),
        })?;
        Ok(Self::embed(&id))
    }
}
