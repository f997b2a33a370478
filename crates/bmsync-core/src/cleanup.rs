//! Optional LLM cleanup of extracted page content.
//!
//! The cleaner talks to any OpenAI-compatible `chat/completions` endpoint.
//! Output is cached under a key derived from model, prompt and input, so a
//! changed model or prompt misses the cache while identical input never
//! reaches the service twice.

use crate::content_cache::{ContentCache, cleanup_key};
use crate::http::HttpClient;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// System instruction sent with every cleanup request.
pub const SYSTEM_PROMPT: &str = "You are a markdown content curator. Your task is to clean and restructure markdown content while preserving its essential information and improving its readability. Be thorough and strict in following the cleaning rules.";

/// Rules prepended to the content being cleaned.
pub const CLEAN_PROMPT: &str = "Clean and enhance this markdown content following these strict rules:

CONTENT RULES:
1. Keep only information directly related to the main topic
2. Remove any promotional, advertising, or unrelated content
3. Remove navigation elements, footers, and sidebars
4. Keep code blocks and technical content if relevant
5. Preserve important quotes and key points

FORMATTING RULES:
1. Use proper markdown heading hierarchy (h1 -> h2 -> h3)
2. Ensure consistent spacing between sections
3. Fix or remove malformed markdown syntax
4. Convert HTML to markdown where possible
5. Remove redundant line breaks and spaces

IMAGE AND LINK RULES:
1. Keep only the most relevant and informative images
2. Remove decorative or redundant images
3. Remove broken or relative links
4. Remove duplicate links pointing to the same content
5. Keep essential reference links

CLEANUP RULES:
1. Remove empty sections
2. Remove non-English content unless it's code
3. Fix list formatting and indentation
4. Remove HTML comments and metadata
5. Remove social media embeds unless they're the main content

Content to clean:
";

const TEMPERATURE: f64 = 0.1;

/// Something that can tidy markdown.
#[async_trait]
pub trait ContentCleaner: Send + Sync {
    /// Return a cleaned version of `content`.
    async fn clean(&self, content: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion backed cleaner.
#[derive(Debug, Clone)]
pub struct LlmCleaner {
    http: HttpClient,
    cache: Arc<ContentCache>,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmCleaner {
    /// Cleaner for `model` at the OpenAI-compatible `base_url`.
    pub fn new(
        http: HttpClient,
        cache: Arc<ContentCache>,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            cache,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, content: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format!("{CLEAN_PROMPT}{content}")},
            ],
        });

        let request = self
            .http
            .client()
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload);
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| Error::Cleanup(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Cleanup(format!(
                "chat completion returned {status}: {}",
                body.trim()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Cleanup(format!("invalid chat completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| strip_fences(&text))
            .ok_or_else(|| Error::Cleanup("chat completion returned no choices".to_string()))
    }
}

#[async_trait]
impl ContentCleaner for LlmCleaner {
    #[tracing::instrument(skip_all, fields(model = %self.model, len = content.len()))]
    async fn clean(&self, content: &str) -> Result<String> {
        let key = cleanup_key(&self.model, CLEAN_PROMPT, content);
        if let Some(cached) = self.cache.get(&key) {
            debug!("using cached cleanup output");
            return Ok(cached);
        }

        info!("cleaning markdown");
        let cleaned = self.complete(content).await?;
        self.cache.set_or_warn(&key, &cleaned);
        Ok(cleaned)
    }
}

/// Trim a model reply and drop a surrounding markdown code fence.
pub fn strip_fences(reply: &str) -> String {
    let text = reply.trim();
    let text = text
        .strip_prefix("```markdown\n")
        .or_else(|| text.strip_prefix("```\n"))
        .unwrap_or(text);
    let text = text.strip_suffix("\n```").unwrap_or(text);
    text.to_string()
}
