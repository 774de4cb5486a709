//! Tavily web search client.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use gemi_config::schema::SearchConfig;

use crate::ProviderError;

use super::{SearchProvider, SearchResults, SearchTopic};

pub struct TavilyClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build a client from the `[search]` section, or `None` when disabled.
    pub fn from_config(config: &SearchConfig) -> Result<Option<Self>, ProviderError> {
        match config.api_key.as_deref() {
            Some(key) if config.enabled() => Ok(Some(Self::new(key, config.base_url.clone())?)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        topic: SearchTopic,
    ) -> Result<SearchResults, ProviderError> {
        debug!(query, max_results, topic = topic.as_str(), "Tavily search");

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query": query,
                "topic": topic.as_str(),
                "max_results": max_results,
                "include_answer": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("HTTP {status}: {text}")));
        }

        response
            .json::<SearchResults>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}
