//! Image generation over a chain of OpenAI-compatible endpoints.
//!
//! Providers are tried in order. The first provider that yields at least
//! one downloadable image wins; failed downloads are dropped one by one.

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::json;
use tracing::{debug, warn};

use gemi_config::schema::{ImageConfig, ImageProviderConfig};

use crate::ProviderError;

use super::{GeneratedImage, ImageGenerator, ImageRequest};

pub struct ImageChain {
    providers: Vec<ImageProviderConfig>,
    http: reqwest::Client,
}

impl ImageChain {
    pub fn new(providers: Vec<ImageProviderConfig>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(180))
            .build()?;
        Ok(Self { providers, http })
    }

    /// Build the chain from the `[image]` section, or `None` when no
    /// provider is configured.
    pub fn from_config(config: &ImageConfig) -> Result<Option<Self>, ProviderError> {
        if !config.enabled() {
            return Ok(None);
        }
        Self::new(config.providers.clone()).map(Some)
    }

    async fn request_urls(
        &self,
        provider: &ImageProviderConfig,
        request: &ImageRequest,
    ) -> Result<Vec<String>, ProviderError> {
        let size = request.quality.pixels();
        let mut builder = self
            .http
            .post(format!(
                "{}/images/generations",
                provider.base_url.trim_end_matches('/')
            ))
            .json(&json!({
                "model": provider.model,
                "prompt": request.prompt,
                "n": request.count,
                "size": format!("{size}x{size}"),
                "response_format": "url",
            }));
        if !provider.api_key.is_empty() {
            builder = builder.bearer_auth(&provider.api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let urls: Vec<String> = json["data"]
            .as_array()
            .ok_or_else(|| ProviderError::Parse("no 'data' array in response".to_string()))?
            .iter()
            .filter_map(|item| item["url"].as_str().map(String::from))
            .collect();

        if urls.is_empty() {
            return Err(ProviderError::NoImagesGenerated);
        }
        Ok(urls)
    }

    async fn download(&self, url: &str, name: String) -> Result<GeneratedImage, ProviderError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(format!("HTTP {status} downloading {url}")));
        }
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let data = response.bytes().await?.to_vec();
        Ok(GeneratedImage {
            name,
            url: url.to_string(),
            mime_type,
            data,
        })
    }

    async fn generate_with(
        &self,
        provider: &ImageProviderConfig,
        request: &ImageRequest,
    ) -> Result<Vec<GeneratedImage>, ProviderError> {
        let urls = self.request_urls(provider, request).await?;
        let multiple = urls.len() > 1;
        let downloads = urls.iter().enumerate().map(|(i, url)| {
            let name = if multiple {
                format!("{}_{}", request.name, i + 1)
            } else {
                request.name.clone()
            };
            self.download(url, name)
        });

        let mut images = Vec::new();
        for result in join_all(downloads).await {
            match result {
                Ok(image) => images.push(image),
                Err(e) => warn!(provider = %provider.name, error = %e, "Image download failed"),
            }
        }

        if images.is_empty() {
            return Err(ProviderError::NoImagesGenerated);
        }
        Ok(images)
    }
}

#[async_trait]
impl ImageGenerator for ImageChain {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, ProviderError> {
        for provider in &self.providers {
            debug!(provider = %provider.name, quality = ?request.quality, "Image generation request");
            match self.generate_with(provider, request).await {
                Ok(images) => return Ok(images),
                Err(e) => {
                    warn!(provider = %provider.name, error = %e, "Image provider failed, trying next")
                }
            }
        }
        Err(ProviderError::NoImagesGenerated)
    }
}
