//! Client for a self-hosted text-to-speech engine.
//!
//! The engine can take a while to come up, so synthesis waits behind a
//! readiness gate that a background probe opens once the engine answers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gemi_config::schema::VoiceConfig;

use crate::ProviderError;

use super::{Quality, SpeechSynthesizer, VoiceClip};

pub struct VoiceEngine {
    base_url: String,
    engine: String,
    voice: String,
    probe_interval: Duration,
    ready: watch::Sender<bool>,
    http: reqwest::Client,
}

impl VoiceEngine {
    pub fn new(
        base_url: impl Into<String>,
        engine: impl Into<String>,
        voice: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let (ready, _) = watch::channel(false);
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            engine: engine.into(),
            voice: voice.into(),
            probe_interval: Duration::from_secs(10),
            ready,
            http,
        })
    }

    /// Build the engine from the `[voice]` section, or `None` when disabled.
    pub fn from_config(config: &VoiceConfig) -> Result<Option<Self>, ProviderError> {
        let (Some(url), Some((engine, voice))) = (
            config.api_url.as_deref().filter(|_| config.enabled()),
            config.engine_and_voice(),
        ) else {
            return Ok(None);
        };
        let engine = Self::new(url, engine, voice)?
            .with_probe_interval(Duration::from_secs(u64::from(config.probe_interval_secs)));
        Ok(Some(engine))
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    async fn probe_once(&self) -> Result<bool, ProviderError> {
        let response = self
            .http
            .get(format!("{}/api/speak/voices", self.base_url))
            .send()
            .await?;
        Ok(response.status() == reqwest::StatusCode::OK)
    }

    /// Poll the engine until it answers, then open the readiness gate.
    pub fn spawn_readiness_probe(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match engine.probe_once().await {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "Voice engine is not up yet"),
                }
                info!(
                    retry_in_secs = engine.probe_interval.as_secs(),
                    "Voice engine is not up yet, sleeping"
                );
                tokio::time::sleep(engine.probe_interval).await;
            }
            engine.ready.send_replace(true);
            info!(url = %engine.base_url, "Voice engine is up");
        })
    }

    async fn wait_ready(&self) -> Result<(), ProviderError> {
        let mut rx = self.ready.subscribe();
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| ProviderError::EngineNotReady)
    }

    /// Where to fetch the audio behind a one-time URL the engine returned.
    fn audio_url(&self, url: &str) -> String {
        let relative = url.strip_prefix(&self.base_url).unwrap_or(url);
        let relative = relative.replace("onetime/", "");
        if relative.starts_with("http://") || relative.starts_with("https://") {
            relative
        } else if relative.starts_with('/') {
            format!("{}{relative}", self.base_url)
        } else {
            format!("{}/{relative}", self.base_url)
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for VoiceEngine {
    async fn synthesize(&self, text: &str, quality: Quality) -> Result<VoiceClip, ProviderError> {
        self.wait_ready().await?;
        debug!(engine = %self.engine, chars = text.len(), quality = ?quality, "Voice synthesis request");

        let response = self
            .http
            .post(format!("{}/api/speak/{}", self.base_url, self.engine))
            .json(&json!({ "text": text, "voice_id": self.voice }))
            .send()
            .await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ProviderError::Api(format!(
                "voice engine returned HTTP {status}"
            )));
        }
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let url = json["url"]
            .as_str()
            .ok_or_else(|| ProviderError::Parse("no 'url' field in response".to_string()))?
            .to_string();

        let response = self.http.get(self.audio_url(&url)).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ProviderError::Api(format!(
                "voice engine returned HTTP {status} for audio"
            )));
        }
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/wav")
            .to_string();
        let data = response.bytes().await?.to_vec();

        Ok(VoiceClip {
            url,
            mime_type,
            data,
        })
    }
}
