//! Scripted collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::tools::{
    ImageGenerator, ImageRequest, SearchProvider, SearchTopic, ToolInvoker,
};
use crate::{
    AiError, ChatHistory, Content, GeneratedImage, ModelClient, ModelEvent, ModelEventStream,
    ProviderError, SearchHit, SearchResults, ToolCall,
};

/// Model that answers each request with the next scripted reply and
/// records the history it was shown.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    replies: Mutex<VecDeque<Vec<Result<ModelEvent, AiError>>>>,
    requests: Mutex<Vec<Vec<Content>>>,
    chats_started: AtomicUsize,
    start_delay: Option<Duration>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub(crate) fn reply(self, events: Vec<Result<ModelEvent, AiError>>) -> Self {
        self.push_reply(events);
        self
    }

    pub(crate) fn push_reply(&self, events: Vec<Result<ModelEvent, AiError>>) {
        self.replies.lock().unwrap().push_back(events);
    }

    pub(crate) fn requests(&self) -> Vec<Vec<Content>> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn chats_started(&self) -> usize {
        self.chats_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn start_chat(&self, seed: &[Content]) -> Result<ChatHistory, AiError> {
        self.chats_started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ChatHistory::new(seed.to_vec()))
    }

    async fn stream(&self, history: &[Content]) -> Result<ModelEventStream, AiError> {
        self.requests.lock().unwrap().push(history.to_vec());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(futures_util::stream::iter(reply)))
    }
}

pub(crate) fn text(delta: &str) -> Result<ModelEvent, AiError> {
    Ok(ModelEvent::TextDelta(delta.to_string()))
}

pub(crate) fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> Result<ModelEvent, AiError> {
    Ok(ModelEvent::ToolCall(ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }))
}

pub(crate) fn seed() -> Vec<Content> {
    vec![Content::user_text("rules"), Content::model_text("Hi! Let's get started.")]
}

pub(crate) struct StaticSearch;

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(
        &self,
        query: &str,
        _max_results: u32,
        _topic: SearchTopic,
    ) -> Result<SearchResults, ProviderError> {
        Ok(SearchResults {
            query: query.to_string(),
            answer: Some("Sunny, 21°C".into()),
            hits: vec![SearchHit {
                title: "Paris forecast".into(),
                url: "https://weather.example/paris".into(),
                content: "Sunny".into(),
                score: 0.9,
            }],
        })
    }
}

pub(crate) struct BrokenImages;

#[async_trait]
impl ImageGenerator for BrokenImages {
    async fn generate(&self, _request: &ImageRequest) -> Result<Vec<GeneratedImage>, ProviderError> {
        Err(ProviderError::NoImagesGenerated)
    }
}

pub(crate) fn invoker() -> Arc<ToolInvoker> {
    Arc::new(
        ToolInvoker::new()
            .with_search(Arc::new(StaticSearch))
            .with_image(Arc::new(BrokenImages)),
    )
}

pub(crate) fn search_args() -> serde_json::Value {
    json!({ "query": "Paris weather", "max_results": 1 })
}
