//! ModelClient trait implementation for GeminiClient.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::streaming::{parse_sse_stream, SseEvent};
use crate::{AiError, ChatHistory, Content, ModelClient, ModelEvent, ModelEventStream};

use super::client::{parse_chunk, GeminiClient};

#[async_trait]
impl ModelClient for GeminiClient {
    async fn start_chat(&self, seed: &[Content]) -> Result<ChatHistory, AiError> {
        debug!(model = %self.config.model, seed = seed.len(), "Gemini chat started");
        Ok(ChatHistory::new(seed.to_vec()))
    }

    async fn stream(&self, history: &[Content]) -> Result<ModelEventStream, AiError> {
        let body = self.build_request_body(history);
        let url = self.stream_url();

        debug!(
            model = %self.config.model,
            contents = history.len(),
            "Gemini API streaming request"
        );

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        Ok(Box::pin(model_events(parse_sse_stream(response))))
    }
}

/// Turn SSE events into model events, ending after the first tool call.
fn model_events(
    sse: impl Stream<Item = Result<SseEvent, AiError>> + Send + 'static,
) -> impl Stream<Item = Result<ModelEvent, AiError>> + Send + 'static {
    async_stream::try_stream! {
        futures_util::pin_mut!(sse);
        while let Some(event) = sse.next().await {
            let event = event?;
            let chunk: serde_json::Value = serde_json::from_str(&event.data)
                .map_err(|e| AiError::ParseError(e.to_string()))?;
            for model_event in parse_chunk(&chunk)? {
                let is_call = matches!(model_event, ModelEvent::ToolCall(_));
                yield model_event;
                if is_call {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentPart, GeminiConfig};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body(chunks: &[serde_json::Value]) -> String {
        chunks
            .iter()
            .map(|chunk| format!("data: {chunk}\r\n\r\n"))
            .collect()
    }

    async fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            GeminiConfig::new("test-key")
                .with_api_base(format!("{}/v1beta/models", server.uri()))
                .with_model("gemini-test"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn streams_text_then_stops_at_function_call() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": "Let me " }] } }] }),
            serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": "look." }] } }] }),
            serde_json::json!({ "candidates": [{ "content": { "parts": [
                { "functionCall": { "name": "search", "args": { "query": "Paris weather", "max_results": 1 } } }
            ] } }] }),
            serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": "never seen" }] } }] }),
        ]);
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:streamGenerateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let events: Vec<ModelEvent> = client
            .stream(&[Content::user_text("weather in Paris?")])
            .await
            .unwrap()
            .map(|event| event.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ModelEvent::TextDelta("Let me ".into()));
        assert_eq!(events[1], ModelEvent::TextDelta("look.".into()));
        assert!(matches!(&events[2], ModelEvent::ToolCall(call) if call.name == "search"));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.stream(&[Content::user_text("hi")]).await;
        assert!(matches!(result, Err(AiError::RateLimited)));
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        match client.stream(&[Content::user_text("hi")]).await {
            Err(AiError::ApiError(msg)) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("boom"));
            }
            Err(other) => panic!("expected API error, got {other:?}"),
            Ok(_) => panic!("expected API error, got a stream"),
        }
    }

    #[tokio::test]
    async fn malformed_chunk_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data: {not json\n\n"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let mut events = client.stream(&[Content::user_text("hi")]).await.unwrap();
        assert!(matches!(events.next().await, Some(Err(AiError::ParseError(_)))));
    }

    #[tokio::test]
    async fn start_chat_copies_seed() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        let seed = vec![Content::user_text("rules"), Content::model_text("ok")];
        let history = client.start_chat(&seed).await.unwrap();
        assert_eq!(history.contents(), seed.as_slice());
        assert!(matches!(history.contents()[0].parts[0], ContentPart::Text(_)));
    }
}
