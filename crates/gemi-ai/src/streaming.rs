//! Server-Sent Events (SSE) streaming parser.
//!
//! Gemini's `streamGenerateContent?alt=sse` endpoint delivers one JSON
//! chunk per event. The parser is a lazy stream, so the caller decides
//! when to stop reading (e.g. right after a function call).

use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, when the server names one.
    pub event: Option<String>,
    /// The event data (JSON string).
    pub data: String,
}

/// Parse an SSE stream from a reqwest response.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> impl Stream<Item = Result<SseEvent, AiError>> + Send + 'static {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    sse_event_stream(tokio::io::BufReader::new(StreamReader::new(byte_stream)))
}

/// Parse SSE events from any buffered reader.
pub fn sse_event_stream<R>(reader: R) -> impl Stream<Item = Result<SseEvent, AiError>> + Send + 'static
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async_stream::try_stream! {
        let mut lines = reader.lines();
        let mut current_event: Option<String> = None;
        let mut current_data = String::new();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?
        {
            if line.is_empty() {
                // Empty line = end of event
                if !current_data.is_empty() {
                    yield SseEvent {
                        event: current_event.take(),
                        data: std::mem::take(&mut current_data),
                    };
                }
                current_event = None;
                continue;
            }

            if let Some(event_type) = line.strip_prefix("event:") {
                current_event = Some(event_type.trim_start().to_string());
            } else if let Some(data) = line.strip_prefix("data:") {
                if !current_data.is_empty() {
                    current_data.push('\n');
                }
                current_data.push_str(data.strip_prefix(' ').unwrap_or(data));
            }
            // Ignore other fields (id:, retry:, comments)
        }

        if !current_data.is_empty() {
            yield SseEvent {
                event: current_event,
                data: current_data,
            };
        }
    }
}
