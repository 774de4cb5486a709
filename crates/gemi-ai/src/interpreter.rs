//! Response stream interpreter: the tool-call loop of one turn.
//!
//! Text deltas are yielded as they arrive. A tool call ends the model's
//! reply; the call is recorded, executed, its result spliced into the
//! history, and the model is asked to continue. The loop ends when a
//! reply finishes without a tool call.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::history::ChatHistory;
use crate::tools::ToolInvoker;
use crate::{ContentPart, ModelClient, ModelEvent, OutputEvent, PromptPart, TurnError};

pub struct Interpreter {
    model: Arc<dyn ModelClient>,
    tools: Arc<ToolInvoker>,
    max_tool_rounds: u32,
}

impl Interpreter {
    pub fn new(model: Arc<dyn ModelClient>, tools: Arc<ToolInvoker>) -> Self {
        Self {
            model,
            tools,
            max_tool_rounds: 5,
        }
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn model(&self) -> &Arc<dyn ModelClient> {
        &self.model
    }

    /// Run one turn against `history`, yielding its output lazily.
    ///
    /// On any error the history is rewound to where it was before the
    /// turn; events already yielded stay valid.
    pub fn process<'a>(
        &'a self,
        history: &'a mut ChatHistory,
        parts: Vec<PromptPart>,
    ) -> impl Stream<Item = Result<OutputEvent, TurnError>> + Send + 'a {
        async_stream::stream! {
            let checkpoint = history.checkpoint();
            history.push_user(parts.into_iter().map(ContentPart::from).collect());
            let mut rounds = 0u32;

            loop {
                let mut events = match self.model.stream(history.contents()).await {
                    Ok(events) => events,
                    Err(e) => {
                        warn!(error = %e, "Model request failed");
                        history.rewind(checkpoint);
                        yield Err(TurnError::Model(e));
                        return;
                    }
                };

                let mut reply_text = String::new();
                let mut pending_call = None;
                let mut failure = None;
                while let Some(event) = events.next().await {
                    match event {
                        Ok(ModelEvent::TextDelta(delta)) => {
                            reply_text.push_str(&delta);
                            yield Ok(OutputEvent::TextChunk(delta));
                        }
                        Ok(ModelEvent::ToolCall(call)) => {
                            pending_call = Some(call);
                            break;
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                drop(events);

                if let Some(e) = failure {
                    warn!(error = %e, "Model stream failed");
                    history.rewind(checkpoint);
                    yield Err(TurnError::Model(e));
                    return;
                }

                let Some(call) = pending_call else {
                    history.push_model_text(reply_text);
                    break;
                };

                rounds += 1;
                if rounds > self.max_tool_rounds {
                    warn!(max = self.max_tool_rounds, "Tool round limit reached");
                    history.rewind(checkpoint);
                    yield Err(TurnError::ToolRoundsExceeded(self.max_tool_rounds));
                    return;
                }

                history.record_tool_call(reply_text, &call);
                match self.tools.invoke(&call).await {
                    Ok(result) => {
                        history.splice_result(&call.id, result.function_response());
                        debug!(tool = %call.name, round = rounds, "Tool result spliced, continuing");
                        yield Ok(result.into_output());
                    }
                    Err(e) => {
                        history.rewind(checkpoint);
                        yield Err(TurnError::Tool(e));
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
