use futures_util::StreamExt;
use serde_json::json;

use super::*;
use crate::test_support::{invoker, search_args, seed, text, tool_call, ScriptedModel};
use crate::{AiError, Content, ProviderError, Role, ToolError};

async fn run(
    model: Arc<ScriptedModel>,
    history: &mut ChatHistory,
    parts: Vec<PromptPart>,
) -> Vec<Result<OutputEvent, TurnError>> {
    let interpreter = Interpreter::new(model, invoker());
    interpreter.process(history, parts).collect().await
}

fn question(text: &str) -> Vec<PromptPart> {
    vec![
        PromptPart::Text(text.to_string()),
        PromptPart::Metadata("\nmessage_metadata:\n  timestamp: 2024-05-01 10:00:00\n  message_type: text\n".into()),
    ]
}

fn chunk(event: &Result<OutputEvent, TurnError>) -> Option<&str> {
    match event {
        Ok(OutputEvent::TextChunk(text)) => Some(text),
        _ => None,
    }
}

#[tokio::test]
async fn plain_question_yields_text_only() {
    let model = Arc::new(ScriptedModel::new().reply(vec![text("Hello"), text(" there!")]));
    let mut history = ChatHistory::new(seed());

    let events = run(model.clone(), &mut history, question("hi")).await;

    let chunks: Vec<_> = events.iter().filter_map(chunk).collect();
    assert_eq!(chunks, ["Hello", " there!"]);
    assert_eq!(events.len(), 2);

    let turns = history.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].parts.len(), 2);
    assert_eq!(turns[1], Content::model_text("Hello there!"));
}

#[tokio::test]
async fn search_call_is_spliced_and_continued() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(vec![text("Let me check. "), tool_call("c1", "search", search_args())])
            .reply(vec![text("It is sunny in Paris.")]),
    );
    let mut history = ChatHistory::new(seed());

    let events = run(model.clone(), &mut history, question("Weather in Paris?")).await;

    assert_eq!(events.len(), 3);
    assert_eq!(chunk(&events[0]), Some("Let me check. "));
    assert!(matches!(
        &events[1],
        Ok(OutputEvent::SearchResults(results)) if results.query == "Paris weather"
    ));
    assert_eq!(chunk(&events[2]), Some("It is sunny in Paris."));
    let pre_call = events
        .iter()
        .filter(|e| chunk(e) == Some("Let me check. "))
        .count();
    assert_eq!(pre_call, 1);

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    let continuation = &requests[1];
    let call_entry = &continuation[continuation.len() - 2];
    assert_eq!(call_entry.role, Role::Model);
    assert_eq!(call_entry.parts[0], ContentPart::Text("Let me check. ".into()));
    match &continuation[continuation.len() - 1].parts[0] {
        ContentPart::FunctionResponse { id, name, response } => {
            assert_eq!(id, "c1");
            assert_eq!(name, "search");
            assert_eq!(response["answer"], "Sunny, 21°C");
        }
        other => panic!("expected function response, got {other:?}"),
    }

    let turns = history.turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[3], Content::model_text("It is sunny in Paris."));
}

#[tokio::test]
async fn unknown_tool_aborts_turn_and_keeps_earlier_text() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(vec![text("Hmm"), tool_call("c1", "weather", json!({}))])
            .reply(vec![text("never requested")]),
    );
    let mut history = ChatHistory::new(seed());

    let events = run(model.clone(), &mut history, question("?")).await;

    assert_eq!(events.len(), 2);
    assert_eq!(chunk(&events[0]), Some("Hmm"));
    assert!(matches!(
        &events[1],
        Err(TurnError::Tool(ToolError::UnknownTool(name))) if name == "weather"
    ));
    assert_eq!(model.requests().len(), 1);
    assert_eq!(history.contents(), seed().as_slice());
}

#[tokio::test]
async fn failing_image_generation_aborts_turn() {
    let model = Arc::new(ScriptedModel::new().reply(vec![
        text("Drawing it now."),
        tool_call(
            "c1",
            "image",
            json!({ "prompt": "a red bicycle", "image_name": "bike", "quality": "MEDIUM" }),
        ),
    ]));
    let mut history = ChatHistory::new(seed());

    let events = run(model, &mut history, question("draw a bike")).await;

    assert_eq!(chunk(&events[0]), Some("Drawing it now."));
    assert!(matches!(
        events.last(),
        Some(Err(TurnError::Tool(ToolError::ExecutionFailed {
            cause: ProviderError::NoImagesGenerated,
            ..
        })))
    ));
    assert!(history.turns().is_empty());
}

#[tokio::test]
async fn invalid_arguments_are_not_retried() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(vec![tool_call("c1", "search", json!({ "query": "q", "max_results": 50 }))])
            .reply(vec![text("unused")]),
    );
    let mut history = ChatHistory::new(seed());

    let events = run(model.clone(), &mut history, question("?")).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Err(TurnError::Tool(ToolError::InvalidArguments { .. }))
    ));
    assert_eq!(model.requests().len(), 1);
}

#[tokio::test]
async fn tool_rounds_are_bounded() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(vec![tool_call("c1", "search", search_args())])
            .reply(vec![tool_call("c2", "search", search_args())])
            .reply(vec![text("unused")]),
    );
    let mut history = ChatHistory::new(seed());
    let interpreter = Interpreter::new(model.clone(), invoker()).with_max_tool_rounds(1);

    let events: Vec<_> = interpreter
        .process(&mut history, question("loop"))
        .collect()
        .await;

    assert!(matches!(events[0], Ok(OutputEvent::SearchResults(_))));
    assert!(matches!(
        events.last(),
        Some(Err(TurnError::ToolRoundsExceeded(1)))
    ));
    assert_eq!(model.requests().len(), 2);
    assert!(history.turns().is_empty());
}

#[tokio::test]
async fn model_error_mid_stream_rewinds_history() {
    let model = Arc::new(ScriptedModel::new().reply(vec![
        text("partial"),
        Err(AiError::NetworkError("connection reset".into())),
    ]));
    let mut history = ChatHistory::new(seed());
    history.push_user(vec![ContentPart::Text("earlier".into())]);
    history.push_model_text("earlier answer".into());

    let events = run(model, &mut history, question("next")).await;

    assert_eq!(chunk(&events[0]), Some("partial"));
    assert!(matches!(
        &events[1],
        Err(TurnError::Model(AiError::NetworkError(_)))
    ));
    assert_eq!(history.turns().len(), 2);
}

#[tokio::test]
async fn stream_is_lazy_until_polled() {
    let model = Arc::new(ScriptedModel::new().reply(vec![text("ok")]));
    let mut history = ChatHistory::new(seed());
    let interpreter = Interpreter::new(model.clone(), invoker());

    let stream = interpreter.process(&mut history, question("hi"));
    assert!(model.requests().is_empty());
    drop(stream);
    assert!(history.turns().is_empty());
}
