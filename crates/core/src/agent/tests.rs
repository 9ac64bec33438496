use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_land_model::{ErrorKind, ModelMessage};
use agent_land_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tokio::time::{Instant, sleep};

use crate::deps::{Dependencies, DependencyKind, DepsType};
use crate::output::{AgentOutput, OutputType};
use crate::tool::{FnTool, NoArgs};
use crate::{AgentBuilder, Error, ModelClient, RetryConfig};

#[derive(Deserialize, JsonSchema)]
struct Remember {
    role: String,
    content: String,
}

#[derive(Deserialize, JsonSchema)]
struct Nap {
    millis: u64,
}

fn builder(provider: &TestModelProvider) -> AgentBuilder {
    AgentBuilder::new(
        "tester",
        "test:scripted",
        ModelClient::new(provider.clone()),
    )
    .with_instructions("\n    Be helpful.\n    ")
    .with_retry(RetryConfig::NONE)
}

#[tokio::test]
async fn test_text_answer_converted_to_output_type() {
    let provider = TestModelProvider::with_responses([
        PresetResponse::with_events([
            PresetEvent::text("Hi, "),
            PresetEvent::text("what can I do for you?"),
        ]),
    ]);
    let agent = builder(&provider)
        .with_output_type(OutputType::ChatResponse)
        .build();

    let deltas = Arc::new(Mutex::new(String::new()));
    let result = agent
        .run_stream("Hello", None, {
            let deltas = Arc::clone(&deltas);
            move |delta| deltas.lock().unwrap().push_str(&delta)
        })
        .await
        .unwrap();

    assert_eq!(result.output.render(), "Hi, what can I do for you?");
    assert_eq!(result.output.output_type(), OutputType::ChatResponse);
    assert_eq!(*deltas.lock().unwrap(), "Hi, what can I do for you?");
    assert_eq!(result.steps, 1);
    assert_eq!(result.conversation.len(), 3);
    assert_eq!(
        result.conversation.items()[0].message(),
        &ModelMessage::System("Be helpful.".to_owned())
    );

    let requests = provider.requests();
    let tools = &requests[0].tools;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "final_result");
}

#[tokio::test]
async fn test_tool_round_trip_updates_deps() {
    let provider = TestModelProvider::with_responses([
        PresetResponse::with_events([PresetEvent::tool_call(
            "call:1",
            "remember_message",
            json!({ "role": "user", "content": "I like tea" }),
        )]),
        PresetResponse::text("Noted."),
    ]);
    let agent = builder(&provider)
        .with_deps_type(DepsType::Chat)
        .with_output_type(OutputType::AgentResult)
        .with_tool(FnTool::new(
            "remember_message",
            "Remembers a message.",
            |ctx, input: Remember| async move {
                ctx.with_deps(|deps| {
                    if let Some(chat) = deps.chat_mut() {
                        chat.remember(&input.role, &input.content);
                    }
                });
                Ok(format!("Remembered {} message", input.role))
            },
        ))
        .build();

    // No dependencies given, the chat defaults are used.
    let result = agent.run("Remember this", None).await.unwrap();
    assert_eq!(result.steps, 2);
    let chat = result.deps.chat().unwrap();
    assert_eq!(chat.conversation_history[0].content, "I like tea");

    assert_eq!(result.tool_calls.len(), 1);
    let record = &result.tool_calls[0];
    assert!(record.success);
    assert_eq!(record.tool_name, "remember_message");
    assert_eq!(record.result, json!("Remembered user message"));

    let AgentOutput::Agent(output) = &result.output else {
        panic!("unexpected output: {:?}", result.output);
    };
    assert_eq!(output.result, json!("Noted."));
    assert_eq!(output.tools_used, result.tool_calls);

    // The second request replays the tool call and its result.
    let second = &provider.requests()[1];
    assert!(matches!(
        &second.messages[2],
        ModelMessage::Assistant { tool_calls, .. } if tool_calls.len() == 1
    ));
    let ModelMessage::Tool(tool_result) = &second.messages[3] else {
        panic!("expected a tool result, got {:?}", second.messages[3]);
    };
    assert_eq!(tool_result.id, "call:1");
    assert_eq!(tool_result.content, "Remembered user message");
}

#[tokio::test]
async fn test_tool_errors_are_reported_to_the_model() {
    let provider = TestModelProvider::with_responses([
        PresetResponse::with_events([
            PresetEvent::tool_call("a", "missing_tool", json!({})),
            PresetEvent::tool_call("b", "nap", json!({ "seconds": 1 })),
        ]),
        PresetResponse::text("Sorry."),
    ]);
    let agent = builder(&provider)
        .with_tool(FnTool::new("nap", "Sleeps.", |_ctx, input: Nap| async move {
            sleep(Duration::from_millis(input.millis)).await;
            Ok("rested".to_owned())
        }))
        .build();

    let result = agent.run("Go", Some(Dependencies::default())).await.unwrap();
    assert_eq!(result.output, AgentOutput::Text("Sorry.".to_owned()));
    assert_eq!(result.tool_calls.len(), 2);
    assert!(result.tool_calls.iter().all(|record| !record.success));

    let second = &provider.requests()[1];
    let contents: Vec<_> = second
        .messages
        .iter()
        .filter_map(|msg| match msg {
            ModelMessage::Tool(result) => Some(result.content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(contents.len(), 2);
    assert!(contents[0].contains("missing_tool"));
    assert!(contents[1].starts_with("Error: Invalid input"));
}

#[tokio::test(start_paused = true)]
async fn test_tool_calls_run_concurrently() {
    let provider = TestModelProvider::with_responses([
        PresetResponse::with_events([
            PresetEvent::tool_call("a", "nap", json!({ "millis": 500 })),
            PresetEvent::tool_call("b", "nap", json!({ "millis": 500 })),
            PresetEvent::tool_call("c", "nap", json!({ "millis": 500 })),
        ]),
        PresetResponse::text("Done."),
    ]);
    let agent = builder(&provider)
        .with_tool(FnTool::new("nap", "Sleeps.", |_ctx, input: Nap| async move {
            sleep(Duration::from_millis(input.millis)).await;
            Ok("rested".to_owned())
        }))
        .build();

    let started = Instant::now();
    let result = agent.run("Nap", None).await.unwrap();
    assert_eq!(result.tool_calls.len(), 3);
    assert!(started.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_final_result_validation() {
    let provider = TestModelProvider::with_responses([
        PresetResponse::with_events([PresetEvent::tool_call(
            "r1",
            "final_result",
            json!({ "summary": "wrong shape" }),
        )]),
        PresetResponse::with_events([PresetEvent::tool_call(
            "r2",
            "final_result",
            json!({
                "query": "rust",
                "findings": ["memory safe", "fast"],
                "confidence": 0.9
            }),
        )]),
    ]);
    let agent = builder(&provider)
        .with_output_type(OutputType::ResearchResult)
        .build();

    let result = agent.run("Research rust", None).await.unwrap();
    assert_eq!(result.steps, 2);
    let AgentOutput::Research(research) = &result.output else {
        panic!("unexpected output: {:?}", result.output);
    };
    assert_eq!(research.findings, ["memory safe", "fast"]);
    assert!(result.tool_calls.is_empty());

    let second = &provider.requests()[1];
    let ModelMessage::Tool(feedback) = &second.messages[3] else {
        panic!("expected a tool result, got {:?}", second.messages[3]);
    };
    assert!(feedback.content.starts_with("Invalid final result"));
}

#[tokio::test]
async fn test_final_result_name_is_reserved() {
    let provider = TestModelProvider::with_responses([
        PresetResponse::with_events([PresetEvent::tool_call(
            "r1",
            "final_result",
            json!({ "result": "done" }),
        )]),
    ]);
    let agent = builder(&provider)
        .with_output_type(OutputType::AgentResult)
        .with_tool(FnTool::new("final_result", "Shadow.", |_ctx, _: NoArgs| {
            async { Ok("shadowed".to_owned()) }
        }))
        .build();
    assert!(agent.info().tools.is_empty());

    let result = agent.run("Finish", None).await.unwrap();
    assert_eq!(result.output.output_type(), OutputType::AgentResult);
    assert!(result.tool_calls.is_empty());

    let requests = provider.requests();
    let names: Vec<_> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["final_result"]);
}

#[test]
fn test_final_result_name_free_for_text_agents() {
    let provider = TestModelProvider::default();
    let agent = builder(&provider)
        .with_tool(FnTool::new("final_result", "Plain.", |_ctx, _: NoArgs| {
            async { Ok(String::new()) }
        }))
        .build();
    assert_eq!(agent.info().tools, ["final_result"]);
}

#[tokio::test]
async fn test_step_limit() {
    let call = || {
        PresetResponse::with_events([PresetEvent::tool_call(
            "x",
            "ping",
            json!({}),
        )])
    };
    let provider = TestModelProvider::with_responses([call(), call(), call()]);
    let agent = builder(&provider)
        .with_max_steps(2)
        .with_tool(FnTool::new("ping", "Pong.", |_ctx, _: NoArgs| async {
            Ok("pong".to_owned())
        }))
        .build();

    let err = agent.run("Loop", None).await.unwrap_err();
    assert_eq!(err, Error::StepLimitExceeded(2));
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn test_model_error() {
    let provider = TestModelProvider::default();
    let agent = builder(&provider).build();
    let err = agent.run("Hi", None).await.unwrap_err();
    assert_eq!(err.model_kind(), Some(ErrorKind::Other));
}

#[test]
fn test_info() {
    let provider = TestModelProvider::default();
    let agent = builder(&provider)
        .with_deps_type(DepsType::Data)
        .with_output_type(OutputType::AnalysisResult)
        .with_tool(FnTool::new("b_tool", "B.", |_ctx, _: NoArgs| async {
            Ok(String::new())
        }))
        .with_tool(FnTool::new("a_tool", "A.", |_ctx, _: NoArgs| async {
            Ok(String::new())
        }))
        .build();

    let info = agent.info();
    assert_eq!(info.name, "tester");
    assert_eq!(info.model, "test:scripted");
    assert_eq!(info.instructions.as_deref(), Some("Be helpful."));
    assert_eq!(info.deps_type, "DataDependencies");
    assert_eq!(info.output_type, "AnalysisResult");
    assert_eq!(info.tools, ["a_tool", "b_tool"]);
    assert!(matches!(
        DepsType::Data.default_deps().kind,
        DependencyKind::Data(_)
    ));
}
