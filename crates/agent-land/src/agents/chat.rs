use std::fmt::Write as _;

use agent_land_core::tool::{FnTool, NoArgs, RunContext};
use agent_land_core::{Agent, AgentBuilder, DepsType, ModelClient, OutputType};
use schemars::JsonSchema;
use serde::Deserialize;

const INSTRUCTIONS: &str = "\
You are a helpful and friendly AI assistant. Engage in natural conversation with users.
Be concise but informative. If you don't know something, say so honestly.
Maintain context from the conversation history when available.";

const CONTEXT_ENTRIES: usize = 5;

#[derive(Deserialize, JsonSchema)]
struct RememberMessage {
    #[schemars(description = "Who said it, e.g. `user` or `assistant`.")]
    role: String,
    #[schemars(description = "The message to remember.")]
    content: String,
}

/// A conversational agent that keeps track of the chat history.
pub fn simple_chat(model: &str, client: ModelClient) -> Agent {
    AgentBuilder::new("simple_chat", model, client)
        .with_instructions(INSTRUCTIONS)
        .with_deps_type(DepsType::Chat)
        .with_output_type(OutputType::ChatResponse)
        .with_tool(FnTool::new(
            "get_conversation_context",
            "Get recent conversation history for context",
            |ctx, _: NoArgs| async move { Ok(conversation_context(&ctx)) },
        ))
        .with_tool(FnTool::new(
            "remember_message",
            "Remember a message in the conversation history",
            |ctx, input: RememberMessage| async move {
                Ok(remember_message(&ctx, input))
            },
        ))
        .build()
}

fn conversation_context(ctx: &RunContext) -> String {
    ctx.with_deps(|deps| {
        let history = deps
            .chat()
            .map(|chat| chat.recent(CONTEXT_ENTRIES))
            .unwrap_or_default();
        if history.is_empty() {
            return "No previous conversation history available".to_owned();
        }

        let mut context = "Recent conversation:\n".to_owned();
        for entry in history {
            _ = writeln!(context, "- {}: {}", entry.role, entry.content);
        }
        context
    })
}

fn remember_message(ctx: &RunContext, input: RememberMessage) -> String {
    ctx.with_deps(|deps| match deps.chat_mut() {
        Some(chat) => {
            chat.remember(&input.role, input.content);
            format!("Remembered {} message in conversation history", input.role)
        }
        None => "No conversation context available".to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use agent_land_core::{AgentOutput, DepsType};
    use agent_land_test_model::{PresetEvent, PresetResponse, TestModelProvider};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_context_from_history() {
        let mut deps = DepsType::Chat.default_deps();
        let chat = deps.chat_mut().unwrap();
        for i in 1..=7 {
            chat.remember("user", format!("message {i}"));
        }
        let ctx = RunContext::new("simple_chat", deps);
        let context = conversation_context(&ctx);
        assert!(context.starts_with("Recent conversation:\n- user: message 3\n"));
        assert!(context.ends_with("- user: message 7\n"));

        let empty = RunContext::new("simple_chat", DepsType::Chat.default_deps());
        assert_eq!(
            conversation_context(&empty),
            "No previous conversation history available"
        );
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let provider = TestModelProvider::with_responses([
            PresetResponse::with_events([PresetEvent::tool_call(
                "call_1",
                "remember_message",
                json!({"role": "user", "content": "my name is Ada"}),
            )]),
            PresetResponse::text("Nice to meet you, Ada!"),
        ]);
        let agent = simple_chat("test:scripted", ModelClient::new(provider.clone()));
        assert_eq!(
            agent.tool_names(),
            ["get_conversation_context", "remember_message"]
        );

        let result = agent.run("I'm Ada", None).await.unwrap();
        let AgentOutput::Chat(chat) = &result.output else {
            panic!("unexpected output: {:?}", result.output);
        };
        assert_eq!(chat.message, "Nice to meet you, Ada!");
        let history = &result.deps.chat().unwrap().conversation_history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "my name is Ada");
    }
}
