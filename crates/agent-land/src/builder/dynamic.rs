use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use agent_land_core::tool::FnTool;
use agent_land_core::{Agent, AgentBuilder, ModelClient};
use schemars::JsonSchema;
use serde::Deserialize;

use super::config::{AgentConfig, ToolConfig, ToolKind};
use crate::helpers::title_case;

#[derive(Deserialize, JsonSchema)]
struct EchoInput {
    /// The message to echo.
    message: String,
}

#[derive(Deserialize, JsonSchema)]
struct FormatInput {
    /// The text to format.
    text: String,
    /// One of `upper`, `lower` or `title`.
    #[serde(default = "default_format")]
    format_type: String,
}

#[derive(Deserialize, JsonSchema)]
struct CounterInput {
    /// One of `increment`, `decrement` or `reset`.
    #[serde(default = "default_action")]
    action: String,
}

#[derive(Deserialize, JsonSchema)]
struct DefaultInput {
    /// The input to process.
    input_param: String,
}

fn default_format() -> String {
    "upper".to_owned()
}

fn default_action() -> String {
    "increment".to_owned()
}

/// Builds an agent from its configuration.
///
/// Every call creates fresh tool state, so counters are not shared between
/// agents built from the same configuration.
pub fn build_agent(config: &AgentConfig, client: ModelClient) -> Agent {
    let builder = AgentBuilder::new(&config.name, &config.model, client)
        .with_instructions(&config.instructions)
        .with_deps_type(config.deps_type)
        .with_output_type(config.output_type);
    config
        .tools
        .iter()
        .fold(builder, add_tool)
        .build()
}

fn add_tool(builder: AgentBuilder, tool: &ToolConfig) -> AgentBuilder {
    let name = tool.name.clone();
    let description = tool.description.clone();
    match tool.kind {
        ToolKind::Echo => builder.with_tool(FnTool::new(
            name,
            description,
            |_ctx, input: EchoInput| async move { Ok(format!("Echo: {}", input.message)) },
        )),
        ToolKind::Format => builder.with_tool(FnTool::new(
            name,
            description,
            |_ctx, input: FormatInput| async move {
                Ok(format_text(&input.text, &input.format_type))
            },
        )),
        ToolKind::Counter => {
            let count = Arc::new(AtomicI64::new(0));
            builder.with_tool(FnTool::new(
                name,
                description,
                move |_ctx, input: CounterInput| {
                    let value = count_step(&count, &input.action);
                    async move { Ok(format!("Counter: {value}")) }
                },
            ))
        }
        ToolKind::Default => builder.with_tool(FnTool::new(
            name.clone(),
            description,
            move |_ctx, input: DefaultInput| {
                let reply = format!("Tool '{name}' processed: {}", input.input_param);
                async move { Ok(reply) }
            },
        )),
    }
}

fn format_text(text: &str, format_type: &str) -> String {
    match format_type {
        "upper" => text.to_uppercase(),
        "lower" => text.to_lowercase(),
        "title" => title_case(text),
        _ => text.to_owned(),
    }
}

fn count_step(count: &AtomicI64, action: &str) -> i64 {
    match action {
        "increment" => count.fetch_add(1, Ordering::Relaxed) + 1,
        "decrement" => count.fetch_sub(1, Ordering::Relaxed) - 1,
        "reset" => {
            count.store(0, Ordering::Relaxed);
            0
        }
        _ => count.load(Ordering::Relaxed),
    }
}
