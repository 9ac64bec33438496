use agent_land_core::tool::{FnTool, RunContext};
use agent_land_core::{Agent, AgentBuilder, DepsType, ModelClient, OutputType};
use schemars::JsonSchema;
use serde::Deserialize;

// Replace this with instructions specific to your agent.
const INSTRUCTIONS: &str = "\
Replace this with instructions specific to your agent's role and capabilities.
Be clear about what the agent should do, how it should behave, and what
tools it has available.";

#[derive(Deserialize, JsonSchema)]
struct ExampleInput {
    #[schemars(description = "Tool parameter.")]
    param: String,
}

/// A starting point for new agents: copy this file, rename the function,
/// then pick the instructions, dependency type, output type and tools.
pub fn template_agent(model: &str, client: ModelClient) -> Agent {
    AgentBuilder::new("template_agent", model, client)
        .with_instructions(INSTRUCTIONS)
        .with_deps_type(DepsType::Base)
        .with_output_type(OutputType::AgentResult)
        .with_tool(FnTool::new(
            "example_tool",
            "Example tool - replace with your actual tools.",
            |ctx, input: ExampleInput| async move { Ok(example_tool(&ctx, &input.param)) },
        ))
        .build()
}

fn example_tool(ctx: &RunContext, param: &str) -> String {
    let mut result = format!("Example tool executed with param: {param}");
    if let Some(user_id) = ctx.with_deps(|deps| deps.user_id.clone()) {
        result.push_str(&format!(" for user: {user_id}"));
    }
    result
}
