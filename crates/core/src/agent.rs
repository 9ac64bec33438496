mod builder;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use agent_land_model::{
    ModelMessage, ModelRequest, ModelTool, ToolCallRequest, ToolCallResult,
};
use futures_util::future::{BoxFuture, join_all};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::conversation::Conversation;
use crate::deps::{Dependencies, DepsType};
use crate::error::Error;
use crate::model_client::ModelClient;
use crate::output::{
    AgentOutput, FINAL_RESULT_TOOL, OutputType, ToolCallRecord,
};
use crate::retry::RetryConfig;
use crate::tool::{RunContext, ToolSet};
pub use builder::AgentBuilder;

const PROMPT_LOG_LIMIT: usize = 100;

/// An agent: a model, instructions and tools, plus the loop that drives
/// them.
///
/// The agent is immutable once built and cheap to clone, so it can be
/// shared between concurrent runs.
#[derive(Clone, Debug)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

#[derive(Debug)]
struct AgentInner {
    name: String,
    model_id: String,
    instructions: Option<String>,
    deps_type: DepsType,
    output_type: OutputType,
    tools: ToolSet,
    model_client: ModelClient,
    max_steps: usize,
    retry: RetryConfig,
}

/// Describes an agent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentInfo {
    /// The agent name.
    pub name: String,
    /// The model identifier, e.g. `openai:gpt-4o`.
    pub model: String,
    /// The system instructions.
    pub instructions: Option<String>,
    /// Name of the dependency type.
    pub deps_type: String,
    /// Name of the output type.
    pub output_type: String,
    /// Registered tools, sorted.
    pub tools: Vec<String>,
}

/// The outcome of a successful run.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// The final output.
    pub output: AgentOutput,
    /// Every tool call made during the run, in request order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// All messages exchanged.
    pub conversation: Conversation,
    /// Number of model requests made.
    pub steps: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
    /// The dependencies after the run, including changes made by tools.
    pub deps: Dependencies,
}

impl Agent {
    /// Returns the agent name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.inner.model_id
    }

    /// Returns the system instructions.
    #[inline]
    pub fn instructions(&self) -> Option<&str> {
        self.inner.instructions.as_deref()
    }

    /// Returns the dependency type.
    #[inline]
    pub fn deps_type(&self) -> DepsType {
        self.inner.deps_type
    }

    /// Returns the output type.
    #[inline]
    pub fn output_type(&self) -> OutputType {
        self.inner.output_type
    }

    /// Returns the names of the registered tools, sorted.
    #[inline]
    pub fn tool_names(&self) -> Vec<String> {
        self.inner.tools.names()
    }

    /// Describes this agent.
    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.inner.name.clone(),
            model: self.inner.model_id.clone(),
            instructions: self.inner.instructions.clone(),
            deps_type: self.inner.deps_type.name().to_owned(),
            output_type: self.inner.output_type.name().to_owned(),
            tools: self.tool_names(),
        }
    }

    /// Runs the agent on a prompt.
    ///
    /// Missing dependencies are replaced with the defaults of the agent's
    /// dependency type.
    pub async fn run(
        &self,
        prompt: &str,
        deps: Option<Dependencies>,
    ) -> Result<RunResult, Error> {
        self.run_stream(prompt, deps, |_| {}).await
    }

    /// Like [`Agent::run`], but forwards text deltas to `on_delta` as they
    /// arrive.
    pub async fn run_stream(
        &self,
        prompt: &str,
        deps: Option<Dependencies>,
        on_delta: impl Fn(String) + Send + Sync + 'static,
    ) -> Result<RunResult, Error> {
        info!(
            "running agent '{}' with prompt: {}...",
            self.name(),
            truncate_chars(prompt, PROMPT_LOG_LIMIT)
        );
        let result = self.run_loop(prompt, deps, Arc::new(on_delta)).await;
        match &result {
            Ok(result) => info!(
                "agent '{}' completed successfully in {} steps",
                self.name(),
                result.steps
            ),
            Err(err) => error!("agent '{}' failed: {err}", self.name()),
        }
        result
    }

    async fn run_loop(
        &self,
        prompt: &str,
        deps: Option<Dependencies>,
        on_delta: Arc<dyn Fn(String) + Send + Sync>,
    ) -> Result<RunResult, Error> {
        let started = Instant::now();
        let inner = &*self.inner;
        let deps = deps.unwrap_or_else(|| inner.deps_type.default_deps());
        let ctx = RunContext::new(&inner.name, deps);

        let mut conversation = Conversation::default();
        if let Some(instructions) = &inner.instructions {
            conversation.push(ModelMessage::System(instructions.clone()));
        }
        conversation.push(ModelMessage::User(prompt.to_owned()));

        let tools = self.tool_definitions();
        let mut records = vec![];

        for step in 1..=inner.max_steps {
            let req = ModelRequest {
                messages: conversation.messages(),
                tools: tools.clone(),
            };
            let on_delta = Arc::clone(&on_delta);
            let resp = inner
                .model_client
                .send_request_with_retry(req, &inner.retry, move |delta| {
                    on_delta(delta)
                })
                .await?;
            debug!(
                "step {step}: {} chars, {} tool calls, finish: {:?}",
                resp.transcript.len(),
                resp.tool_calls.len(),
                resp.finish_reason
            );

            conversation.push(ModelMessage::Assistant {
                content: resp.transcript.clone(),
                tool_calls: resp.tool_calls.clone(),
            });

            if resp.tool_calls.is_empty() {
                let output =
                    inner.output_type.from_text(prompt, resp.transcript);
                return Ok(self.finish(
                    output,
                    records,
                    conversation,
                    step,
                    started,
                    &ctx,
                ));
            }

            let mut final_output = None;
            let outcomes = join_all(
                resp.tool_calls
                    .iter()
                    .map(|call| self.dispatch(&ctx, call, &mut final_output)),
            )
            .await;
            for (call, (content, record)) in
                resp.tool_calls.iter().zip(outcomes)
            {
                conversation.push(ModelMessage::Tool(ToolCallResult {
                    id: call.id.clone(),
                    content,
                }));
                records.extend(record);
            }

            if let Some(output) = final_output {
                return Ok(self.finish(
                    output,
                    records,
                    conversation,
                    step,
                    started,
                    &ctx,
                ));
            }
        }

        Err(Error::StepLimitExceeded(inner.max_steps))
    }

    fn tool_definitions(&self) -> Vec<ModelTool> {
        let mut tools = self.inner.tools.definitions();
        if let Some(schema) = self.inner.output_type.schema() {
            tools.push(ModelTool {
                name: FINAL_RESULT_TOOL.to_owned(),
                description: format!(
                    "Delivers the final answer as a {}. Call it once the \
                     task is done.",
                    self.inner.output_type
                ),
                parameters: schema,
            });
        }
        tools
    }

    /// Returns a future resolving to the tool message content and, for
    /// regular tools, the call record.
    fn dispatch(
        &self,
        ctx: &RunContext,
        call: &ToolCallRequest,
        final_output: &mut Option<AgentOutput>,
    ) -> BoxFuture<'static, (String, Option<ToolCallRecord>)> {
        let output_type = self.inner.output_type;
        if call.name == FINAL_RESULT_TOOL && output_type != OutputType::Text {
            let parsed = output_type.parse_value(call.arguments.clone());
            let content = match parsed {
                Ok(_) if final_output.is_some() => {
                    "Final result already received.".to_owned()
                }
                Ok(output) => {
                    *final_output = Some(output);
                    "Final result processed.".to_owned()
                }
                Err(reason) => {
                    warn!("invalid final result: {reason}");
                    format!(
                        "Invalid final result: {reason}. Fix the errors and \
                         try again."
                    )
                }
            };
            return Box::pin(std::future::ready((content, None)));
        }

        let started = Instant::now();
        let fut = self.inner.tools.call(ctx.clone(), call);
        let tool_name = call.name.clone();
        let arguments = call.arguments.clone();
        Box::pin(async move {
            let result = fut.await;
            let execution_time = started.elapsed().as_secs_f64();
            match result {
                Ok(output) => {
                    let record = ToolCallRecord {
                        tool_name,
                        arguments,
                        result: Value::String(output.clone()),
                        success: true,
                        error: None,
                        execution_time: Some(execution_time),
                    };
                    (output, Some(record))
                }
                Err(err) => {
                    warn!("tool {tool_name} failed: {err}");
                    let content = format!("Error: {err}");
                    let record = ToolCallRecord {
                        tool_name,
                        arguments,
                        result: Value::Null,
                        success: false,
                        error: Some(err.to_string()),
                        execution_time: Some(execution_time),
                    };
                    (content, Some(record))
                }
            }
        })
    }

    fn finish(
        &self,
        mut output: AgentOutput,
        tool_calls: Vec<ToolCallRecord>,
        conversation: Conversation,
        steps: usize,
        started: Instant,
        ctx: &RunContext,
    ) -> RunResult {
        if let AgentOutput::Agent(result) = &mut output {
            result.tools_used = tool_calls.clone();
        }
        RunResult {
            output,
            tool_calls,
            conversation,
            steps,
            elapsed: started.elapsed(),
            deps: ctx.deps(),
        }
    }

    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            name,
            model_id,
            model_client,
            instructions,
            deps_type,
            output_type,
            mut tools,
            max_steps,
            retry,
        } = builder;
        if output_type != OutputType::Text && tools.remove(FINAL_RESULT_TOOL) {
            warn!("agent {name}: tool `{FINAL_RESULT_TOOL}` is reserved, dropped it");
        }
        Self {
            inner: Arc::new(AgentInner {
                name,
                model_id,
                instructions,
                deps_type,
                output_type,
                tools,
                model_client,
                max_steps,
                retry,
            }),
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
