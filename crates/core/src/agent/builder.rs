use super::Agent;
use crate::deps::DepsType;
use crate::model_client::ModelClient;
use crate::output::OutputType;
use crate::retry::RetryConfig;
use crate::tool::{Tool, ToolSet};

const DEFAULT_MAX_STEPS: usize = 10;

/// [`Agent`] builder.
#[derive(Debug)]
pub struct AgentBuilder {
    pub(crate) name: String,
    pub(crate) model_id: String,
    pub(crate) model_client: ModelClient,
    pub(crate) instructions: Option<String>,
    pub(crate) deps_type: DepsType,
    pub(crate) output_type: OutputType,
    pub(crate) tools: ToolSet,
    pub(crate) max_steps: usize,
    pub(crate) retry: RetryConfig,
}

impl AgentBuilder {
    /// Creates a new builder. `model_id` is informational, requests go
    /// through `model_client`.
    pub fn new<S1: Into<String>, S2: Into<String>>(
        name: S1,
        model_id: S2,
        model_client: ModelClient,
    ) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            model_client,
            instructions: None,
            deps_type: DepsType::Base,
            output_type: OutputType::Text,
            tools: ToolSet::new(),
            max_steps: DEFAULT_MAX_STEPS,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the system instructions. Surrounding whitespace is trimmed.
    #[inline]
    pub fn with_instructions<S: AsRef<str>>(mut self, instructions: S) -> Self {
        self.instructions = Some(instructions.as_ref().trim().to_owned());
        self
    }

    /// Sets the dependency type.
    #[inline]
    pub fn with_deps_type(mut self, deps_type: DepsType) -> Self {
        self.deps_type = deps_type;
        self
    }

    /// Sets the output type.
    #[inline]
    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add(tool);
        self
    }

    /// Sets the maximum number of model requests per run.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Sets how rate-limited model requests are retried.
    #[inline]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
