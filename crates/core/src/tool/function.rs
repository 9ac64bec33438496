use std::fmt::{self, Debug};
use std::marker::PhantomData;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{RunContext, Tool, ToolResult};

/// Input of tools that take no parameters.
#[derive(Clone, Copy, Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// A tool backed by a closure.
///
/// The parameter schema is derived from the input type, so its doc comments
/// and `#[schemars(description = ...)]` attributes are what the model sees.
pub struct FnTool<I, F> {
    name: String,
    description: String,
    parameter_schema: Value,
    func: F,
    _input: PhantomData<fn(I)>,
}

impl<I, F, Fut> FnTool<I, F>
where
    I: JsonSchema + DeserializeOwned + 'static,
    F: Fn(RunContext, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    /// Creates a tool from a name, a description and the function to run.
    pub fn new<S1: Into<String>, S2: Into<String>>(
        name: S1,
        description: S2,
        func: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: schema_for!(I).to_value(),
            func,
            _input: PhantomData,
        }
    }
}

impl<I, F> Debug for FnTool<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<I, F, Fut> Tool for FnTool<I, F>
where
    I: JsonSchema + DeserializeOwned + 'static,
    F: Fn(RunContext, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    type Input = I;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        ctx: RunContext,
        input: I,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        (self.func)(ctx, input)
    }
}
