//! Tool call supports.

mod error;
mod function;
mod registry;

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::deps::Dependencies;
pub use error::{Error, ErrorKind};
pub use function::{FnTool, NoArgs};
pub use registry::ToolSet;

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// The context a tool runs in.
///
/// Cloning is cheap, all clones share the same dependencies, so a change
/// made by one tool call is visible to the following ones and to the caller
/// once the run finishes.
#[derive(Clone, Debug)]
pub struct RunContext {
    agent_name: Arc<str>,
    deps: Arc<Mutex<Dependencies>>,
}

impl RunContext {
    /// Creates a context for the named agent.
    pub fn new(agent_name: &str, deps: Dependencies) -> Self {
        Self {
            agent_name: agent_name.into(),
            deps: Arc::new(Mutex::new(deps)),
        }
    }

    /// Returns the name of the running agent.
    #[inline]
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Runs `f` with exclusive access to the dependencies.
    ///
    /// Do not hold the borrow across an await point, copy out what you need
    /// instead.
    pub fn with_deps<R>(&self, f: impl FnOnce(&mut Dependencies) -> R) -> R {
        let mut deps = self.deps.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut deps)
    }

    /// Returns a snapshot of the dependencies.
    #[inline]
    pub fn deps(&self) -> Dependencies {
        self.with_deps(|deps| deps.clone())
    }
}

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless. Per-run state belongs
/// in the [`Dependencies`] reachable through the [`RunContext`].
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        ctx: RunContext,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(
        &self,
        ctx: RunContext,
        arguments: Value,
    ) -> BoxFuture<'static, ToolResult>;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    fn execute(
        &self,
        ctx: RunContext,
        arguments: Value,
    ) -> BoxFuture<'static, ToolResult> {
        // Some models send no arguments at all for parameterless tools.
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            arguments => arguments,
        };
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                return Box::pin(std::future::ready(ToolResult::Err(
                    Error::invalid_input().with_reason(err.to_string()),
                )));
            }
        };
        Box::pin(self.0.execute(ctx, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::DepsType;

    #[test]
    fn test_context_shares_deps() {
        let ctx = RunContext::new("tester", DepsType::Chat.default_deps());
        let clone = ctx.clone();
        clone.with_deps(|deps| {
            if let Some(chat) = deps.chat_mut() {
                chat.remember("user", "hello");
            }
        });
        assert_eq!(ctx.agent_name(), "tester");
        assert_eq!(ctx.deps().chat().unwrap().conversation_history.len(), 1);
    }
}
