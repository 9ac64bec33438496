use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use agent_land_model::{ModelTool, ToolCallRequest};
use futures_util::future::{BoxFuture, ready};
use tracing::Instrument;

use super::{AnyTool, Error, RunContext, Tool, ToolObject, ToolResult};

/// A set of tools keyed by name.
///
/// Adding a tool with an existing name replaces the old one.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<dyn ToolObject>>,
}

impl ToolSet {
    /// Creates an empty set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    pub fn add<T: Tool>(&mut self, tool: T) {
        let name = tool.name().to_owned();
        if self.tools.insert(name.clone(), Arc::new(AnyTool(tool))).is_some() {
            debug!("replaced tool: {name}");
        }
    }

    /// Unregisters a tool. Returns `true` if it was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// Returns `true` if a tool with this name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the number of tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if there are no tools.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns tool names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Returns tool definitions sorted by name.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .values()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Calls the requested tool.
    ///
    /// An unknown tool resolves to a `NotFound` error instead of panicking,
    /// so the model can be told about its mistake.
    pub fn call(
        &self,
        ctx: RunContext,
        req: &ToolCallRequest,
    ) -> BoxFuture<'static, ToolResult> {
        let Some(tool) = self.tools.get(&req.name) else {
            warn!("tool not found: {}", req.name);
            let err = Error::not_found()
                .with_reason(format!("unknown tool `{}`", req.name));
            return Box::pin(ready(Err(err)));
        };
        trace!("calling tool {} ({}) with {}", req.name, req.id, req.arguments);
        let span = debug_span!("tool call", name = %req.name, id = %req.id);
        Box::pin(tool.execute(ctx, req.arguments.clone()).instrument(span))
    }
}

impl Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tools.keys()).finish()
    }
}
