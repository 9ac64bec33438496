//! Building agents from configuration at runtime.
//!
//! An [`AgentConfig`] names an agent's instructions, model, dependency and
//! output types and a list of simple tools. Configurations are created from
//! [templates](TEMPLATES) or the interactive [wizard](create_agent_interactive),
//! saved as JSON by the [`AgentStore`], and turned into runnable agents by
//! [`build_agent`].

mod config;
mod dynamic;
mod store;
mod templates;
mod wizard;

pub use config::{AgentConfig, DEFAULT_MODEL, ToolConfig, ToolKind};
pub use dynamic::build_agent;
pub use store::{AgentStore, StoreError, is_valid_name, is_valid_tool_name};
pub use templates::{AgentTemplate, BLANK_TEMPLATE, TEMPLATES, list_templates};
pub use wizard::{MODEL_CHOICES, create_agent_interactive};
