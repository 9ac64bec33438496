use agent_land_core::{DepsType, OutputType};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The model used when a configuration names none.
pub const DEFAULT_MODEL: &str = "openai:gpt-4o";

/// A saved description of an agent, enough to rebuild it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The agent name, also the file stem of the saved configuration.
    pub name: String,
    /// The system instructions.
    pub instructions: String,
    /// The model identifier, e.g. `openai:gpt-4o`.
    #[serde(default = "default_model")]
    pub model: String,
    /// The dependency type, saved by name.
    #[serde(default)]
    pub deps_type: DepsType,
    /// The output type, saved by name.
    #[serde(default)]
    pub output_type: OutputType,
    /// The tools.
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
    /// When the configuration was created, in local time.
    pub created_at: NaiveDateTime,
}

impl AgentConfig {
    /// Creates a configuration stamped with the current time.
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, instructions: S2) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: default_model(),
            deps_type: DepsType::Base,
            output_type: OutputType::AgentResult,
            tools: vec![],
            created_at: Local::now().naive_local(),
        }
    }

    /// Sets the model identifier.
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the dependency type.
    pub fn with_deps_type(mut self, deps_type: DepsType) -> Self {
        self.deps_type = deps_type;
        self
    }

    /// Sets the output type.
    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    /// Adds a tool.
    pub fn with_tool(mut self, tool: ToolConfig) -> Self {
        self.tools.push(tool);
        self
    }

    /// Returns the creation time as `YYYY-mm-ddTHH:MM:SS`.
    pub fn created_display(&self) -> String {
        self.created_at.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

/// What a configured tool does when called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Returns `Echo: <message>`.
    Echo,
    /// Changes the case of a text.
    Format,
    /// Keeps a counter.
    Counter,
    /// Acknowledges its input. Unknown kinds load as this one.
    #[default]
    #[serde(other)]
    Default,
}

impl ToolKind {
    /// Returns the name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Echo => "echo",
            ToolKind::Format => "format",
            ToolKind::Counter => "counter",
            ToolKind::Default => "default",
        }
    }
}

/// A tool of a configured agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// The name the model calls the tool by.
    pub name: String,
    /// What the model is told the tool does.
    pub description: String,
    /// The behavior.
    #[serde(rename = "type", default)]
    pub kind: ToolKind,
    /// Parameter names, informational only.
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl ToolConfig {
    /// Creates a tool configuration without parameter names.
    pub fn new<S1: Into<String>, S2: Into<String>>(
        name: S1,
        description: S2,
        kind: ToolKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            parameters: vec![],
        }
    }

    /// Returns the ready-made tool of the given kind name (`echo`, `format`
    /// or `counter`).
    pub fn predefined(kind: &str) -> Option<Self> {
        let (name, description, kind, parameters): (_, _, _, &[&str]) = match kind {
            "echo" => (
                "echo_tool",
                "Echoes back the input message",
                ToolKind::Echo,
                &["message"],
            ),
            "format" => (
                "text_formatter",
                "Formats text in different ways (upper, lower, title)",
                ToolKind::Format,
                &["text", "format_type"],
            ),
            "counter" => (
                "counter",
                "A simple counter that can increment, decrement, or reset",
                ToolKind::Counter,
                &["action"],
            ),
            _ => return None,
        };
        Some(Self {
            parameters: parameters.iter().map(|&p| p.to_owned()).collect(),
            ..Self::new(name, description, kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_config_json() {
        let config = AgentConfig::new("helper", "Be helpful.")
            .with_deps_type(DepsType::Chat)
            .with_output_type(OutputType::ChatResponse)
            .with_tool(ToolConfig::predefined("echo").unwrap());

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["model"], "openai:gpt-4o");
        assert_eq!(value["deps_type"], "ChatDependencies");
        assert_eq!(value["output_type"], "ChatResponse");
        assert_eq!(
            value["tools"],
            json!([{
                "name": "echo_tool",
                "description": "Echoes back the input message",
                "type": "echo",
                "parameters": ["message"],
            }])
        );

        let loaded: AgentConfig = serde_json::from_value(value).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_lenient_loading() {
        let config: AgentConfig = serde_json::from_value(json!({
            "name": "old",
            "instructions": "x",
            "deps_type": "Whatever",
            "output_type": "AnalysisResult",
            "tools": [{"name": "t", "description": "d", "type": "weird"}],
            "created_at": "2025-03-01T10:20:30.123456",
        }))
        .unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.deps_type, DepsType::Base);
        assert_eq!(config.output_type, OutputType::AnalysisResult);
        assert_eq!(config.tools[0].kind, ToolKind::Default);
        assert!(config.tools[0].parameters.is_empty());
        assert_eq!(config.created_display(), "2025-03-01T10:20:30");
    }

    #[test]
    fn test_predefined_tools() {
        let format = ToolConfig::predefined("format").unwrap();
        assert_eq!(format.name, "text_formatter");
        assert_eq!(format.parameters, ["text", "format_type"]);
        assert_eq!(ToolConfig::predefined("counter").unwrap().kind, ToolKind::Counter);
        assert_eq!(ToolConfig::predefined("nope"), None);
    }
}
