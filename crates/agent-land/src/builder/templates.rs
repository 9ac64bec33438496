use std::fmt::Write as _;

use agent_land_core::{DepsType, OutputType};

use super::config::{AgentConfig, ToolConfig};
use crate::helpers::{title_case, truncate_chars};

/// A starting point for new agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentTemplate {
    /// The template name.
    pub name: &'static str,
    /// The default instructions.
    pub instructions: &'static str,
    /// The default dependency type.
    pub deps_type: DepsType,
    /// The default output type.
    pub output_type: OutputType,
    /// Kinds of predefined tools that suit the template.
    pub suggested_tools: &'static [&'static str],
}

/// The built-in templates, in the order they are offered.
pub static TEMPLATES: [AgentTemplate; 4] = [
    AgentTemplate {
        name: "chat",
        instructions: "You are a helpful conversational AI assistant. Be friendly, informative, and engaging.",
        deps_type: DepsType::Chat,
        output_type: OutputType::ChatResponse,
        suggested_tools: &["echo", "format"],
    },
    AgentTemplate {
        name: "specialist",
        instructions: "You are a specialized AI expert in your domain. Provide detailed, accurate information.",
        deps_type: DepsType::Base,
        output_type: OutputType::AgentResult,
        suggested_tools: &["counter", "format"],
    },
    AgentTemplate {
        name: "researcher",
        instructions: "You are a research-focused AI that gathers and analyzes information systematically.",
        deps_type: DepsType::Research,
        output_type: OutputType::ResearchResult,
        suggested_tools: &["echo", "counter"],
    },
    AgentTemplate {
        name: "analyst",
        instructions: "You are an analytical AI that provides insights and recommendations based on data.",
        deps_type: DepsType::Data,
        output_type: OutputType::AnalysisResult,
        suggested_tools: &["format", "counter"],
    },
];

/// Defaults used when building an agent from scratch.
pub static BLANK_TEMPLATE: AgentTemplate = AgentTemplate {
    name: "scratch",
    instructions: "",
    deps_type: DepsType::Base,
    output_type: OutputType::AgentResult,
    suggested_tools: &[],
};

impl AgentTemplate {
    /// Looks up a built-in template by name.
    pub fn find(name: &str) -> Option<&'static AgentTemplate> {
        TEMPLATES.iter().find(|template| template.name == name)
    }

    /// Returns the predefined tools this template suggests.
    pub fn suggested_tool_configs(&self) -> Vec<ToolConfig> {
        self.suggested_tools
            .iter()
            .filter_map(|kind| ToolConfig::predefined(kind))
            .collect()
    }

    /// Creates a configuration with this template's defaults and tools.
    pub fn instantiate<S: Into<String>>(&self, name: S) -> AgentConfig {
        let mut config = AgentConfig::new(name, self.instructions)
            .with_deps_type(self.deps_type)
            .with_output_type(self.output_type);
        config.tools = self.suggested_tool_configs();
        config
    }
}

/// Describes the built-in templates.
pub fn list_templates() -> String {
    let mut text = "🎨 Available Agent Templates:\n".to_owned();
    for (i, template) in TEMPLATES.iter().enumerate() {
        _ = write!(
            text,
            "\n{}. {} Agent\n   \
             Instructions: {}...\n   \
             Dependencies: {}\n   \
             Output: {}\n   \
             Suggested Tools: {}\n",
            i + 1,
            title_case(template.name),
            truncate_chars(template.instructions, 60),
            template.deps_type,
            template.output_type,
            template.suggested_tools.join(", "),
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_templates() {
        let text = list_templates();
        assert!(text.starts_with("🎨 Available Agent Templates:\n\n1. Chat Agent\n"));
        assert!(text.contains(
            "   Instructions: You are a helpful conversational AI assistant. Be friendly, ...\n"
        ));
        assert!(text.contains("4. Analyst Agent\n"));
        assert!(text.contains("   Dependencies: ResearchDependencies\n"));
        assert!(text.ends_with("   Suggested Tools: format, counter\n"));
    }

    #[test]
    fn test_instantiate() {
        let config = AgentTemplate::find("researcher").unwrap().instantiate("digger");
        assert_eq!(config.name, "digger");
        assert_eq!(config.deps_type, DepsType::Research);
        assert_eq!(config.output_type, OutputType::ResearchResult);
        let tools: Vec<_> = config.tools.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(tools, ["echo_tool", "counter"]);

        assert!(AgentTemplate::find("poet").is_none());
        assert!(BLANK_TEMPLATE.suggested_tool_configs().is_empty());
    }
}
