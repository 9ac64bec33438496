//! Structured outputs.
//!
//! Agents with a structured [`OutputType`] expose a `final_result` tool whose
//! parameters are the JSON schema of that type. A plain-text answer is
//! converted into the output type instead of failing the run.

use std::convert::Infallible;
use std::fmt::{self, Display, Write};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The name of the tool used to deliver structured outputs.
pub const FINAL_RESULT_TOOL: &str = "final_result";

/// Names the shape of an agent's output.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum OutputType {
    /// Plain text, no `final_result` tool.
    Text,
    /// [`AgentResult`].
    #[default]
    AgentResult,
    /// [`ChatResponse`].
    ChatResponse,
    /// [`ResearchResult`].
    ResearchResult,
    /// [`AnalysisResult`].
    AnalysisResult,
}

impl OutputType {
    /// Output types offered to users when building agents.
    pub const ALL: [OutputType; 4] = [
        OutputType::AgentResult,
        OutputType::ChatResponse,
        OutputType::ResearchResult,
        OutputType::AnalysisResult,
    ];

    /// Returns the canonical name.
    pub fn name(self) -> &'static str {
        match self {
            OutputType::Text => "Text",
            OutputType::AgentResult => "AgentResult",
            OutputType::ChatResponse => "ChatResponse",
            OutputType::ResearchResult => "ResearchResult",
            OutputType::AnalysisResult => "AnalysisResult",
        }
    }

    /// Parses a name leniently. Unknown names map to
    /// [`OutputType::AgentResult`].
    pub fn parse(name: &str) -> Self {
        match name {
            "Text" | "text" | "str" => OutputType::Text,
            _ => Self::ALL
                .into_iter()
                .find(|ty| ty.name() == name)
                .unwrap_or_default(),
        }
    }

    /// Returns the JSON schema of the `final_result` tool, or `None` for
    /// plain text.
    pub fn schema(self) -> Option<Value> {
        let schema = match self {
            OutputType::Text => return None,
            OutputType::AgentResult => schema_for!(AgentResult),
            OutputType::ChatResponse => schema_for!(ChatResponse),
            OutputType::ResearchResult => schema_for!(ResearchResult),
            OutputType::AnalysisResult => schema_for!(AnalysisResult),
        };
        Some(schema.to_value())
    }

    /// Validates `final_result` arguments against this type.
    pub fn parse_value(self, value: Value) -> Result<AgentOutput, String> {
        let output = match self {
            OutputType::Text => match value {
                Value::String(text) => AgentOutput::Text(text),
                other => AgentOutput::Text(other.to_string()),
            },
            OutputType::AgentResult => {
                AgentOutput::Agent(from_value(value)?)
            }
            OutputType::ChatResponse => AgentOutput::Chat(from_value(value)?),
            OutputType::ResearchResult => {
                AgentOutput::Research(from_value(value)?)
            }
            OutputType::AnalysisResult => {
                AgentOutput::Analysis(from_value(value)?)
            }
        };
        Ok(output)
    }

    /// Converts a plain-text answer into this type.
    pub fn from_text(self, prompt: &str, text: String) -> AgentOutput {
        match self {
            OutputType::Text => AgentOutput::Text(text),
            OutputType::AgentResult => {
                AgentOutput::Agent(AgentResult::new(Value::String(text)))
            }
            OutputType::ChatResponse => {
                AgentOutput::Chat(ChatResponse::new(text))
            }
            OutputType::ResearchResult => {
                AgentOutput::Research(ResearchResult::new(prompt, vec![text]))
            }
            OutputType::AnalysisResult => {
                AgentOutput::Analysis(AnalysisResult::new(text))
            }
        }
    }
}

fn from_value<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|err| err.to_string())
}

impl Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputType {
    type Err = Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for OutputType {
    #[inline]
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<OutputType> for String {
    #[inline]
    fn from(value: OutputType) -> Self {
        value.name().to_owned()
    }
}

/// A record of one tool call made during a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCallRecord {
    /// The called tool.
    pub tool_name: String,
    /// Arguments sent by the model.
    pub arguments: Value,
    /// The tool output, `null` on failure.
    pub result: Value,
    /// Whether the call succeeded.
    pub success: bool,
    /// The failure reason.
    pub error: Option<String>,
    /// Wall time in seconds.
    pub execution_time: Option<f64>,
}

/// A chat reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChatResponse {
    /// The reply text.
    pub message: String,
    /// The conversation this reply belongs to.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// When the output was produced.
    #[serde(default = "Utc::now")]
    #[schemars(skip)]
    pub timestamp: DateTime<Utc>,
    /// Free-form extra data.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl ChatResponse {
    /// Creates a reply timestamped now.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }
}

/// A generic agent result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentResult {
    /// The result, any JSON value.
    pub result: Value,
    /// Filled by the runner from the run's tool calls.
    #[serde(default)]
    #[schemars(skip)]
    pub tools_used: Vec<ToolCallRecord>,
    /// How the result was reached.
    #[serde(default)]
    pub reasoning: Option<String>,
    /// When the output was produced.
    #[serde(default = "Utc::now")]
    #[schemars(skip)]
    pub timestamp: DateTime<Utc>,
    /// Free-form extra data.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl AgentResult {
    /// Creates a result timestamped now.
    pub fn new(result: Value) -> Self {
        Self {
            result,
            tools_used: vec![],
            reasoning: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }
}

/// Findings of a research run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchResult {
    /// The researched question.
    pub query: String,
    /// Key findings, most important first.
    pub findings: Vec<String>,
    /// Where the findings come from.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Between 0 and 1.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// When the output was produced.
    #[serde(default = "Utc::now")]
    #[schemars(skip)]
    pub timestamp: DateTime<Utc>,
    /// Free-form extra data.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl ResearchResult {
    /// Creates a result timestamped now.
    pub fn new<S: Into<String>>(query: S, findings: Vec<String>) -> Self {
        Self {
            query: query.into(),
            findings,
            sources: vec![],
            confidence: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }
}

/// The outcome of a data analysis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    /// The analysis narrative.
    pub analysis: String,
    /// Notable observations.
    #[serde(default)]
    pub insights: Vec<String>,
    /// Suggested actions.
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Summary statistics of the analyzed data.
    #[serde(default)]
    pub data_summary: Option<Map<String, Value>>,
    /// When the output was produced.
    #[serde(default = "Utc::now")]
    #[schemars(skip)]
    pub timestamp: DateTime<Utc>,
    /// Free-form extra data.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl AnalysisResult {
    /// Creates a result timestamped now.
    pub fn new<S: Into<String>>(analysis: S) -> Self {
        Self {
            analysis: analysis.into(),
            insights: vec![],
            recommendations: vec![],
            data_summary: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }
}

/// The output of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentOutput {
    /// Plain text.
    Text(String),
    /// See [`AgentResult`].
    Agent(AgentResult),
    /// See [`ChatResponse`].
    Chat(ChatResponse),
    /// See [`ResearchResult`].
    Research(ResearchResult),
    /// See [`AnalysisResult`].
    Analysis(AnalysisResult),
}

impl AgentOutput {
    /// Returns the type of this output.
    pub fn output_type(&self) -> OutputType {
        match self {
            AgentOutput::Text(_) => OutputType::Text,
            AgentOutput::Agent(_) => OutputType::AgentResult,
            AgentOutput::Chat(_) => OutputType::ChatResponse,
            AgentOutput::Research(_) => OutputType::ResearchResult,
            AgentOutput::Analysis(_) => OutputType::AnalysisResult,
        }
    }

    /// Renders the operator-facing text of this output.
    pub fn render(&self) -> String {
        match self {
            AgentOutput::Text(text) => text.clone(),
            AgentOutput::Chat(chat) => chat.message.clone(),
            AgentOutput::Agent(agent) => match &agent.result {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
            AgentOutput::Analysis(analysis) => {
                let mut text = format!("Analysis: {}", analysis.analysis);
                push_bullets(&mut text, "Insights", &analysis.insights);
                push_bullets(
                    &mut text,
                    "Recommendations",
                    &analysis.recommendations,
                );
                text
            }
            AgentOutput::Research(research) => {
                let mut text = "Research Results:\n".to_owned();
                for (i, finding) in research.findings.iter().enumerate() {
                    _ = writeln!(text, "{}. {finding}", i + 1);
                }
                if let Some(confidence) =
                    research.confidence.filter(|c| *c != 0.0)
                {
                    _ = write!(text, "\nConfidence: {:.2}%", confidence * 100.0);
                }
                text
            }
        }
    }
}

fn push_bullets(text: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    _ = write!(text, "\n\n{title}:");
    for item in items {
        _ = write!(text, "\n• {item}");
    }
}
