use agent_land_core::tool::{Error as ToolError, FnTool};
use agent_land_core::{Agent, AgentBuilder, DepsType, ModelClient, OutputType};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::data::{self, Record};

const INSTRUCTIONS: &str = "\
You are a data analyst AI assistant. You help users analyze data, identify patterns,
generate insights, and provide actionable recommendations. Use the available tools
to process data and perform statistical analysis. Always explain your methodology
and assumptions clearly.";

const PATTERNS: [&str; 4] = [
    "Strong correlation between value and category X",
    "Seasonal trend with peaks in Q2 and Q4",
    "Outliers detected in 2.3% of records",
    "Missing data pattern suggests systematic collection issues",
];

const INSIGHTS: [&str; 4] = [
    "Category X items show 23% higher values on average",
    "Peak performance periods align with marketing campaigns",
    "Data quality issues may impact accuracy of trend analysis",
    "Opportunity exists to optimize category Y performance",
];

const RECOMMENDATIONS: [&str; 4] = [
    "Implement data validation checks for improved quality",
    "Focus marketing efforts during identified peak periods",
    "Investigate success factors for category X items",
    "Establish regular monitoring for outlier detection",
];

#[derive(Deserialize, JsonSchema)]
struct LoadData {
    #[schemars(description = "Where the data comes from, e.g. a file name.")]
    data_source: String,
}

#[derive(Deserialize, JsonSchema)]
struct CalculateStatistics {
    #[schemars(description = "The column to describe.")]
    column: String,
}

#[derive(Deserialize, JsonSchema)]
struct IdentifyPatterns {
    #[allow(dead_code)]
    data_summary: String,
}

#[derive(Deserialize, JsonSchema)]
struct GenerateInsights {
    #[allow(dead_code)]
    analysis_results: String,
}

#[derive(Deserialize, JsonSchema)]
struct RecommendActions {
    #[allow(dead_code)]
    insights: String,
}

/// An agent that analyzes data and turns it into recommendations.
pub fn data_analyst(model: &str, client: ModelClient) -> Agent {
    AgentBuilder::new("data_analyst", model, client)
        .with_instructions(INSTRUCTIONS)
        .with_deps_type(DepsType::Data)
        .with_output_type(OutputType::AnalysisResult)
        .with_tool(FnTool::new(
            "load_data",
            "Load data from various sources (CSV, JSON, etc.)",
            |ctx, input: LoadData| async move {
                let has_path = ctx.with_deps(|deps| {
                    deps.data().is_some_and(|data| data.data_path.is_some())
                });
                if !has_path {
                    return Ok("No data path specified in dependencies".to_owned());
                }
                Ok(format!(
                    "Loaded data from {}:\n{}",
                    input.data_source,
                    pretty(&sample_dataset())
                ))
            },
        ))
        .with_tool(FnTool::new(
            "calculate_statistics",
            "Calculate basic statistics for a column",
            |_ctx, input: CalculateStatistics| async move {
                calculate_statistics(&input.column)
            },
        ))
        .with_tool(FnTool::new(
            "identify_patterns",
            "Identify patterns and trends in the data",
            |_ctx, _: IdentifyPatterns| async move {
                Ok(bullet_list("Identified patterns:", &PATTERNS))
            },
        ))
        .with_tool(FnTool::new(
            "generate_insights",
            "Generate business insights from analysis results",
            |_ctx, _: GenerateInsights| async move {
                Ok(bullet_list("Key insights:", &INSIGHTS))
            },
        ))
        .with_tool(FnTool::new(
            "recommend_actions",
            "Generate actionable recommendations based on insights",
            |_ctx, _: RecommendActions| async move {
                Ok(bullet_list("Recommendations:", &RECOMMENDATIONS))
            },
        ))
        .build()
}

fn sample_dataset() -> Value {
    json!({
        "records": 1000,
        "columns": ["id", "name", "value", "category", "timestamp"],
        "sample": [
            {"id": 1, "name": "Item A", "value": 42.5, "category": "X"},
            {"id": 2, "name": "Item B", "value": 38.2, "category": "Y"},
            {"id": 3, "name": "Item C", "value": 55.1, "category": "X"}
        ]
    })
}

fn sample_records() -> Vec<Record> {
    let mut dataset = sample_dataset();
    data::records_from_value(dataset["sample"].take()).unwrap_or_default()
}

fn calculate_statistics(column: &str) -> Result<String, ToolError> {
    let stats = data::calculate_column_stats(&sample_records(), column)
        .map_err(|err| ToolError::execution_error().with_reason(err.to_string()))?;
    Ok(format!("Statistics for column '{column}':\n{}", pretty(&stats)))
}

fn bullet_list(title: &str, items: &[&str]) -> String {
    let mut text = title.to_owned();
    for item in items {
        text.push_str("\n- ");
        text.push_str(item);
    }
    text
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
