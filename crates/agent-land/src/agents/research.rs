use std::fmt::Write as _;

use agent_land_core::tool::FnTool;
use agent_land_core::{Agent, AgentBuilder, DepsType, ModelClient, OutputType};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::helpers::title_case;
use crate::tools::WebSearch;

const INSTRUCTIONS: &str = "\
You are a research assistant specialized in gathering and analyzing information.
Use available tools to search for relevant information and provide comprehensive,
well-sourced answers. Always cite your sources and indicate the confidence level
of your findings.";

#[derive(Deserialize, JsonSchema)]
struct SearchInformation {
    #[schemars(description = "What to search for.")]
    query: String,
}

#[derive(Deserialize, JsonSchema)]
struct AnalyzeSources {
    #[schemars(description = "URLs or names of the sources to evaluate.")]
    sources: Vec<String>,
}

#[derive(Deserialize, JsonSchema)]
struct SynthesizeFindings {
    #[schemars(description = "The findings to combine.")]
    findings: Vec<String>,
}

/// An agent that searches, weighs sources and reports findings.
pub fn research_agent(model: &str, client: ModelClient) -> Agent {
    let search = WebSearch::default();
    AgentBuilder::new("research_agent", model, client)
        .with_instructions(INSTRUCTIONS)
        .with_deps_type(DepsType::Research)
        .with_output_type(OutputType::ResearchResult)
        .with_tool(FnTool::new(
            "search_information",
            "Search for information using available sources",
            move |ctx, input: SearchInformation| {
                let search = search.clone();
                async move {
                    let settings = ctx.with_deps(|deps| {
                        deps.research()
                            .filter(|research| research.search_enabled)
                            .map(|research| research.max_results)
                    });
                    let Some(max_results) = settings else {
                        return Ok("Search is not enabled for this session".to_owned());
                    };
                    let results = search.search(&input.query, max_results).await;
                    let mut text = format!(
                        "Found {} results for '{}':\n",
                        results.len(),
                        input.query
                    );
                    for result in &results {
                        _ = writeln!(text, "- {} ({})", result.title, result.url);
                    }
                    Ok(text)
                }
            },
        ))
        .with_tool(FnTool::new(
            "analyze_sources",
            "Analyze and evaluate the credibility of sources",
            |_ctx, input: AnalyzeSources| async move {
                Ok(analyze_sources(&input.sources))
            },
        ))
        .with_tool(FnTool::new(
            "synthesize_findings",
            "Synthesize multiple findings into a coherent summary",
            |_ctx, input: SynthesizeFindings| async move {
                Ok(synthesize_findings(&input.findings))
            },
        ))
        .build()
}

fn analyze_sources(sources: &[String]) -> String {
    if sources.is_empty() {
        return "No sources provided for analysis".to_owned();
    }

    let mut analysis = format!("Analyzed {} sources:\n", sources.len());
    for (i, source) in sources.iter().enumerate() {
        let credibility = if source.contains("edu") || source.contains("gov") {
            "High"
        } else {
            "Medium"
        };
        _ = writeln!(analysis, "{}. {source} - Credibility: {credibility}", i + 1);
    }
    analysis
}

fn synthesize_findings(findings: &[String]) -> String {
    if findings.is_empty() {
        return "No findings to synthesize".to_owned();
    }

    // Themes keep the order in which they first appear.
    let mut themes: Vec<(&str, Vec<&str>)> = vec![];
    for finding in findings.iter().map(String::as_str) {
        let theme = finding.split_whitespace().next().unwrap_or("General");
        match themes.iter_mut().find(|(name, _)| *name == theme) {
            Some((_, items)) => items.push(finding),
            None => themes.push((theme, vec![finding])),
        }
    }

    let mut summary = format!("Synthesis of {} findings:\n", findings.len());
    for (theme, items) in themes {
        _ = writeln!(summary, "\n{} theme:", title_case(theme));
        for item in items {
            _ = writeln!(summary, "- {item}");
        }
    }
    summary
}
