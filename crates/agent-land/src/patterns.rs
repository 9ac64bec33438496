//! Multi-agent patterns: chaining agents and fanning out independent runs.

use std::fmt::Write as _;

use agent_land_core::deps::{DataDependencies, ResearchDependencies};
use agent_land_core::{
    Agent, AgentOutput, Dependencies, DependencyKind, Error, ParallelTask, RunResult,
    TaskOutcome, run_parallel,
};
use serde_json::json;

use crate::helpers::{generate_session_id, truncate_text};

const PREVIEW_LIMIT: usize = 100;

/// The runs of a research-then-analysis chain.
#[derive(Clone, Debug)]
pub struct ResearchChain {
    /// The researched topic.
    pub topic: String,
    /// Session shared by every step.
    pub session_id: String,
    /// The research step.
    pub research: RunResult,
    /// The analysis step, fed with the research output.
    pub analysis: RunResult,
}

impl ResearchChain {
    /// Findings of the research step. A plain-text answer counts as one
    /// finding.
    pub fn findings(&self) -> Vec<String> {
        match &self.research.output {
            AgentOutput::Research(research) => research.findings.clone(),
            other => vec![other.render()],
        }
    }

    /// Insights of the analysis step.
    pub fn insights(&self) -> Vec<String> {
        match &self.analysis.output {
            AgentOutput::Analysis(analysis) => analysis.insights.clone(),
            _ => vec![],
        }
    }
}

/// Researches `topic`, then has `analyst` analyze what was found.
///
/// Both runs share a session id. The research output goes to the analyst as
/// JSON with the topic, findings and sources.
pub async fn chain_research_analysis(
    research: &Agent,
    analyst: &Agent,
    topic: &str,
) -> Result<ResearchChain, Error> {
    let session_id = generate_session_id();
    info!("🔗 chaining research and analysis on: {topic}");

    let research_deps = Dependencies::new(DependencyKind::Research(ResearchDependencies {
        search_enabled: true,
        ..Default::default()
    }))
    .with_session_id(&session_id);
    let research_result = research
        .run(
            &format!("Research current trends and developments in {topic}"),
            Some(research_deps),
        )
        .await?;

    let (findings, sources) = match &research_result.output {
        AgentOutput::Research(result) => (result.findings.clone(), result.sources.clone()),
        other => (vec![other.render()], vec![]),
    };
    debug!("research produced {} findings", findings.len());
    let research_data = json!({
        "topic": topic,
        "findings": findings,
        "sources": sources,
    });
    let research_data = serde_json::to_string_pretty(&research_data)
        .unwrap_or_else(|_| research_data.to_string());

    let analysis_prompt = format!(
        "Analyze the following research data and provide strategic insights:\n\
         {research_data}\n\n\
         Focus on identifying patterns, opportunities, and actionable recommendations."
    );
    let data_deps = Dependencies::new(DependencyKind::Data(DataDependencies::default()))
        .with_session_id(&session_id);
    let analysis = analyst.run(&analysis_prompt, Some(data_deps)).await?;

    Ok(ResearchChain {
        topic: topic.to_owned(),
        session_id,
        research: research_result,
        analysis,
    })
}

/// Has `chat` summarize a finished chain for decision makers.
pub async fn summarize_chain(chat: &Agent, chain: &ResearchChain) -> Result<RunResult, Error> {
    let findings = chain.findings();
    let insights = chain.insights();
    let analysis = match &chain.analysis.output {
        AgentOutput::Analysis(analysis) => analysis.analysis.clone(),
        other => other.render(),
    };
    let top_insights = if insights.is_empty() {
        "None".to_owned()
    } else {
        insights[..insights.len().min(2)].join(", ")
    };

    let prompt = format!(
        "Create a comprehensive summary based on this research and analysis:\n\n\
         Research Topic: {}\n\
         Key Findings: {}\n\
         Analysis: {analysis}\n\
         Top Insights: {top_insights}\n\n\
         Provide a clear, actionable summary for business decision-makers.",
        chain.topic,
        findings[..findings.len().min(3)].join(", "),
    );
    let deps = chat.deps_type().default_deps().with_session_id(&chain.session_id);
    chat.run(&prompt, Some(deps)).await
}

/// Runs every `(agent, prompt)` pair at once, each with the default
/// dependencies of its agent, labelled by agent name.
pub async fn fan_out<'a, I>(runs: I) -> Vec<TaskOutcome>
where
    I: IntoIterator<Item = (&'a Agent, &'a str)>,
{
    let tasks = runs
        .into_iter()
        .map(|(agent, prompt)| {
            ParallelTask::new(agent.name(), agent, prompt)
                .with_deps(agent.deps_type().default_deps())
        })
        .collect();
    run_parallel(tasks).await
}

/// Renders one line per outcome: a preview of the answer, or the error.
pub fn describe_outcomes(outcomes: &[TaskOutcome]) -> String {
    let mut text = "📊 Parallel Execution Results:".to_owned();
    for outcome in outcomes {
        match &outcome.result {
            Ok(result) => _ = write!(
                text,
                "\n✅ {}: {}",
                outcome.label,
                truncate_text(&result.output.render(), PREVIEW_LIMIT, "...")
            ),
            Err(err) => _ = write!(text, "\n❌ {}: Failed - {err}", outcome.label),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use agent_land_core::ModelClient;
    use agent_land_test_model::{PresetResponse, TestModelProvider};

    use super::*;
    use crate::agents::{data_analyst, research_agent, simple_chat};
    use crate::providers::UnavailableProvider;

    #[tokio::test]
    async fn test_chain_feeds_research_into_analysis() {
        let research_provider =
            TestModelProvider::with_responses([PresetResponse::text("Solar capacity doubled")]);
        let analyst_provider =
            TestModelProvider::with_responses([PresetResponse::text("Strong momentum")]);
        let research = research_agent("test:research", ModelClient::new(research_provider));
        let analyst = data_analyst("test:analyst", ModelClient::new(analyst_provider.clone()));

        let chain = chain_research_analysis(&research, &analyst, "solar power")
            .await
            .unwrap();
        assert_eq!(chain.findings(), ["Solar capacity doubled"]);
        assert_eq!(chain.analysis.output.render(), "Analysis: Strong momentum");
        assert_eq!(chain.research.deps.session_id.as_ref(), Some(&chain.session_id));

        let requests = analyst_provider.requests();
        let prompt = requests[0].last_user_text().unwrap();
        assert!(prompt.contains("\"topic\": \"solar power\""));
        assert!(prompt.contains("Solar capacity doubled"));

        let chat_provider = TestModelProvider::with_responses([PresetResponse::text("Go solar.")]);
        let chat = simple_chat("test:chat", ModelClient::new(chat_provider.clone()));
        let summary = summarize_chain(&chat, &chain).await.unwrap();
        assert_eq!(summary.output.render(), "Go solar.");
        let requests = chat_provider.requests();
        let prompt = requests[0].last_user_text().unwrap();
        assert!(prompt.contains("Research Topic: solar power\n"));
        assert!(prompt.contains("Top Insights: None\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_reports_failures() {
        let ok = simple_chat(
            "test:chat",
            ModelClient::new(TestModelProvider::with_responses([PresetResponse::text(
                "Renewables are cheap",
            )])),
        );
        let broken = research_agent(
            "test:broken",
            ModelClient::new(UnavailableProvider::new("offline")),
        );

        let outcomes = fan_out([(&ok, "benefits?"), (&broken, "adoption?")]).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());

        let text = describe_outcomes(&outcomes);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "📊 Parallel Execution Results:");
        assert_eq!(lines[1], "✅ simple_chat: Renewables are cheap");
        assert!(lines[2].starts_with("❌ research_agent: Failed - "));
    }
}
