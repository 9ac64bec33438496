//! Recording agent runs for later inspection.
//!
//! An [`AgentObserver`] keeps one [`Observation`] per observed run with the
//! steps and tool calls logged while it was open, saves every finished
//! observation as JSON and summarizes them per agent.

use std::collections::BTreeSet;
use std::fmt::{Display, Write as _};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::time::Instant;

const TOP_TOOLS: usize = 5;
const RECENT_OBSERVATIONS: usize = 5;

/// Where an observation stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationStatus {
    /// Still open.
    Running,
    /// Finished without error.
    Completed,
    /// Finished with an error.
    Error,
}

/// One observed agent run.
#[derive(Clone, Debug, Serialize)]
pub struct Observation {
    /// `obs_<unix millis>`.
    pub id: String,
    /// The observed agent.
    pub agent_name: String,
    /// The prompt the agent was given.
    pub prompt: String,
    /// Whatever the caller wants to keep with the run.
    pub context: Map<String, Value>,
    /// When the observation started, in local time.
    pub start_time: NaiveDateTime,
    /// When the observation started, as unix seconds.
    pub start_timestamp: f64,
    /// The logged steps.
    pub steps: Vec<ObservationStep>,
    /// The logged tool calls.
    pub tools_used: Vec<ToolUsage>,
    /// Timing, filled in when the observation ends.
    pub performance: Option<Performance>,
    /// The status.
    pub status: ObservationStatus,
    /// When the observation ended.
    pub end_time: Option<NaiveDateTime>,
    /// Seconds between start and end.
    pub total_execution_time: Option<f64>,
    /// A rendering of the run result.
    pub result: Option<String>,
    /// The error the run failed with.
    pub error: Option<String>,
    #[serde(skip)]
    started: Option<Instant>,
}

impl Observation {
    fn elapsed(&self) -> f64 {
        self.started
            .map_or(0.0, |started| started.elapsed().as_secs_f64())
    }
}

/// A step logged during an observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObservationStep {
    /// When the step was logged.
    pub timestamp: NaiveDateTime,
    /// Seconds since the observation started.
    pub elapsed: f64,
    /// A short category, e.g. `model` or `tool`.
    #[serde(rename = "type")]
    pub step_type: String,
    /// What happened.
    pub description: String,
    /// Extra data.
    pub data: Value,
}

/// A tool call logged during an observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolUsage {
    /// When the call was logged.
    pub timestamp: NaiveDateTime,
    /// The tool.
    pub tool_name: String,
    /// The arguments.
    pub input_data: Value,
    /// The result.
    pub output_data: Value,
    /// Seconds the call took.
    pub execution_time: f64,
}

/// Timing of a finished observation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Performance {
    /// Seconds between start and end.
    pub total_time: f64,
    /// How many steps were logged.
    pub steps_count: usize,
    /// How many tool calls were logged.
    pub tools_used_count: usize,
    /// `total_time / steps_count`, zero without steps.
    pub avg_step_time: f64,
}

/// Observations of one agent, summarized.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentSummary {
    /// The agent.
    pub agent_name: String,
    /// All observations of the agent.
    pub total_observations: usize,
    /// Observations that completed without error.
    pub completed_observations: usize,
    /// Share of observations that did not complete.
    pub error_rate: f64,
    /// Statistics over completed observations, if any.
    pub performance: Option<PerformanceSummary>,
}

/// Statistics over completed observations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceSummary {
    /// Mean run time in seconds.
    pub avg_execution_time: f64,
    /// Shortest run time in seconds.
    pub min_execution_time: f64,
    /// Longest run time in seconds.
    pub max_execution_time: f64,
    /// Tool calls across all runs.
    pub total_tools_used: usize,
    /// Distinct tools called.
    pub unique_tools: usize,
    /// The most called tools, most called first.
    pub most_used_tools: Vec<ToolCount>,
}

/// How often a tool was called.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolCount {
    /// The tool.
    pub tool: String,
    /// Number of calls.
    pub count: usize,
    /// Seconds spent in all calls.
    pub total_time: f64,
}

/// Records observations of agent runs.
#[derive(Debug)]
pub struct AgentObserver {
    output_dir: PathBuf,
    observations: Vec<Observation>,
    current: Option<usize>,
}

impl AgentObserver {
    /// Creates an observer saving finished observations under `output_dir`.
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            observations: vec![],
            current: None,
        }
    }

    /// Returns the directory observations are saved in.
    #[inline]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns all observations, oldest first.
    #[inline]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Returns the open observation.
    pub fn current(&self) -> Option<&Observation> {
        self.current.map(|idx| &self.observations[idx])
    }

    fn current_mut(&mut self) -> Option<&mut Observation> {
        self.current.map(|idx| &mut self.observations[idx])
    }

    /// Opens a new observation, which becomes the current one.
    pub fn start_observation(
        &mut self,
        agent_name: &str,
        prompt: &str,
        context: Map<String, Value>,
    ) -> &Observation {
        let now = Utc::now();
        let observation = Observation {
            id: format!("obs_{}", now.timestamp_millis()),
            agent_name: agent_name.to_owned(),
            prompt: prompt.to_owned(),
            context,
            start_time: Local::now().naive_local(),
            start_timestamp: now.timestamp_millis() as f64 / 1000.0,
            steps: vec![],
            tools_used: vec![],
            performance: None,
            status: ObservationStatus::Running,
            end_time: None,
            total_execution_time: None,
            result: None,
            error: None,
            started: Some(Instant::now()),
        };
        info!(
            "🔍 started observation {} for agent {agent_name}",
            observation.id
        );

        self.observations.push(observation);
        let idx = self.observations.len() - 1;
        self.current = Some(idx);
        &self.observations[idx]
    }

    /// Logs a step in the current observation. Does nothing when no
    /// observation is open.
    pub fn log_step(&mut self, step_type: &str, description: &str, data: Value) {
        let Some(observation) = self.current_mut() else {
            return;
        };
        let elapsed = observation.elapsed();
        observation.steps.push(ObservationStep {
            timestamp: Local::now().naive_local(),
            elapsed,
            step_type: step_type.to_owned(),
            description: description.to_owned(),
            data,
        });
        debug!("🔍 step [{step_type}]: {description}");
    }

    /// Logs a tool call in the current observation. Does nothing when no
    /// observation is open.
    pub fn log_tool_usage(
        &mut self,
        tool_name: &str,
        input_data: Value,
        output_data: Value,
        execution_time: f64,
    ) {
        let Some(observation) = self.current_mut() else {
            return;
        };
        observation.tools_used.push(ToolUsage {
            timestamp: Local::now().naive_local(),
            tool_name: tool_name.to_owned(),
            input_data,
            output_data,
            execution_time,
        });
        info!("🔧 tool used: {tool_name} ({execution_time:.3}s)");
    }

    /// Closes the current observation and saves it. A failure to save is
    /// logged, the observation is kept in memory either way.
    pub async fn end_observation(
        &mut self,
        result: Option<String>,
        error: Option<String>,
    ) -> Option<&Observation> {
        let idx = self.current.take()?;
        let observation = &mut self.observations[idx];

        let total_time = observation.elapsed();
        let steps_count = observation.steps.len();
        observation.end_time = Some(Local::now().naive_local());
        observation.total_execution_time = Some(total_time);
        observation.status = if error.is_some() {
            ObservationStatus::Error
        } else {
            ObservationStatus::Completed
        };
        observation.result = result;
        observation.error = error;
        observation.performance = Some(Performance {
            total_time,
            steps_count,
            tools_used_count: observation.tools_used.len(),
            avg_step_time: if steps_count == 0 {
                0.0
            } else {
                total_time / steps_count as f64
            },
        });

        let observation = &self.observations[idx];
        if let Err(err) = save_observation(&self.output_dir, observation).await {
            error!("failed to save observation: {err}");
        }
        info!(
            "🔍 completed observation {} ({total_time:.2}s)",
            observation.id
        );
        Some(observation)
    }

    /// Observes `fut`, closing the observation with its error if it fails.
    pub async fn observe<T, E, F>(
        &mut self,
        agent_name: &str,
        prompt: &str,
        context: Map<String, Value>,
        fut: F,
    ) -> Result<T, E>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        self.start_observation(agent_name, prompt, context);
        let result = fut.await;
        let error = result.as_ref().err().map(ToString::to_string);
        self.end_observation(None, error).await;
        result
    }

    /// Summarizes the observations of one agent, `None` if there are none.
    pub fn agent_summary(&self, agent_name: &str) -> Option<AgentSummary> {
        let observations: Vec<_> = self
            .observations
            .iter()
            .filter(|obs| obs.agent_name == agent_name)
            .collect();
        if observations.is_empty() {
            return None;
        }

        let completed: Vec<_> = observations
            .iter()
            .filter(|obs| obs.status == ObservationStatus::Completed)
            .collect();
        let total = observations.len();

        let performance = (!completed.is_empty()).then(|| {
            let times: Vec<f64> = completed
                .iter()
                .map(|obs| obs.total_execution_time.unwrap_or_default())
                .collect();
            let tools: Vec<&ToolUsage> =
                completed.iter().flat_map(|obs| &obs.tools_used).collect();
            PerformanceSummary {
                avg_execution_time: times.iter().sum::<f64>() / times.len() as f64,
                min_execution_time: times.iter().copied().fold(f64::INFINITY, f64::min),
                max_execution_time: times.iter().copied().fold(0.0, f64::max),
                total_tools_used: tools.len(),
                unique_tools: tools
                    .iter()
                    .map(|tool| tool.tool_name.as_str())
                    .collect::<BTreeSet<_>>()
                    .len(),
                most_used_tools: most_used_tools(&tools),
            }
        });

        Some(AgentSummary {
            agent_name: agent_name.to_owned(),
            total_observations: total,
            completed_observations: completed.len(),
            error_rate: (total - completed.len()) as f64 / total as f64,
            performance,
        })
    }

    /// Renders all observations as a report.
    pub fn generate_report(&self) -> String {
        if self.observations.is_empty() {
            return "No observations recorded yet.".to_owned();
        }

        let mut report = format!(
            "🔍 Agent Observation Report\n\
             {}\n\
             Total Observations: {}\n\
             Report Generated: {}\n\n",
            "=".repeat(50),
            self.observations.len(),
            Local::now().naive_local(),
        );

        let mut agents: Vec<&str> = vec![];
        for obs in &self.observations {
            if !agents.contains(&obs.agent_name.as_str()) {
                agents.push(&obs.agent_name);
            }
        }
        for summary in agents.into_iter().filter_map(|agent| self.agent_summary(agent)) {
            _ = write!(
                report,
                "🤖 Agent: {}\n   \
                 Observations: {}\n   \
                 Completed: {}\n   \
                 Error Rate: {:.1}%\n",
                summary.agent_name,
                summary.total_observations,
                summary.completed_observations,
                summary.error_rate * 100.0,
            );
            if let Some(perf) = &summary.performance {
                let top: Vec<_> = perf
                    .most_used_tools
                    .iter()
                    .take(3)
                    .map(|tool| tool.tool.as_str())
                    .collect();
                _ = write!(
                    report,
                    "   Avg Execution Time: {:.2}s\n   \
                     Tools Used: {}\n   \
                     Most Used Tools: {}\n",
                    perf.avg_execution_time,
                    perf.total_tools_used,
                    top.join(", "),
                );
            }
            report.push('\n');
        }

        _ = write!(report, "📊 Recent Observations:\n{}", "-".repeat(30));
        for obs in self.observations.iter().rev().take(RECENT_OBSERVATIONS) {
            let status = match obs.status {
                ObservationStatus::Completed => "✅",
                ObservationStatus::Error => "❌",
                ObservationStatus::Running => "⏳",
            };
            _ = write!(
                report,
                "\n{status} {} | {} | {:.2}s | {} tools",
                obs.id,
                obs.agent_name,
                obs.total_execution_time.unwrap_or_default(),
                obs.tools_used.len(),
            );
        }
        report
    }
}

fn most_used_tools(tools: &[&ToolUsage]) -> Vec<ToolCount> {
    let mut counts: Vec<ToolCount> = vec![];
    for usage in tools {
        match counts.iter_mut().find(|count| count.tool == usage.tool_name) {
            Some(count) => {
                count.count += 1;
                count.total_time += usage.execution_time;
            }
            None => counts.push(ToolCount {
                tool: usage.tool_name.clone(),
                count: 1,
                total_time: usage.execution_time,
            }),
        }
    }
    // Stable, so ties keep first-use order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_TOOLS);
    counts
}

async fn save_observation(dir: &Path, observation: &Observation) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(format!("observation_{}.json", observation.id));
    let text = serde_json::to_string_pretty(observation)?;
    fs::write(&path, text).await?;
    debug!("💾 saved observation to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_observation_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut observer = AgentObserver::new(dir.path());

        observer.log_step("ignored", "no observation open", Value::Null);
        assert!(observer.observations().is_empty());

        let mut context = Map::new();
        context.insert("conversation_id".to_owned(), json!("conv_1"));
        let id = observer.start_observation("chat", "hello", context).id.clone();
        assert!(id.starts_with("obs_"));

        tokio::time::advance(Duration::from_millis(500)).await;
        observer.log_step("model", "asked the model", json!({"step": 1}));
        observer.log_tool_usage("echo_tool", json!({"message": "hi"}), json!("Echo: hi"), 0.25);
        tokio::time::advance(Duration::from_millis(500)).await;

        let observation = observer
            .end_observation(Some("hi there".to_owned()), None)
            .await
            .unwrap();
        assert_eq!(observation.status, ObservationStatus::Completed);
        assert_eq!(observation.steps[0].elapsed, 0.5);
        let performance = observation.performance.unwrap();
        assert_eq!(performance.total_time, 1.0);
        assert_eq!(performance.steps_count, 1);
        assert_eq!(performance.avg_step_time, 1.0);
        assert!(observer.current().is_none());

        let saved = std::fs::read_to_string(dir.path().join(format!("observation_{id}.json")))
            .unwrap();
        let saved: Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved["status"], "completed");
        assert_eq!(saved["steps"][0]["type"], "model");
        assert_eq!(saved["context"]["conversation_id"], "conv_1");
        assert_eq!(saved["tools_used"][0]["output_data"], "Echo: hi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut observer = AgentObserver::new(dir.path());

        let ok: Result<u32, String> = observer
            .observe("research", "q1", Map::new(), async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(1)
            })
            .await;
        assert_eq!(ok, Ok(1));

        observer.start_observation("research", "q2", Map::new());
        observer.log_tool_usage("search", Value::Null, Value::Null, 0.1);
        observer.log_tool_usage("analyze", Value::Null, Value::Null, 0.1);
        observer.log_tool_usage("search", Value::Null, Value::Null, 0.2);
        tokio::time::advance(Duration::from_secs(4)).await;
        observer.end_observation(None, None).await;

        let err: Result<u32, String> = observer
            .observe("research", "q3", Map::new(), async { Err("boom".to_owned()) })
            .await;
        assert!(err.is_err());

        let summary = observer.agent_summary("research").unwrap();
        assert_eq!(summary.total_observations, 3);
        assert_eq!(summary.completed_observations, 2);
        assert!((summary.error_rate - 1.0 / 3.0).abs() < 1e-9);
        let perf = summary.performance.unwrap();
        assert_eq!(perf.avg_execution_time, 3.0);
        assert_eq!(perf.min_execution_time, 2.0);
        assert_eq!(perf.max_execution_time, 4.0);
        assert_eq!(perf.total_tools_used, 3);
        assert_eq!(perf.unique_tools, 2);
        assert_eq!(perf.most_used_tools[0].tool, "search");
        assert_eq!(perf.most_used_tools[0].count, 2);
        assert!(observer.agent_summary("chat").is_none());

        let report = observer.generate_report();
        assert!(report.starts_with("🔍 Agent Observation Report\n"));
        assert!(report.contains("Total Observations: 3\n"));
        assert!(report.contains("   Error Rate: 33.3%\n"));
        assert!(report.contains("   Most Used Tools: search, analyze\n"));
        assert!(report.contains("📊 Recent Observations:\n------------------------------\n❌ "));
        assert!(report.contains(" | research | 2.00s | 0 tools"));
    }

    #[test]
    fn test_empty_report() {
        let observer = AgentObserver::new("unused");
        assert_eq!(observer.generate_report(), "No observations recorded yet.");
    }
}
