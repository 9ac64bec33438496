//! Running several agents at once.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::agent::{Agent, RunResult};
use crate::deps::Dependencies;
use crate::error::Error;

/// One independent run submitted to [`run_parallel`].
#[derive(Clone, Debug)]
pub struct ParallelTask {
    /// A label to tell the outcomes apart.
    pub label: String,
    /// The agent to run.
    pub agent: Agent,
    /// The prompt to run it on.
    pub prompt: String,
    /// Dependencies of the run.
    pub deps: Option<Dependencies>,
}

impl ParallelTask {
    /// Creates a task without dependencies.
    pub fn new<S1: Into<String>, S2: Into<String>>(
        label: S1,
        agent: &Agent,
        prompt: S2,
    ) -> Self {
        Self {
            label: label.into(),
            agent: agent.clone(),
            prompt: prompt.into(),
            deps: None,
        }
    }

    /// Sets the dependencies of the run.
    #[inline]
    pub fn with_deps(mut self, deps: Dependencies) -> Self {
        self.deps = Some(deps);
        self
    }
}

/// The outcome of one parallel task.
#[derive(Debug)]
pub struct TaskOutcome {
    /// The task label.
    pub label: String,
    /// The run result, or the error that ended it.
    pub result: Result<RunResult, Error>,
    /// Wall time of the task.
    pub elapsed: Duration,
}

/// Runs every task on its own tokio task and waits for all of them.
///
/// Outcomes are returned in submission order. A failed task does not affect
/// the others.
pub async fn run_parallel(tasks: Vec<ParallelTask>) -> Vec<TaskOutcome> {
    info!("running {} tasks in parallel", tasks.len());
    let started = Instant::now();
    let handles: Vec<(String, JoinHandle<_>)> = tasks
        .into_iter()
        .map(|task| {
            let handle = tokio::spawn(async move {
                let task_started = Instant::now();
                let result = task.agent.run(&task.prompt, task.deps).await;
                (result, task_started.elapsed())
            });
            (task.label, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (label, handle) in handles {
        let outcome = match handle.await {
            Ok((result, elapsed)) => TaskOutcome {
                label,
                result,
                elapsed,
            },
            Err(err) => {
                error!("task {label} did not finish: {err}");
                TaskOutcome {
                    label,
                    result: Err(Error::TaskFailed(err.to_string())),
                    elapsed: started.elapsed(),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}
