//! Core logic including the agent loop, tools, dependencies, structured
//! outputs, retry and parallel runs.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
pub mod deps;
mod error;
mod model_client;
pub mod output;
mod parallel;
pub mod retry;
pub mod tool;

pub use agent::{Agent, AgentBuilder, AgentInfo, RunResult};
pub use deps::{Dependencies, DependencyKind, DepsType};
pub use error::Error;
pub use model_client::{ModelClient, ModelClientResponse};
pub use output::{AgentOutput, FINAL_RESULT_TOOL, OutputType};
pub use parallel::{ParallelTask, TaskOutcome, run_parallel};
pub use retry::RetryConfig;
