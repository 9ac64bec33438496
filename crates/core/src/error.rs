use std::error::Error as StdError;
use std::fmt::{self, Display};

use agent_land_model::{ErrorKind, ModelProviderError};

/// Errors that end an agent run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The model provider failed, after retries if any were configured.
    Model {
        /// The kind reported by the provider.
        kind: ErrorKind,
        /// A human-readable message from the provider.
        message: String,
    },
    /// The model kept calling tools past the step limit.
    StepLimitExceeded(usize),
    /// A spawned run panicked or was cancelled.
    TaskFailed(String),
}

impl Error {
    /// Returns the provider error kind, if this is a model error.
    #[inline]
    pub fn model_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Model { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Model { kind, message } => write!(f, "{kind}: {message}"),
            Error::StepLimitExceeded(steps) => {
                write!(f, "exceeded the limit of {steps} model steps")
            }
            Error::TaskFailed(reason) => write!(f, "task failed: {reason}"),
        }
    }
}

impl StdError for Error {}

impl From<Box<dyn ModelProviderError>> for Error {
    fn from(err: Box<dyn ModelProviderError>) -> Self {
        Error::Model {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
