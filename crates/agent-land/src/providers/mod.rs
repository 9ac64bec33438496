//! Maps model identifiers to model clients.

mod echo;
mod unavailable;

use std::error::Error as StdError;
use std::fmt::{self, Display};

use agent_land_core::ModelClient;
use agent_land_model::{ErrorKind, ModelId, ModelProviderError};
use agent_land_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

pub use echo::EchoProvider;
pub use unavailable::UnavailableProvider;

use crate::settings::Settings;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Creates model clients for model identifiers like `openai:gpt-4o`.
///
/// Misconfiguration never fails here. The client is still created, and
/// its requests fail with [`ErrorKind::Unavailable`], so the playground
/// can start without any API key.
#[derive(Clone, Debug)]
pub struct ModelFactory {
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    anthropic_api_key: Option<String>,
    temperature: f32,
}

impl ModelFactory {
    /// Creates a factory from the settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            openai_api_key: settings.openai_api_key.clone(),
            openai_base_url: settings.openai_base_url.clone(),
            anthropic_api_key: settings.anthropic_api_key.clone(),
            temperature: settings.temperature,
        }
    }

    /// Returns a client for the model.
    pub fn client(&self, model: &str) -> ModelClient {
        let id = ModelId::parse(model);
        match id.provider.as_str() {
            "openai" | "unknown" => match &self.openai_api_key {
                Some(key) => {
                    let mut config = OpenAIConfigBuilder::with_api_key(key)
                        .with_model(&id.name)
                        .with_temperature(self.temperature);
                    if let Some(base_url) = &self.openai_base_url {
                        config = config.with_base_url(base_url);
                    }
                    ModelClient::new(OpenAIProvider::new(config.build()))
                }
                None => missing_key(model, "OPENAI_API_KEY"),
            },
            "anthropic" => match &self.anthropic_api_key {
                Some(key) => {
                    let config = OpenAIConfigBuilder::with_api_key(key)
                        .with_model(&id.name)
                        .with_base_url(ANTHROPIC_BASE_URL)
                        .with_temperature(self.temperature)
                        .build();
                    ModelClient::new(OpenAIProvider::new(config))
                }
                None => missing_key(model, "ANTHROPIC_API_KEY"),
            },
            "echo" => ModelClient::new(EchoProvider::new()),
            provider => {
                warn!("unsupported model provider `{provider}` for {model}");
                ModelClient::new(UnavailableProvider::new(format!(
                    "unsupported model provider `{provider}`"
                )))
            }
        }
    }
}

fn missing_key(model: &str, key: &str) -> ModelClient {
    warn!("{key} is not set, requests to {model} will fail");
    ModelClient::new(UnavailableProvider::new(format!("{key} is not set")))
}

/// The error of the providers in this module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderError {
    message: String,
    kind: ErrorKind,
}

impl ProviderError {
    pub(crate) fn new<S: Into<String>>(message: S, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for ProviderError {}

impl ModelProviderError for ProviderError {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}
