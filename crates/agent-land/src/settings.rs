//! Settings read from `.env` and the process environment.

use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::PathBuf;

const DEFAULT_MODEL: &str = "openai:gpt-4o";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_LOG_FILE: &str = "logger.txt";
const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Application settings.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// Key for the OpenAI API.
    pub openai_api_key: Option<String>,
    /// Key for the Anthropic API.
    pub anthropic_api_key: Option<String>,
    /// Overrides the OpenAI endpoint, for compatible servers.
    pub openai_base_url: Option<String>,
    /// The model used by the built-in agents.
    pub default_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// File that receives detailed logs, `None` to disable.
    pub log_file: Option<PathBuf>,
    /// Enables debug output.
    pub debug: bool,
    /// Root of every generated file.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base_url: None,
            default_model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            debug: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Settings {
    /// Loads `.env` if present, then reads the environment.
    pub fn load() -> Result<Self, SettingsError> {
        // A missing `.env` file is fine.
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    ///
    /// Empty values count as unset, except for `LOG_FILE` where an empty
    /// value disables the log file.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut settings = Self::default();

        settings.openai_api_key = get("OPENAI_API_KEY");
        settings.anthropic_api_key = get("ANTHROPIC_API_KEY");
        settings.openai_base_url = get("OPENAI_BASE_URL");
        if let Some(model) = get("DEFAULT_MODEL") {
            settings.default_model = model;
        }
        if let Some(value) = get("TEMPERATURE") {
            settings.temperature = value.trim().parse().map_err(|_| {
                SettingsError::new("TEMPERATURE", &value, "expected a number")
            })?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            settings.log_level = level;
        }
        if let Some(file) = lookup("LOG_FILE") {
            settings.log_file =
                (!file.is_empty()).then(|| PathBuf::from(file));
        }
        if let Some(value) = get("DEBUG") {
            settings.debug = parse_bool(&value).ok_or_else(|| {
                SettingsError::new("DEBUG", &value, "expected a boolean")
            })?;
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(dir);
        }

        Ok(settings)
    }

    /// Where created agent configurations are saved.
    #[inline]
    pub fn agents_dir(&self) -> PathBuf {
        self.output_dir.join("agents")
    }

    /// Where conversations are exported.
    #[inline]
    pub fn conversations_dir(&self) -> PathBuf {
        self.output_dir.join("conversations")
    }

    /// Where observations are saved.
    #[inline]
    pub fn observations_dir(&self) -> PathBuf {
        self.output_dir.join("observations")
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Settings")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("debug", &self.debug)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A malformed setting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsError {
    key: &'static str,
    value: String,
    reason: &'static str,
}

impl SettingsError {
    fn new(key: &'static str, value: &str, reason: &'static str) -> Self {
        Self {
            key,
            value: value.to_owned(),
            reason,
        }
    }

    /// Returns the offending key.
    #[inline]
    pub fn key(&self) -> &str {
        self.key
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} `{}`: {}", self.key, self.value, self.reason)
    }
}

impl StdError for SettingsError {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_model, "openai:gpt-4o");
        assert_eq!(settings.log_file, Some(PathBuf::from("logger.txt")));
        assert_eq!(
            settings.agents_dir(),
            PathBuf::from("generated").join("agents")
        );
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test-1234567890"),
            ("DEFAULT_MODEL", "echo:local"),
            ("TEMPERATURE", "0.2"),
            ("LOG_FILE", ""),
            ("DEBUG", "true"),
            ("OUTPUT_DIR", "/tmp/out"),
        ]))
        .unwrap();
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test-1234567890"));
        assert_eq!(settings.default_model, "echo:local");
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.log_file, None);
        assert!(settings.debug);
        assert_eq!(settings.observations_dir(), PathBuf::from("/tmp/out/observations"));
        assert!(!format!("{settings:?}").contains("sk-test"));
    }

    #[test]
    fn test_malformed_values() {
        let err =
            Settings::from_lookup(lookup(&[("TEMPERATURE", "warm")])).unwrap_err();
        assert_eq!(err.key(), "TEMPERATURE");
        assert_eq!(err.to_string(), "invalid TEMPERATURE `warm`: expected a number");

        let err = Settings::from_lookup(lookup(&[("DEBUG", "maybe")])).unwrap_err();
        assert_eq!(err.key(), "DEBUG");
    }
}
