use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::error::Error as StdError;
use std::fmt::{self, Display, Write as _};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use agent_land_core::FINAL_RESULT_TOOL;
use regex::Regex;
use tokio::fs;

use super::config::AgentConfig;
use super::templates::list_templates;
use crate::helpers::truncate_chars;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap()
});

/// Returns `true` if `name` can name an agent or a tool.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Returns `true` if `name` can name a custom tool. `final_result` is taken
/// by structured-output agents.
pub fn is_valid_tool_name(name: &str) -> bool {
    is_valid_name(name) && name != FINAL_RESULT_TOOL
}

/// Keeps custom agent configurations in memory and as JSON files in a
/// directory.
#[derive(Debug)]
pub struct AgentStore {
    dir: PathBuf,
    agents: BTreeMap<String, AgentConfig>,
}

impl AgentStore {
    /// Creates an empty store saving to `dir`. Nothing is read yet, see
    /// [`AgentStore::load_all`].
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            agents: BTreeMap::new(),
        }
    }

    /// Returns the directory configurations are saved in.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file a configuration is saved to.
    pub fn config_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Returns the configuration of a known agent.
    pub fn get(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.get(name)
    }

    /// Returns `true` if the agent is known.
    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Returns the known configurations, sorted by name.
    pub fn configs(&self) -> impl Iterator<Item = &AgentConfig> {
        self.agents.values()
    }

    /// Validates, saves and remembers a new configuration.
    pub async fn create(&mut self, config: AgentConfig) -> Result<PathBuf, StoreError> {
        if !is_valid_name(&config.name) {
            return Err(StoreError::InvalidName(config.name));
        }
        if self.contains(&config.name) {
            return Err(StoreError::AlreadyExists(config.name));
        }
        if let Some(tool) = config.tools.iter().find(|t| !is_valid_tool_name(&t.name)) {
            return Err(StoreError::InvalidToolName(tool.name.clone()));
        }

        let path = self.save(&config).await?;
        self.agents.insert(config.name.clone(), config);
        Ok(path)
    }

    async fn save(&self, config: &AgentConfig) -> Result<PathBuf, StoreError> {
        let path = self.config_path(&config.name);
        let text = serde_json::to_string_pretty(config).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::io(&self.dir, source))?;
        fs::write(&path, text)
            .await
            .map_err(|source| StoreError::io(&path, source))?;
        info!("saved agent config to {}", path.display());
        Ok(path)
    }

    /// Reads a saved configuration and remembers it.
    pub async fn load(&mut self, name: &str) -> Result<&AgentConfig, StoreError> {
        let path = self.config_path(name);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_owned()));
            }
            Err(source) => return Err(StoreError::io(&path, source)),
        };
        let config: AgentConfig = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        if config.name != name {
            return Err(StoreError::NameMismatch {
                path,
                name: config.name,
            });
        }
        info!("loaded agent {name} from config");
        Ok(match self.agents.entry(name.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry.insert(config);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(config),
        })
    }

    /// Loads every configuration in the directory and returns the names
    /// loaded. Files that fail to load are logged and skipped.
    pub async fn load_all(&mut self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(source) => return Err(StoreError::io(&self.dir, source)),
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| StoreError::io(&self.dir, source))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match self.load(name).await {
                Ok(_) => names.push(name.to_owned()),
                Err(err) => error!("failed to load agent {name}: {err}"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Forgets an agent and removes its file. Returns `false` if the agent
    /// was not known.
    pub async fn delete(&mut self, name: &str) -> Result<bool, StoreError> {
        if self.agents.remove(name).is_none() {
            return Ok(false);
        }

        let path = self.config_path(name);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(StoreError::io(&path, source)),
        }
        info!("deleted agent {name}");
        Ok(true)
    }

    /// Describes every known agent.
    pub fn list_created(&self) -> String {
        if self.agents.is_empty() {
            return "No custom agents created yet.".to_owned();
        }

        let mut text = "🤖 Created Agents:\n".to_owned();
        for (name, config) in &self.agents {
            _ = write!(
                text,
                "\n📋 {name}\n   \
                 Model: {}\n   \
                 Dependencies: {}\n   \
                 Tools: {} tools\n   \
                 Created: {}\n",
                config.model,
                config.deps_type,
                config.tools.len(),
                config.created_display(),
            );
        }
        text
    }

    /// Describes the templates new agents can start from.
    #[inline]
    pub fn list_templates(&self) -> String {
        list_templates()
    }

    /// Describes one agent in detail.
    pub fn agent_info(&self, name: &str) -> Option<String> {
        let config = self.agents.get(name)?;
        let mut text = format!(
            "🤖 Agent: {name}\n\
             {}\n\
             Instructions: {}...\n\
             Model: {}\n\
             Dependencies: {}\n\
             Output Type: {}\n\
             Created: {}\n\
             Tools: {}",
            "=".repeat(40),
            truncate_chars(&config.instructions, 100),
            config.model,
            config.deps_type,
            config.output_type,
            config.created_display(),
            config.tools.len(),
        );
        if !config.tools.is_empty() {
            text.push_str("\n\nTools:");
            for tool in &config.tools {
                _ = write!(text, "\n  - {}: {}", tool.name, tool.description);
            }
        }
        Some(text)
    }
}

/// Errors from [`AgentStore`].
#[derive(Debug)]
pub enum StoreError {
    /// The name does not start with a letter or has characters other than
    /// letters, digits and underscores.
    InvalidName(String),
    /// A tool name is malformed or reserved.
    InvalidToolName(String),
    /// An agent with this name already exists.
    AlreadyExists(String),
    /// No configuration is saved under this name.
    NotFound(String),
    /// A saved configuration names a different agent than its file.
    NameMismatch {
        /// The file.
        path: PathBuf,
        /// The name inside the file.
        name: String,
    },
    /// A file could not be read or written.
    Io {
        /// The file or directory.
        path: PathBuf,
        /// The cause.
        source: io::Error,
    },
    /// A file does not hold a valid configuration.
    Json {
        /// The file.
        path: PathBuf,
        /// The cause.
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_owned(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidName(name) => write!(
                f,
                "invalid agent name '{name}', use letters, numbers, and underscores only"
            ),
            StoreError::InvalidToolName(name) => write!(f, "invalid tool name '{name}'"),
            StoreError::AlreadyExists(name) => write!(f, "agent '{name}' already exists"),
            StoreError::NotFound(name) => write!(f, "no saved config for agent '{name}'"),
            StoreError::NameMismatch { path, name } => {
                write!(f, "{}: config is for agent '{name}'", path.display())
            }
            StoreError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            StoreError::Json { path, source } => {
                write!(f, "{}: invalid agent config: {source}", path.display())
            }
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use agent_land_core::DepsType;

    use super::*;
    use crate::builder::ToolConfig;

    fn sample(name: &str) -> AgentConfig {
        AgentConfig::new(name, "Count things carefully.")
            .with_deps_type(DepsType::Research)
            .with_tool(ToolConfig::predefined("counter").unwrap())
    }

    #[test]
    fn test_names() {
        assert!(is_valid_name("my_helper2"));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("with-dash"));
        assert!(!is_valid_name(""));
        assert!(is_valid_tool_name("lookup"));
        assert!(!is_valid_tool_name("final_result"));
        assert!(!is_valid_tool_name("no way"));
    }

    #[tokio::test]
    async fn test_reserved_tool_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AgentStore::new(dir.path());
        let config = sample("finisher").with_tool(ToolConfig::new(
            "final_result",
            "custom",
            crate::builder::ToolKind::Echo,
        ));
        assert!(matches!(
            store.create(config).await,
            Err(StoreError::InvalidToolName(name)) if name == "final_result"
        ));
        assert!(!store.contains("finisher"));
        assert!(!store.config_path("finisher").exists());
    }

    #[tokio::test]
    async fn test_create_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AgentStore::new(dir.path().join("agents"));

        let path = store.create(sample("counter_bot")).await.unwrap();
        assert_eq!(path, dir.path().join("agents/counter_bot.json"));
        assert!(path.exists());
        assert!(matches!(
            store.create(sample("counter_bot")).await,
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.create(sample("bad name")).await,
            Err(StoreError::InvalidName(_))
        ));

        let mut reopened = AgentStore::new(store.dir());
        assert_eq!(reopened.load_all().await.unwrap(), ["counter_bot"]);
        assert_eq!(reopened.get("counter_bot"), store.get("counter_bot"));
        assert!(matches!(
            reopened.load("ghost").await,
            Err(StoreError::NotFound(_))
        ));

        assert!(reopened.delete("counter_bot").await.unwrap());
        assert!(!reopened.delete("counter_bot").await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_load_all_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        let mut store = AgentStore::new(dir.path());
        assert!(store.load_all().await.unwrap().is_empty());

        std::fs::write(
            dir.path().join("renamed.json"),
            serde_json::to_string(&sample("original")).unwrap(),
        )
        .unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(matches!(
            store.load("renamed").await,
            Err(StoreError::NameMismatch { name, .. }) if name == "original"
        ));
        assert!(!store.contains("renamed"));
        assert!(!store.contains("original"));

        let mut missing = AgentStore::new(dir.path().join("nope"));
        assert!(missing.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listings() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AgentStore::new(dir.path());
        assert_eq!(store.list_created(), "No custom agents created yet.");
        assert_eq!(store.agent_info("counter_bot"), None);

        store.create(sample("counter_bot")).await.unwrap();
        let listing = store.list_created();
        assert!(listing.starts_with("🤖 Created Agents:\n\n📋 counter_bot\n"));
        assert!(listing.contains("   Dependencies: ResearchDependencies\n"));
        assert!(listing.contains("   Tools: 1 tools\n"));

        let info = store.agent_info("counter_bot").unwrap();
        let lines: Vec<_> = info.lines().collect();
        assert_eq!(lines[0], "🤖 Agent: counter_bot");
        assert_eq!(lines[1], "=".repeat(40));
        assert_eq!(lines[2], "Instructions: Count things carefully....");
        assert_eq!(lines[3], "Model: openai:gpt-4o");
        assert_eq!(lines[5], "Output Type: AgentResult");
        assert_eq!(lines[7], "Tools: 1");
        assert_eq!(
            lines.last().copied(),
            Some("  - counter: A simple counter that can increment, decrement, or reset")
        );
    }
}
