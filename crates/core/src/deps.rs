//! Dependencies passed alongside a prompt to parameterize a run.
//!
//! Every agent declares a [`DepsType`]. When a run is started without
//! dependencies, the defaults of that type are used instead.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Names the flavor of dependencies an agent expects.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum DepsType {
    /// `BaseDependencies`.
    #[default]
    Base,
    /// `ChatDependencies`.
    Chat,
    /// `ResearchDependencies`.
    Research,
    /// `DataDependencies`.
    Data,
    /// `ToolDependencies`.
    Tool,
}

impl DepsType {
    /// All dependency types, in the order they are offered to users.
    pub const ALL: [DepsType; 5] = [
        DepsType::Base,
        DepsType::Chat,
        DepsType::Research,
        DepsType::Data,
        DepsType::Tool,
    ];

    /// Returns the canonical name, e.g. `ChatDependencies`.
    pub fn name(self) -> &'static str {
        match self {
            DepsType::Base => "BaseDependencies",
            DepsType::Chat => "ChatDependencies",
            DepsType::Research => "ResearchDependencies",
            DepsType::Data => "DataDependencies",
            DepsType::Tool => "ToolDependencies",
        }
    }

    /// Parses a name leniently. Unknown names map to [`DepsType::Base`].
    pub fn parse(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name() == name)
            .unwrap_or_default()
    }

    /// Creates the default dependencies of this type.
    pub fn default_deps(self) -> Dependencies {
        let kind = match self {
            DepsType::Base => DependencyKind::Base,
            DepsType::Chat => DependencyKind::Chat(Default::default()),
            DepsType::Research => DependencyKind::Research(Default::default()),
            DepsType::Data => DependencyKind::Data(Default::default()),
            DepsType::Tool => DependencyKind::Tool(Default::default()),
        };
        Dependencies::new(kind)
    }
}

impl Display for DepsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DepsType {
    type Err = Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for DepsType {
    #[inline]
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<DepsType> for String {
    #[inline]
    fn from(value: DepsType) -> Self {
        value.name().to_owned()
    }
}

/// The dependencies object of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependencies {
    /// The user on whose behalf the agent runs.
    pub user_id: Option<String>,
    /// The session the run belongs to.
    pub session_id: Option<String>,
    /// Free-form context values.
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Fields specific to the dependency type.
    #[serde(default)]
    pub kind: DependencyKind,
}

impl Dependencies {
    /// Creates dependencies of the given kind with no user or session.
    #[inline]
    pub fn new(kind: DependencyKind) -> Self {
        Self {
            user_id: None,
            session_id: None,
            context: Map::new(),
            kind,
        }
    }

    /// Sets the user id.
    #[inline]
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the session id.
    #[inline]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Adds a context value.
    #[inline]
    pub fn with_context<K: Into<String>, V: Into<Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Returns the type of these dependencies.
    pub fn deps_type(&self) -> DepsType {
        match self.kind {
            DependencyKind::Base => DepsType::Base,
            DependencyKind::Chat(_) => DepsType::Chat,
            DependencyKind::Research(_) => DepsType::Research,
            DependencyKind::Data(_) => DepsType::Data,
            DependencyKind::Tool(_) => DepsType::Tool,
        }
    }

    /// Returns the chat fields, if these are chat dependencies.
    pub fn chat(&self) -> Option<&ChatDependencies> {
        match &self.kind {
            DependencyKind::Chat(chat) => Some(chat),
            _ => None,
        }
    }

    /// Mutable version of [`Dependencies::chat`].
    pub fn chat_mut(&mut self) -> Option<&mut ChatDependencies> {
        match &mut self.kind {
            DependencyKind::Chat(chat) => Some(chat),
            _ => None,
        }
    }

    /// Returns the research fields, if these are research dependencies.
    pub fn research(&self) -> Option<&ResearchDependencies> {
        match &self.kind {
            DependencyKind::Research(research) => Some(research),
            _ => None,
        }
    }

    /// Returns the data fields, if these are data dependencies.
    pub fn data(&self) -> Option<&DataDependencies> {
        match &self.kind {
            DependencyKind::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the tool fields, if these are tool dependencies.
    pub fn tool(&self) -> Option<&ToolDependencies> {
        match &self.kind {
            DependencyKind::Tool(tool) => Some(tool),
            _ => None,
        }
    }
}

/// Type-specific dependency fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DependencyKind {
    /// No extra fields.
    #[default]
    Base,
    /// See [`ChatDependencies`].
    Chat(ChatDependencies),
    /// See [`ResearchDependencies`].
    Research(ResearchDependencies),
    /// See [`DataDependencies`].
    Data(DataDependencies),
    /// See [`ToolDependencies`].
    Tool(ToolDependencies),
}

/// One remembered message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who said it.
    pub role: String,
    /// What was said.
    pub content: String,
}

impl HistoryEntry {
    /// Creates a history entry.
    #[inline]
    pub fn new<S1: Into<String>, S2: Into<String>>(role: S1, content: S2) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Fields of `ChatDependencies`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatDependencies {
    /// Oldest first.
    pub conversation_history: Vec<HistoryEntry>,
    /// History is trimmed to this many entries after each append.
    pub max_history: usize,
}

impl Default for ChatDependencies {
    fn default() -> Self {
        Self {
            conversation_history: vec![],
            max_history: 50,
        }
    }
}

impl ChatDependencies {
    /// Appends a message, keeping only the last `max_history` entries.
    pub fn remember<S1: Into<String>, S2: Into<String>>(
        &mut self,
        role: S1,
        content: S2,
    ) {
        self.conversation_history
            .push(HistoryEntry::new(role, content));
        let len = self.conversation_history.len();
        if len > self.max_history {
            self.conversation_history.drain(..len - self.max_history);
        }
    }

    /// Returns up to `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> &[HistoryEntry] {
        let len = self.conversation_history.len();
        &self.conversation_history[len.saturating_sub(n)..]
    }
}

/// Fields of `ResearchDependencies`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchDependencies {
    /// Whether search tools may run.
    pub search_enabled: bool,
    /// Upper bound on search results.
    pub max_results: usize,
    /// Where to search.
    pub search_sources: Vec<String>,
}

impl Default for ResearchDependencies {
    fn default() -> Self {
        Self {
            search_enabled: true,
            max_results: 10,
            search_sources: vec!["web".to_owned(), "documents".to_owned()],
        }
    }
}

/// Fields of `DataDependencies`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataDependencies {
    /// The dataset to analyze.
    pub data_path: Option<String>,
    /// Accepted file formats.
    pub allowed_formats: Vec<String>,
    /// Size cap in bytes.
    pub max_file_size: u64,
}

impl Default for DataDependencies {
    fn default() -> Self {
        Self {
            data_path: None,
            allowed_formats: ["csv", "json", "xlsx"]
                .map(str::to_owned)
                .to_vec(),
            max_file_size: 100 * 1024 * 1024,
        }
    }
}

/// Fields of `ToolDependencies`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDependencies {
    /// API keys by service name.
    pub api_keys: BTreeMap<String, String>,
    /// Requests per minute by service name.
    pub rate_limits: BTreeMap<String, u32>,
    /// Timeout in seconds.
    pub timeout: u64,
}

impl Default for ToolDependencies {
    fn default() -> Self {
        Self {
            api_keys: BTreeMap::new(),
            rate_limits: BTreeMap::new(),
            timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(DepsType::parse("ChatDependencies"), DepsType::Chat);
        assert_eq!(DepsType::parse("DataDependencies"), DepsType::Data);
        assert_eq!(DepsType::parse("Whatever"), DepsType::Base);
        assert_eq!(DepsType::Research.to_string(), "ResearchDependencies");

        let ty: DepsType =
            serde_json::from_str("\"ToolDependencies\"").unwrap();
        assert_eq!(ty, DepsType::Tool);
    }

    #[test]
    fn test_defaults() {
        let deps = DepsType::Research.default_deps();
        let research = deps.research().unwrap();
        assert!(research.search_enabled);
        assert_eq!(research.max_results, 10);
        assert_eq!(research.search_sources, ["web", "documents"]);

        let deps = DepsType::Data.default_deps();
        assert_eq!(deps.data().unwrap().max_file_size, 104_857_600);
        assert_eq!(deps.deps_type(), DepsType::Data);

        let deps = DepsType::Tool.default_deps();
        assert_eq!(deps.tool().unwrap().timeout, 30);
        assert!(deps.chat().is_none());
    }

    #[test]
    fn test_remember_trims_history() {
        let mut chat = ChatDependencies {
            max_history: 3,
            ..Default::default()
        };
        for i in 0..5 {
            chat.remember("user", format!("message {i}"));
        }
        assert_eq!(chat.conversation_history.len(), 3);
        assert_eq!(chat.conversation_history[0].content, "message 2");
        assert_eq!(chat.recent(2).len(), 2);
        assert_eq!(chat.recent(2)[1].content, "message 4");
        assert_eq!(chat.recent(10).len(), 3);
    }
}
