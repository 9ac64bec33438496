//! The interactive playground: chat with agents, inspect them, create new
//! ones.
//!
//! A [`Playground`] reads operator input from a [`LineSource`] and writes
//! everything it has to say to a [`Write`] sink, so a session can be
//! scripted end to end.

mod command;
mod history;
mod input;
mod theme;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use agent_land_core::deps::{ChatDependencies, DataDependencies, ResearchDependencies};
use agent_land_core::{Agent, Dependencies, DependencyKind, DepsType, RunResult};
use serde_json::{Map, Value, json};

use command::HELP;
pub use command::Command;
pub use history::{History, HistoryMessage, Role};
pub use input::{LineSource, ScriptedLines, StdinLines};
pub use theme::Theme;

use crate::agents::{data_analyst, research_agent, simple_chat};
use crate::builder::{AgentConfig, AgentStore, build_agent, create_agent_interactive};
use crate::helpers::{generate_conversation_id, generate_session_id, truncate_chars};
use crate::observer::AgentObserver;
use crate::providers::ModelFactory;
use crate::settings::Settings;
use crate::tracker::{ConversationTracker, NewMessage};

const DEFAULT_AGENT: &str = "chat";
const PLAYGROUND_USER: &str = "playground_user";
const CHAT_HISTORY_LIMIT: usize = 10;
const RESEARCH_MAX_RESULTS: usize = 5;

/// Where an agent of the playground comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentKind {
    /// Shipped with the playground; cannot be deleted.
    BuiltIn,
    /// Built from a saved configuration.
    Custom,
}

/// An agent the operator can talk to.
#[derive(Clone, Debug)]
pub struct AgentEntry {
    /// The name used by `/switch`.
    pub name: String,
    /// The agent.
    pub agent: Agent,
    /// One line for `/agents`.
    pub description: String,
    /// Where it comes from.
    pub kind: AgentKind,
}

/// An interactive session.
pub struct Playground<L, W> {
    lines: L,
    out: W,
    theme: Theme,
    factory: ModelFactory,
    store: AgentStore,
    agents: Vec<AgentEntry>,
    current: String,
    session_id: String,
    conversation_id: String,
    history: History,
    observe: bool,
    observer: AgentObserver,
    tracker: ConversationTracker,
    conversations_dir: PathBuf,
}

impl<L: LineSource, W: Write> Playground<L, W> {
    /// Creates a session with the built-in agents, all running the default
    /// model.
    pub fn new(settings: &Settings, factory: ModelFactory, lines: L, out: W) -> Self {
        let model = settings.default_model.as_str();
        let built_in = |name: &str, agent: Agent, description: &str| AgentEntry {
            name: name.to_owned(),
            agent,
            description: description.to_owned(),
            kind: AgentKind::BuiltIn,
        };
        let agents = vec![
            built_in(
                "chat",
                simple_chat(model, factory.client(model)),
                "Simple conversational AI with context management",
            ),
            built_in(
                "research",
                research_agent(model, factory.client(model)),
                "Information gathering and research agent",
            ),
            built_in(
                "analyst",
                data_analyst(model, factory.client(model)),
                "Data analysis and business insights agent",
            ),
        ];

        Self {
            lines,
            out,
            theme: Theme::PLAIN,
            factory,
            store: AgentStore::new(settings.agents_dir()),
            agents,
            current: DEFAULT_AGENT.to_owned(),
            session_id: generate_session_id(),
            conversation_id: generate_conversation_id(),
            history: History::default(),
            observe: false,
            observer: AgentObserver::new(settings.observations_dir()),
            tracker: ConversationTracker::new(None, settings.conversations_dir()),
            conversations_dir: settings.conversations_dir(),
        }
    }

    /// Sets how output is decorated.
    #[inline]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns the session id.
    #[inline]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Runs until `/quit` or the end of input.
    ///
    /// Operation errors are reported and the session goes on; only
    /// failures to write output end it early.
    pub async fn run(mut self) -> io::Result<()> {
        self.load_created_agents().await;
        self.start_tracking();

        writeln!(self.out, "🚀 Agent Playground Started")?;
        writeln!(self.out, "Session ID: {}", self.session_id)?;
        writeln!(self.out, "Conversation ID: {}", self.conversation_id)?;
        writeln!(self.out, "{}", "=".repeat(60))?;
        writeln!(self.out, "🎮 Agent Playground Ready!")?;
        writeln!(
            self.out,
            "Type /help for commands, or start chatting with your agents."
        )?;
        writeln!(self.out, "{}", "=".repeat(60))?;

        loop {
            write!(self.out, "{}", self.theme.prompt(&self.current))?;
            self.out.flush()?;
            let Some(line) = self.lines.read_line().await else {
                writeln!(self.out, "\n👋 Goodbye!")?;
                break;
            };
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            if !self.dispatch(command).await? {
                break;
            }
        }

        if let Err(err) = self
            .tracker
            .end_conversation(&self.conversation_id, None)
            .await
        {
            warn!("failed to end tracked conversation: {err}");
        }
        Ok(())
    }

    /// Runs one command. Returns `false` when the session should end.
    async fn dispatch(&mut self, command: Command) -> io::Result<bool> {
        match command {
            Command::Help => {
                writeln!(self.out, "{HELP}")?;
                writeln!(self.out, "{}", "-".repeat(60))?;
            }
            Command::Agents => self.list_agents()?,
            Command::Switch(Some(name)) => self.switch_agent(&name)?,
            Command::Switch(None) => writeln!(self.out, "Usage: /switch <agent_name>")?,
            Command::History => writeln!(self.out, "{}", self.history.render())?,
            Command::Clear => {
                let count = self.history.clear();
                writeln!(self.out, "🗑️  Cleared {count} messages from history")?;
            }
            Command::Info => {
                let current = self.current.clone();
                self.show_agent_info(&current)?;
            }
            Command::Observe => {
                self.observe = !self.observe;
                let state = if self.observe { "ON" } else { "OFF" };
                writeln!(self.out, "🔍 Observation mode: {state}")?;
            }
            Command::Profile => self.show_profile()?,
            Command::Export => self.export_conversation().await?,
            Command::Report => {
                writeln!(self.out, "{}", self.observer.generate_report())?;
                writeln!(self.out, "\n{}", self.tracker.session_report())?;
            }
            Command::Create => self.create_agent().await?,
            Command::Templates => writeln!(self.out, "{}", self.store.list_templates())?,
            Command::Created => writeln!(self.out, "{}", self.store.list_created())?,
            Command::Load(Some(name)) => self.load_agent(&name).await?,
            Command::Load(None) => writeln!(self.out, "Usage: /load <agent_name>")?,
            Command::Delete(Some(name)) => self.delete_agent(&name).await?,
            Command::Delete(None) => writeln!(self.out, "Usage: /delete <agent_name>")?,
            Command::AgentInfo(Some(name)) => self.show_detailed_info(&name)?,
            Command::AgentInfo(None) => writeln!(self.out, "Usage: /agent-info <agent_name>")?,
            Command::Quit => {
                writeln!(self.out, "👋 Goodbye!")?;
                return Ok(false);
            }
            Command::Unknown(name) => {
                writeln!(self.out, "Unknown command: {name}")?;
                writeln!(self.out, "Type /help for available commands.")?;
            }
            Command::Message(message) => self.send_message(&message).await?,
        }
        Ok(true)
    }

    fn entry(&self, name: &str) -> Option<&AgentEntry> {
        self.agents.iter().find(|entry| entry.name == name)
    }

    async fn load_created_agents(&mut self) {
        let names = match self.store.load_all().await {
            Ok(names) => names,
            Err(err) => {
                error!("error loading created agents: {err}");
                return;
            }
        };
        for name in names {
            if let Some(config) = self.store.get(&name).cloned() {
                self.add_custom(&config);
            }
        }
    }

    fn start_tracking(&mut self) {
        for entry in &self.agents {
            let info = match serde_json::to_value(entry.agent.info()) {
                Ok(Value::Object(info)) => info,
                _ => Map::new(),
            };
            self.tracker.register_agent(&entry.name, info);
        }
        let participants = std::iter::once("user").chain(self.agents.iter().map(|e| e.name.as_str()));
        let participants: Vec<String> = participants.map(str::to_owned).collect();
        self.tracker
            .start_conversation(&self.conversation_id, participants, Some("playground"));
    }

    /// Adds an agent built from `config`. Returns `false` if a built-in agent
    /// already has the name.
    fn add_custom(&mut self, config: &AgentConfig) -> bool {
        if self
            .entry(&config.name)
            .is_some_and(|entry| entry.kind == AgentKind::BuiltIn)
        {
            warn!("custom agent {} clashes with a built-in agent", config.name);
            return false;
        }

        let agent = build_agent(config, self.factory.client(&config.model));
        if let Ok(Value::Object(info)) = serde_json::to_value(agent.info()) {
            self.tracker.register_agent(&config.name, info);
        }
        let entry = AgentEntry {
            name: config.name.clone(),
            agent,
            description: format!(
                "Custom agent: {}...",
                truncate_chars(&config.instructions, 50)
            ),
            kind: AgentKind::Custom,
        };
        match self.agents.iter_mut().find(|e| e.name == config.name) {
            Some(existing) => *existing = entry,
            None => self.agents.push(entry),
        }
        true
    }

    async fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        let answer = self.lines.read_line().await.unwrap_or_default();
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }

    fn list_agents(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n🤖 Available Agents:")?;
        for (kind, title) in [
            (AgentKind::BuiltIn, "  📦 Built-in:"),
            (AgentKind::Custom, "  🎨 Custom:"),
        ] {
            let mut entries = self.agents.iter().filter(|e| e.kind == kind).peekable();
            if entries.peek().is_none() {
                continue;
            }
            writeln!(self.out, "{title}")?;
            for entry in entries {
                let marker = if entry.name == self.current { "👉 " } else { "   " };
                writeln!(self.out, "  {marker}{}: {}", entry.name, entry.description)?;
            }
        }
        writeln!(self.out, "{}", "-".repeat(60))
    }

    fn switch_agent(&mut self, name: &str) -> io::Result<()> {
        if self.entry(name).is_none() {
            writeln!(self.out, "{}", self.theme.error(&format!("Unknown agent: {name}")))?;
            let names: Vec<_> = self.agents.iter().map(|e| e.name.as_str()).collect();
            return writeln!(self.out, "Available agents: {}", names.join(", "));
        }

        let old = std::mem::replace(&mut self.current, name.to_owned());
        writeln!(self.out, "🔄 Switched from {old} to {name}")?;
        self.history.log(
            Role::System,
            format!("Switched to {name} agent"),
            name,
            Map::new(),
        );
        Ok(())
    }

    fn show_agent_info(&mut self, name: &str) -> io::Result<()> {
        let Some(entry) = self.entry(name) else {
            return writeln!(self.out, "{}", self.theme.error(&format!("Agent '{name}' not found")));
        };
        let info = entry.agent.info();
        let text = format!(
            "\n🤖 Current Agent: {name}\n   \
             Name: {}\n   \
             Model: {}\n   \
             Dependencies: {}\n   \
             Output Type: {}\n   \
             Description: {}\n\
             {}",
            info.name,
            info.model,
            info.deps_type,
            info.output_type,
            entry.description,
            "-".repeat(60),
        );
        writeln!(self.out, "{text}")
    }

    fn show_profile(&mut self) -> io::Result<()> {
        writeln!(self.out, "📊 Agent Performance Profile:")?;
        match self.history.profile(&self.current) {
            Some((count, avg_time)) => {
                writeln!(self.out, "   Messages: {count}")?;
                writeln!(self.out, "   Avg Response Time: {avg_time:.2}s")
            }
            None => writeln!(self.out, "   No messages from current agent yet."),
        }
    }

    async fn export_conversation(&mut self) -> io::Result<()> {
        let exported = self
            .history
            .export(&self.conversations_dir, &self.session_id, &self.conversation_id)
            .await;
        match exported {
            Ok(path) => writeln!(self.out, "💾 Exported conversation to {}", path.display()),
            Err(err) => {
                error!("failed to export conversation: {err}");
                let message = format!("Error exporting conversation: {err}");
                writeln!(self.out, "{}", self.theme.error(&message))
            }
        }
    }

    async fn create_agent(&mut self) -> io::Result<()> {
        let created =
            create_agent_interactive(&mut self.store, &mut self.lines, &mut self.out).await?;
        let Some(config) = created else {
            return Ok(());
        };
        if !self.add_custom(&config) {
            let message = format!("Agent '{}' is a built-in agent", config.name);
            return writeln!(self.out, "{}", self.theme.error(&message));
        }

        let prompt = format!("\n🔄 Switch to the new agent '{}'? (y/n): ", config.name);
        if self.confirm(&prompt).await? {
            self.switch_agent(&config.name)?;
        }
        Ok(())
    }

    async fn load_agent(&mut self, name: &str) -> io::Result<()> {
        if self.entry(name).is_some() {
            return writeln!(self.out, "⚠️ Agent '{name}' is already loaded");
        }

        let config = match self.store.load(name).await {
            Ok(config) => config.clone(),
            Err(err) => {
                warn!("could not load agent {name}: {err}");
                let message = format!("Could not load agent '{name}'. Make sure it exists.");
                return writeln!(self.out, "{}", self.theme.error(&message));
            }
        };
        self.add_custom(&config);
        writeln!(self.out, "✅ Loaded agent '{name}'")?;

        if self.confirm(&format!("🔄 Switch to '{name}'? (y/n): ")).await? {
            self.switch_agent(name)?;
        }
        Ok(())
    }

    async fn delete_agent(&mut self, name: &str) -> io::Result<()> {
        let Some(entry) = self.entry(name) else {
            return writeln!(self.out, "{}", self.theme.error(&format!("Agent '{name}' not found")));
        };
        if entry.kind == AgentKind::BuiltIn {
            let message = format!("Cannot delete built-in agent '{name}'");
            return writeln!(self.out, "{}", self.theme.error(&message));
        }

        let prompt = format!("⚠️ Are you sure you want to delete agent '{name}'? (y/n): ");
        if !self.confirm(&prompt).await? {
            return writeln!(self.out, "{}", self.theme.error("Deletion cancelled"));
        }

        if self.current == name {
            writeln!(self.out, "🔄 Switching away from '{name}' to '{DEFAULT_AGENT}'")?;
            self.current = DEFAULT_AGENT.to_owned();
        }
        self.agents.retain(|entry| entry.name != name);
        if let Err(err) = self.store.delete(name).await {
            error!("failed to delete agent {name}: {err}");
        }
        writeln!(self.out, "✅ Deleted agent '{name}'")
    }

    fn show_detailed_info(&mut self, name: &str) -> io::Result<()> {
        match self.entry(name).map(|entry| entry.kind) {
            Some(AgentKind::Custom) => match self.store.agent_info(name) {
                Some(info) => writeln!(self.out, "\n{info}"),
                None => {
                    let message = format!("No detailed info available for '{name}'");
                    writeln!(self.out, "{}", self.theme.error(&message))
                }
            },
            Some(AgentKind::BuiltIn) => self.show_agent_info(name),
            None => writeln!(self.out, "{}", self.theme.error(&format!("Agent '{name}' not found"))),
        }
    }

    /// Builds the dependencies for an agent of type `deps_type`, `None` for
    /// types the playground has nothing to fill in for.
    fn deps_for(&self, deps_type: DepsType) -> Option<Dependencies> {
        let kind = match deps_type {
            DepsType::Chat => DependencyKind::Chat(ChatDependencies {
                conversation_history: self.history.recent_entries(CHAT_HISTORY_LIMIT),
                ..Default::default()
            }),
            DepsType::Research => DependencyKind::Research(ResearchDependencies {
                search_enabled: true,
                max_results: RESEARCH_MAX_RESULTS,
                ..Default::default()
            }),
            DepsType::Data => DependencyKind::Data(DataDependencies::default()),
            DepsType::Base | DepsType::Tool => return None,
        };
        let deps = Dependencies::new(kind)
            .with_user_id(PLAYGROUND_USER)
            .with_session_id(&self.session_id)
            .with_context("conversation_id", self.conversation_id.as_str());
        Some(deps)
    }

    fn track(&mut self, sender: &str, content: &str, response_time: Option<f64>) {
        let mut message = NewMessage::new(sender, content);
        if let Some(seconds) = response_time {
            message = message.with_response_time(seconds);
        }
        if let Err(err) = self.tracker.add_message(&self.conversation_id, message) {
            warn!("failed to track message: {err}");
        }
    }

    async fn send_message(&mut self, message: &str) -> io::Result<()> {
        let started = Instant::now();
        let current = self.current.clone();
        self.history.log(Role::User, message, &current, Map::new());
        self.track("user", message, None);

        let Some(agent) = self.entry(&current).map(|entry| entry.agent.clone()) else {
            let text = format!("Unknown agent: {current}");
            return writeln!(self.out, "{}", self.theme.error(&text));
        };
        let deps = self.deps_for(agent.deps_type());

        if self.observe {
            let deps_name = deps.as_ref().map_or("None", |deps| deps.deps_type().name());
            let lines = [
                format!("Sending to {current} agent..."),
                format!("Dependencies: {deps_name}"),
                format!("Message length: {} characters", message.chars().count()),
            ];
            for line in lines {
                writeln!(self.out, "{}", self.theme.observe(&line))?;
            }
            let mut context = Map::new();
            context.insert("conversation_id".to_owned(), json!(self.conversation_id));
            context.insert("dependencies".to_owned(), json!(deps_name));
            self.observer.start_observation(&current, message, context);
            self.observer.log_step(
                "request",
                "Sending message to agent",
                json!({ "message_length": message.chars().count() }),
            );
        }

        let result = self.theme.spin(agent.run(message, deps)).await;
        let execution_time = started.elapsed().as_secs_f64();
        match result {
            Ok(result) => self.on_reply(&current, result, execution_time).await,
            Err(err) => {
                error!("agent {current} failed: {err}");
                let error_message = format!("Error: {err}");
                let mut metadata = Map::new();
                metadata.insert("error".to_owned(), Value::Bool(true));
                self.history
                    .log(Role::System, error_message.as_str(), &current, metadata);
                if self.observe {
                    self.observer.end_observation(None, Some(err.to_string())).await;
                }
                writeln!(self.out, "{}", self.theme.error(&error_message))
            }
        }
    }

    async fn on_reply(
        &mut self,
        current: &str,
        result: RunResult,
        execution_time: f64,
    ) -> io::Result<()> {
        let text = result.output.render();
        let response_type = result.output.output_type().name();

        let mut metadata = Map::new();
        metadata.insert("execution_time".to_owned(), json!(execution_time));
        metadata.insert("response_type".to_owned(), json!(response_type));
        self.history
            .log(Role::Assistant, text.as_str(), current, metadata);
        self.track(current, &text, Some(execution_time));

        if self.observe {
            for call in &result.tool_calls {
                self.observer.log_tool_usage(
                    &call.tool_name,
                    call.arguments.clone(),
                    call.result.clone(),
                    call.execution_time.unwrap_or_default(),
                );
            }
            self.observer.log_step(
                "response",
                "Received response from agent",
                json!({ "steps": result.steps, "response_type": response_type }),
            );
            self.observer
                .end_observation(Some(text.clone()), None)
                .await;

            let lines = [
                format!("Response received in {execution_time:.2}s"),
                format!("Response type: {response_type}"),
                format!("Response length: {} characters", text.chars().count()),
            ];
            for line in lines {
                writeln!(self.out, "{}", self.theme.observe(&line))?;
            }
        }

        writeln!(self.out, "{}", self.theme.reply(current, &text))
    }
}
