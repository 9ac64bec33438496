//! Tracking conversations between users and agents.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Write as _};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::fs;

use crate::helpers::truncate_chars;

const SENDER_EMOJIS: [(&str, &str); 5] = [
    ("chat", "💬"),
    ("research", "🔍"),
    ("analyst", "📊"),
    ("user", "👤"),
    ("system", "⚙️"),
];

/// Whether a conversation is still going.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    /// Messages may still be added.
    Active,
    /// Ended and saved.
    Ended,
}

/// A registered agent with its running totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackedAgent {
    /// Whatever was registered with the agent.
    #[serde(flatten)]
    pub info: Map<String, Value>,
    /// When the agent was registered.
    pub registered_at: NaiveDateTime,
    /// Messages sent by the agent.
    pub message_count: usize,
    /// Seconds spent producing those messages.
    pub total_response_time: f64,
}

/// Per-participant statistics of a conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ParticipantStats {
    /// Messages sent.
    pub message_count: usize,
    /// Running mean of the reported response times.
    pub avg_response_time: f64,
}

/// Statistics of a conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConversationStatistics {
    /// Messages from anyone.
    pub total_messages: usize,
    /// Statistics of each declared participant.
    pub participant_stats: BTreeMap<String, ParticipantStats>,
}

/// A message of a tracked conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackedMessage {
    /// `msg_<n>`, counting from 1.
    pub id: String,
    /// When the message was added.
    pub timestamp: NaiveDateTime,
    /// Who sent it.
    pub sender: String,
    /// The text.
    pub content: String,
    /// The kind of message, `text` by default.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Extra data.
    pub metadata: Map<String, Value>,
    /// Seconds the sender took to respond.
    pub response_time: Option<f64>,
}

/// A message about to be added to a conversation.
#[derive(Clone, Debug)]
pub struct NewMessage {
    sender: String,
    content: String,
    message_type: String,
    metadata: Map<String, Value>,
    response_time: Option<f64>,
}

impl NewMessage {
    /// Creates a `text` message.
    pub fn new<S1: Into<String>, S2: Into<String>>(sender: S1, content: S2) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            message_type: "text".to_owned(),
            metadata: Map::new(),
            response_time: None,
        }
    }

    /// Sets the kind of message.
    pub fn with_type<S: Into<String>>(mut self, message_type: S) -> Self {
        self.message_type = message_type.into();
        self
    }

    /// Sets the extra data.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets how long the sender took to respond, in seconds.
    pub fn with_response_time(mut self, seconds: f64) -> Self {
        self.response_time = Some(seconds);
        self
    }
}

/// A tracked conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackedConversation {
    /// The conversation id.
    pub id: String,
    /// The declared participants.
    pub participants: Vec<String>,
    /// What the conversation is about.
    pub topic: Option<String>,
    /// When tracking started.
    pub started_at: NaiveDateTime,
    /// The messages, oldest first.
    pub messages: Vec<TrackedMessage>,
    /// Whether the conversation has ended.
    pub status: ConversationStatus,
    /// Running statistics.
    pub statistics: ConversationStatistics,
    /// When the conversation ended.
    pub ended_at: Option<NaiveDateTime>,
    /// A closing summary.
    pub summary: Option<String>,
    /// Seconds between start and end.
    pub duration_seconds: Option<f64>,
}

/// One entry of the session-wide interaction log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interaction {
    /// When the message was added.
    pub timestamp: NaiveDateTime,
    /// The conversation it was added to.
    pub conversation_id: String,
    /// Who sent it.
    pub sender: String,
    /// The kind of message.
    pub message_type: String,
    /// Length of the text in characters.
    pub content_length: usize,
    /// Seconds the sender took to respond.
    pub response_time: Option<f64>,
}

/// Statistics of one conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversationSummary {
    /// The conversation id.
    pub conversation_id: String,
    /// The declared participants.
    pub participants: Vec<String>,
    /// What the conversation is about.
    pub topic: Option<String>,
    /// Whether the conversation has ended.
    pub status: ConversationStatus,
    /// Seconds between start and end, once ended.
    pub duration: Option<f64>,
    /// Number of messages.
    pub message_count: usize,
    /// Whitespace-separated words over all messages.
    pub total_words: usize,
    /// Mean words per message.
    pub avg_words_per_message: f64,
    /// Mean of the reported response times.
    pub avg_response_time: Option<f64>,
    /// Contribution of each declared participant.
    pub participant_contribution: BTreeMap<String, Contribution>,
}

/// How much a participant said.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Contribution {
    /// Messages sent.
    pub message_count: usize,
    /// Words sent.
    pub word_count: usize,
    /// Share of all messages, in percent.
    pub percentage: f64,
}

/// Tracks conversations, their participants and statistics for one
/// session.
#[derive(Debug)]
pub struct ConversationTracker {
    session_name: String,
    output_dir: PathBuf,
    conversations: BTreeMap<String, TrackedConversation>,
    agents: BTreeMap<String, TrackedAgent>,
    interactions: Vec<Interaction>,
    active_conversation: Option<String>,
}

impl ConversationTracker {
    /// Starts a session saving under `output_dir`. Without a name the
    /// session is called `session_<unix seconds>`.
    pub fn new<P: Into<PathBuf>>(session_name: Option<&str>, output_dir: P) -> Self {
        let session_name = session_name
            .map(str::to_owned)
            .unwrap_or_else(|| format!("session_{}", Utc::now().timestamp()));
        info!("📊 started conversation tracking session: {session_name}");
        Self {
            session_name,
            output_dir: output_dir.into(),
            conversations: BTreeMap::new(),
            agents: BTreeMap::new(),
            interactions: vec![],
            active_conversation: None,
        }
    }

    /// Returns the session name.
    #[inline]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Returns the most recently started conversation that has not ended.
    #[inline]
    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    /// Returns a conversation.
    pub fn conversation(&self, id: &str) -> Option<&TrackedConversation> {
        self.conversations.get(id)
    }

    /// Returns a registered agent.
    pub fn agent(&self, id: &str) -> Option<&TrackedAgent> {
        self.agents.get(id)
    }

    /// Returns the interaction log.
    #[inline]
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Registers an agent so its messages count towards its totals.
    pub fn register_agent(&mut self, agent_id: &str, info: Map<String, Value>) {
        self.agents.insert(
            agent_id.to_owned(),
            TrackedAgent {
                info,
                registered_at: Local::now().naive_local(),
                message_count: 0,
                total_response_time: 0.0,
            },
        );
        info!("🤖 registered agent: {agent_id}");
    }

    /// Starts tracking a conversation, which becomes the active one.
    pub fn start_conversation<I, S>(
        &mut self,
        conversation_id: &str,
        participants: I,
        topic: Option<&str>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let participants: Vec<String> = participants.into_iter().map(Into::into).collect();
        let statistics = ConversationStatistics {
            total_messages: 0,
            participant_stats: participants
                .iter()
                .map(|p| (p.clone(), ParticipantStats::default()))
                .collect(),
        };
        info!(
            "💬 started conversation {conversation_id} with {} participants",
            participants.len()
        );
        self.conversations.insert(
            conversation_id.to_owned(),
            TrackedConversation {
                id: conversation_id.to_owned(),
                participants,
                topic: topic.map(str::to_owned),
                started_at: Local::now().naive_local(),
                messages: vec![],
                status: ConversationStatus::Active,
                statistics,
                ended_at: None,
                summary: None,
                duration_seconds: None,
            },
        );
        self.active_conversation = Some(conversation_id.to_owned());
    }

    /// Adds a message to a conversation and updates the statistics.
    pub fn add_message(
        &mut self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<&TrackedMessage, TrackerError> {
        let conversation = self
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| TrackerError::NotFound(conversation_id.to_owned()))?;

        let now = Local::now().naive_local();
        let response_time = message.response_time.filter(|t| *t > 0.0);

        conversation.statistics.total_messages += 1;
        if let Some(stats) = conversation
            .statistics
            .participant_stats
            .get_mut(&message.sender)
        {
            stats.message_count += 1;
            if let Some(t) = response_time {
                let count = stats.message_count as f64;
                stats.avg_response_time = (stats.avg_response_time * (count - 1.0) + t) / count;
            }
        }
        if let Some(agent) = self.agents.get_mut(&message.sender) {
            agent.message_count += 1;
            agent.total_response_time += response_time.unwrap_or_default();
        }

        self.interactions.push(Interaction {
            timestamp: now,
            conversation_id: conversation_id.to_owned(),
            sender: message.sender.clone(),
            message_type: message.message_type.clone(),
            content_length: message.content.chars().count(),
            response_time: message.response_time,
        });
        debug!(
            "💬 [{conversation_id}] {}: {}...",
            message.sender,
            truncate_chars(&message.content, 50)
        );

        let index = conversation.messages.len();
        conversation.messages.push(TrackedMessage {
            id: format!("msg_{}", index + 1),
            timestamp: now,
            sender: message.sender,
            content: message.content,
            message_type: message.message_type,
            metadata: message.metadata,
            response_time: message.response_time,
        });
        Ok(&conversation.messages[index])
    }

    /// Ends a conversation and saves it as JSON. A failure to save is
    /// logged, the conversation ends either way.
    pub async fn end_conversation(
        &mut self,
        conversation_id: &str,
        summary: Option<&str>,
    ) -> Result<&TrackedConversation, TrackerError> {
        let conversation = self
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| TrackerError::NotFound(conversation_id.to_owned()))?;

        let ended_at = Local::now().naive_local();
        let duration = (ended_at - conversation.started_at).num_milliseconds() as f64 / 1000.0;
        conversation.status = ConversationStatus::Ended;
        conversation.ended_at = Some(ended_at);
        conversation.summary = summary.map(str::to_owned);
        conversation.duration_seconds = Some(duration);

        let path = self
            .output_dir
            .join(format!("conversation_{conversation_id}.json"));
        match write_json(&path, &*conversation).await {
            Ok(()) => debug!("💾 saved conversation to {}", path.display()),
            Err(err) => error!("failed to save conversation: {err}"),
        }

        if self.active_conversation.as_deref() == Some(conversation_id) {
            self.active_conversation = None;
        }
        info!("💬 ended conversation {conversation_id} ({duration:.1}s)");
        self.conversations
            .get(conversation_id)
            .ok_or_else(|| TrackerError::NotFound(conversation_id.to_owned()))
    }

    /// Summarizes a conversation.
    pub fn conversation_summary(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSummary, TrackerError> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .ok_or_else(|| TrackerError::NotFound(conversation_id.to_owned()))?;
        let messages = &conversation.messages;
        if messages.is_empty() {
            return Err(TrackerError::NoMessages(conversation_id.to_owned()));
        }

        let words = |msg: &TrackedMessage| msg.content.split_whitespace().count();
        let total_words: usize = messages.iter().map(words).sum();
        let response_times: Vec<f64> = messages
            .iter()
            .filter_map(|msg| msg.response_time.filter(|t| *t > 0.0))
            .collect();

        let participant_contribution = conversation
            .participants
            .iter()
            .map(|participant| {
                let sent: Vec<_> = messages
                    .iter()
                    .filter(|msg| &msg.sender == participant)
                    .collect();
                let contribution = Contribution {
                    message_count: sent.len(),
                    word_count: sent.iter().map(|msg| words(msg)).sum(),
                    percentage: sent.len() as f64 / messages.len() as f64 * 100.0,
                };
                (participant.clone(), contribution)
            })
            .collect();

        Ok(ConversationSummary {
            conversation_id: conversation_id.to_owned(),
            participants: conversation.participants.clone(),
            topic: conversation.topic.clone(),
            status: conversation.status,
            duration: conversation.duration_seconds,
            message_count: messages.len(),
            total_words,
            avg_words_per_message: total_words as f64 / messages.len() as f64,
            avg_response_time: (!response_times.is_empty())
                .then(|| response_times.iter().sum::<f64>() / response_times.len() as f64),
            participant_contribution,
        })
    }

    /// Renders a conversation as a timeline.
    pub fn visualize_conversation(&self, conversation_id: &str) -> String {
        let Some(conversation) = self.conversations.get(conversation_id) else {
            return "Conversation not found".to_owned();
        };
        let Ok(summary) = self.conversation_summary(conversation_id) else {
            return "No messages in conversation".to_owned();
        };

        let mut text = format!(
            "💬 Conversation: {conversation_id}\n\
             🏷️  Topic: {}\n\
             👥 Participants: {}\n\
             📅 Started: {}\n\
             📊 Messages: {}\n\
             {}\n",
            conversation.topic.as_deref().unwrap_or("N/A"),
            conversation.participants.join(", "),
            conversation.started_at,
            conversation.messages.len(),
            "=".repeat(60),
        );

        for (i, msg) in conversation.messages.iter().enumerate() {
            let response_time = msg
                .response_time
                .filter(|t| *t > 0.0)
                .map(|t| format!(" ({t:.2}s)"))
                .unwrap_or_default();
            let ellipsis = if msg.content.chars().count() > 100 { "..." } else { "" };
            _ = write!(
                text,
                "\n{:2}. [{}] {} {}{response_time}:\n    {}{ellipsis}\n",
                i + 1,
                msg.timestamp.format("%H:%M:%S"),
                sender_emoji(&msg.sender),
                msg.sender,
                truncate_chars(&msg.content, 100),
            );
        }

        _ = write!(
            text,
            "\n📊 Summary:\n   Duration: {:.1}s\n",
            summary.duration.unwrap_or_default()
        );
        match summary.avg_response_time {
            Some(avg) => _ = writeln!(text, "   Avg Response Time: {avg:.2}s"),
            None => text.push_str("   No response times recorded\n"),
        }
        _ = write!(
            text,
            "   Total Words: {}\n\n👥 Participation:",
            summary.total_words
        );
        for (participant, contribution) in &summary.participant_contribution {
            _ = write!(
                text,
                "\n   {participant}: {} messages ({:.1}%)",
                contribution.message_count, contribution.percentage
            );
        }
        text
    }

    /// Renders an overview of the whole session.
    pub fn session_report(&self) -> String {
        let mut report = format!(
            "📊 Conversation Tracking Report\n\
             Session: {}\n\
             Generated: {}\n\
             {}\n\n\
             📈 Overview:\n   \
             Conversations: {}\n   \
             Registered Agents: {}\n   \
             Total Interactions: {}\n",
            self.session_name,
            Local::now().naive_local(),
            "=".repeat(60),
            self.conversations.len(),
            self.agents.len(),
            self.interactions.len(),
        );

        if !self.agents.is_empty() {
            _ = write!(report, "\n🤖 Agent Statistics:\n{}\n", "-".repeat(30));
            for (agent_id, agent) in &self.agents {
                let avg = if agent.message_count == 0 {
                    0.0
                } else {
                    agent.total_response_time / agent.message_count as f64
                };
                _ = writeln!(
                    report,
                    "   {agent_id}: {} messages, avg {avg:.2}s response",
                    agent.message_count
                );
            }
        }

        if !self.conversations.is_empty() {
            _ = write!(report, "\n💬 Conversation Summaries:\n{}", "-".repeat(30));
            for (id, conversation) in &self.conversations {
                let status = match conversation.status {
                    ConversationStatus::Ended => "✅",
                    ConversationStatus::Active => "⏳",
                };
                _ = write!(
                    report,
                    "\n{status} {id}: {} messages, {:.1}s duration",
                    conversation.messages.len(),
                    conversation.duration_seconds.unwrap_or_default(),
                );
            }
        }
        report
    }

    /// Saves the whole session as JSON and returns the file written.
    pub async fn export_session(&self) -> Result<PathBuf, TrackerError> {
        let path = self.output_dir.join(format!(
            "session_export_{}_{}.json",
            self.session_name,
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let data = json!({
            "session_name": self.session_name,
            "export_timestamp": Local::now().naive_local(),
            "agents": self.agents,
            "conversations": self.conversations,
            "interactions": self.interactions,
            "summary": {
                "total_conversations": self.conversations.len(),
                "total_agents": self.agents.len(),
                "total_interactions": self.interactions.len(),
            },
        });
        write_json(&path, &data).await?;
        info!("💾 exported session to {}", path.display());
        Ok(path)
    }
}

/// Picks an emoji for a sender from its name, `🤖` if nothing matches.
pub fn sender_emoji(sender: &str) -> &'static str {
    let sender = sender.to_lowercase();
    SENDER_EMOJIS
        .iter()
        .find(|(key, _)| sender.contains(key))
        .map_or("🤖", |(_, emoji)| emoji)
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TrackerError> {
    let text = serde_json::to_string_pretty(value).map_err(TrackerError::Json)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .await
            .map_err(|source| TrackerError::io(dir, source))?;
    }
    fs::write(path, text)
        .await
        .map_err(|source| TrackerError::io(path, source))
}

/// Errors from [`ConversationTracker`].
#[derive(Debug)]
pub enum TrackerError {
    /// No conversation has this id.
    NotFound(String),
    /// The conversation has no messages yet.
    NoMessages(String),
    /// A file could not be written.
    Io {
        /// The file or directory.
        path: PathBuf,
        /// The cause.
        source: io::Error,
    },
    /// The session could not be encoded.
    Json(serde_json::Error),
}

impl TrackerError {
    fn io(path: &Path, source: io::Error) -> Self {
        TrackerError::Io {
            path: path.to_owned(),
            source,
        }
    }
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::NotFound(id) => write!(f, "conversation {id} not found"),
            TrackerError::NoMessages(id) => write!(f, "no messages in conversation {id}"),
            TrackerError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            TrackerError::Json(err) => write!(f, "failed to encode session: {err}"),
        }
    }
}

impl StdError for TrackerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TrackerError::Io { source, .. } => Some(source),
            TrackerError::Json(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(dir: &Path) -> ConversationTracker {
        let mut tracker = ConversationTracker::new(Some("demo"), dir);
        let mut info = Map::new();
        info.insert("role".to_owned(), json!("researcher"));
        tracker.register_agent("research", info);
        tracker.start_conversation("c1", ["user", "research"], Some("Rust"));
        tracker
    }

    #[test]
    fn test_add_message_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = tracker(dir.path());

        let msg = tracker
            .add_message("c1", NewMessage::new("user", "what is rust"))
            .unwrap();
        assert_eq!(msg.id, "msg_1");
        assert_eq!(msg.message_type, "text");
        tracker
            .add_message("c1", NewMessage::new("research", "a language").with_response_time(2.0))
            .unwrap();
        tracker
            .add_message("c1", NewMessage::new("research", "fast and safe").with_response_time(4.0))
            .unwrap();
        tracker
            .add_message("c1", NewMessage::new("observer", "noted").with_type("note"))
            .unwrap();

        let conversation = tracker.conversation("c1").unwrap();
        assert_eq!(conversation.statistics.total_messages, 4);
        let stats = conversation.statistics.participant_stats["research"];
        assert_eq!(stats.message_count, 2);
        assert_eq!(stats.avg_response_time, 3.0);
        assert!(!conversation.statistics.participant_stats.contains_key("observer"));

        let agent = tracker.agent("research").unwrap();
        assert_eq!((agent.message_count, agent.total_response_time), (2, 6.0));
        assert_eq!(tracker.interactions().len(), 4);
        assert_eq!(tracker.interactions()[3].message_type, "note");

        assert!(matches!(
            tracker.add_message("nope", NewMessage::new("user", "hi")),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_summary_and_visualization() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = tracker(dir.path());
        assert!(matches!(
            tracker.conversation_summary("c1"),
            Err(TrackerError::NoMessages(_))
        ));
        assert_eq!(tracker.visualize_conversation("c1"), "No messages in conversation");
        assert_eq!(tracker.visualize_conversation("zz"), "Conversation not found");

        tracker
            .add_message("c1", NewMessage::new("user", "what is rust"))
            .unwrap();
        tracker
            .add_message("c1", NewMessage::new("research", "a language").with_response_time(1.5))
            .unwrap();

        let summary = tracker.conversation_summary("c1").unwrap();
        assert_eq!(summary.total_words, 5);
        assert_eq!(summary.avg_words_per_message, 2.5);
        assert_eq!(summary.avg_response_time, Some(1.5));
        assert_eq!(summary.participant_contribution["user"].percentage, 50.0);
        assert_eq!(summary.participant_contribution["research"].word_count, 2);

        let text = tracker.visualize_conversation("c1");
        assert!(text.starts_with("💬 Conversation: c1\n🏷️  Topic: Rust\n👥 Participants: user, research\n"));
        assert!(text.contains("] 👤 user:\n    what is rust\n"));
        assert!(text.contains("] 🔍 research (1.50s):\n    a language\n"));
        assert!(text.contains("   Avg Response Time: 1.50s\n"));
        assert!(text.ends_with("👥 Participation:\n   research: 1 messages (50.0%)\n   user: 1 messages (50.0%)"));
    }

    #[tokio::test]
    async fn test_end_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = tracker(dir.path());
        assert_eq!(tracker.active_conversation(), Some("c1"));
        tracker
            .add_message("c1", NewMessage::new("user", "bye"))
            .unwrap();

        let ended = tracker.end_conversation("c1", Some("short")).await.unwrap();
        assert_eq!(ended.status, ConversationStatus::Ended);
        assert!(ended.duration_seconds.unwrap() >= 0.0);
        assert_eq!(tracker.active_conversation(), None);

        let saved = std::fs::read_to_string(dir.path().join("conversation_c1.json")).unwrap();
        let saved: Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved["status"], "ended");
        assert_eq!(saved["summary"], "short");
        assert_eq!(saved["messages"][0]["type"], "text");

        let report = tracker.session_report();
        assert!(report.contains("Session: demo\n"));
        assert!(report.contains("   research: 0 messages, avg 0.00s response\n"));
        assert!(report.contains("\n✅ c1: 1 messages, "));

        let path = tracker.export_session().await.unwrap();
        let export: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(export["summary"]["total_interactions"], 1);
        assert_eq!(export["agents"]["research"]["role"], "researcher");

        assert!(matches!(
            tracker.end_conversation("zz", None).await,
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_sender_emoji() {
        assert_eq!(sender_emoji("Research_Bot"), "🔍");
        assert_eq!(sender_emoji("user"), "👤");
        assert_eq!(sender_emoji("helper"), "🤖");
    }
}
