use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use agent_land_core::deps::HistoryEntry;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::fs;

use crate::helpers::truncate_chars;

const SHOWN_MESSAGES: usize = 10;

/// Who produced a history message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The operator.
    User,
    /// An agent.
    Assistant,
    /// The playground itself.
    System,
}

impl Role {
    /// Returns the lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A message of the playground conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryMessage {
    /// When the message was logged.
    pub timestamp: NaiveDateTime,
    /// Who produced it.
    pub role: Role,
    /// The text.
    pub content: String,
    /// The agent that was current.
    pub agent: String,
    /// Extra data, e.g. `execution_time`.
    pub metadata: Map<String, Value>,
}

/// The conversation of a playground session, oldest first.
#[derive(Clone, Debug, Default)]
pub struct History {
    messages: Vec<HistoryMessage>,
}

impl History {
    /// Returns every message.
    #[inline]
    pub fn messages(&self) -> &[HistoryMessage] {
        &self.messages
    }

    /// Appends a message.
    pub fn log<S: Into<String>>(
        &mut self,
        role: Role,
        content: S,
        agent: &str,
        metadata: Map<String, Value>,
    ) {
        self.messages.push(HistoryMessage {
            timestamp: Local::now().naive_local(),
            role,
            content: content.into(),
            agent: agent.to_owned(),
            metadata,
        });
    }

    /// Removes every message and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.messages.len();
        self.messages.clear();
        count
    }

    /// The last `n` messages as chat history entries.
    pub fn recent_entries(&self, n: usize) -> Vec<HistoryEntry> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..]
            .iter()
            .map(|msg| HistoryEntry::new(msg.role.name(), msg.content.as_str()))
            .collect()
    }

    /// Counts the answers of `agent` and averages their execution time.
    pub fn profile(&self, agent: &str) -> Option<(usize, f64)> {
        let times: Vec<f64> = self
            .messages
            .iter()
            .filter(|msg| msg.role == Role::Assistant && msg.agent == agent)
            .map(|msg| {
                msg.metadata
                    .get("execution_time")
                    .and_then(Value::as_f64)
                    .unwrap_or_default()
            })
            .collect();
        if times.is_empty() {
            return None;
        }
        Some((times.len(), times.iter().sum::<f64>() / times.len() as f64))
    }

    /// Renders the last ten messages.
    pub fn render(&self) -> String {
        let mut text = format!(
            "\n📜 Conversation History ({} messages):",
            self.messages.len()
        );
        if self.messages.is_empty() {
            text.push_str("\n   No messages yet.");
            return text;
        }

        let start = self.messages.len().saturating_sub(SHOWN_MESSAGES);
        for (i, msg) in self.messages[start..].iter().enumerate() {
            let ellipsis = if msg.content.chars().count() > 100 { "..." } else { "" };
            _ = write!(
                text,
                "\n  {:2}. [{}] {} ({}): {}{ellipsis}",
                i + 1,
                msg.timestamp.format("%Y-%m-%dT%H:%M:%S"),
                msg.role.name(),
                msg.agent,
                truncate_chars(&msg.content, 100),
            );
        }
        if self.messages.len() > SHOWN_MESSAGES {
            _ = write!(
                text,
                "\n   ... and {} more messages",
                self.messages.len() - SHOWN_MESSAGES
            );
        }
        _ = write!(text, "\n{}", "-".repeat(60));
        text
    }

    /// Writes the conversation to `dir/conversation_<timestamp>.json`.
    pub async fn export(
        &self,
        dir: &Path,
        session_id: &str,
        conversation_id: &str,
    ) -> io::Result<PathBuf> {
        fs::create_dir_all(dir).await?;
        let now = Local::now();
        let path = dir.join(format!("conversation_{}.json", now.format("%Y%m%d_%H%M%S")));
        let data = json!({
            "session_id": session_id,
            "conversation_id": conversation_id,
            "timestamp": now.naive_local(),
            "message_count": self.messages.len(),
            "messages": self.messages,
        });
        let text = serde_json::to_string_pretty(&data).map_err(io::Error::other)?;
        fs::write(&path, text).await?;
        Ok(path)
    }
}
