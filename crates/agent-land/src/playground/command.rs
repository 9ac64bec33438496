/// A line of playground input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/help`, `/h`.
    Help,
    /// `/agents`, `/a`.
    Agents,
    /// `/switch <agent>`.
    Switch(Option<String>),
    /// `/history`, `/hist`.
    History,
    /// `/clear`.
    Clear,
    /// `/info`.
    Info,
    /// `/observe`, `/obs`.
    Observe,
    /// `/profile`.
    Profile,
    /// `/export`.
    Export,
    /// `/report`.
    Report,
    /// `/create`.
    Create,
    /// `/templates`.
    Templates,
    /// `/created`.
    Created,
    /// `/load <name>`.
    Load(Option<String>),
    /// `/delete <name>`.
    Delete(Option<String>),
    /// `/agent-info <name>`.
    AgentInfo(Option<String>),
    /// `/quit`, `/q`.
    Quit,
    /// A slash command nobody knows, lowercased.
    Unknown(String),
    /// Anything else goes to the current agent.
    Message(String),
}

impl Command {
    /// Parses a line. Returns `None` for blank lines.
    ///
    /// Command names are case-insensitive; only the first argument is kept.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Command::Message(line.to_owned()));
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::to_owned);
        let command = match name.as_str() {
            "/help" | "/h" => Command::Help,
            "/agents" | "/a" => Command::Agents,
            "/switch" => Command::Switch(arg),
            "/history" | "/hist" => Command::History,
            "/clear" => Command::Clear,
            "/info" => Command::Info,
            "/observe" | "/obs" => Command::Observe,
            "/profile" => Command::Profile,
            "/export" => Command::Export,
            "/report" => Command::Report,
            "/create" => Command::Create,
            "/templates" => Command::Templates,
            "/created" => Command::Created,
            "/load" => Command::Load(arg),
            "/delete" => Command::Delete(arg),
            "/agent-info" => Command::AgentInfo(arg),
            "/quit" | "/q" => Command::Quit,
            _ => Command::Unknown(name),
        };
        Some(command)
    }
}

pub(super) const HELP: &str = "
📋 Available Commands:
  /help or /h          - Show this help message
  /agents or /a        - List available agents
  /switch <agent>      - Switch to different agent
  /history or /hist    - Show conversation history
  /clear               - Clear conversation history
  /info                - Show current agent info
  /observe or /obs     - Toggle detailed observation mode
  /profile             - Show agent performance profile
  /export              - Export conversation to JSON
  /report              - Show observation and conversation reports

🎨 Agent Creation:
  /create              - Create a new agent interactively
  /templates           - List available agent templates
  /created             - List your created agents
  /load <name>         - Load a created agent
  /delete <name>       - Delete a created agent
  /agent-info <name>   - Show detailed info about a created agent

  /quit or /q          - Exit playground
  <message>            - Send message to current agent";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("   "), None);
        assert_eq!(
            Command::parse("  hello /there "),
            Some(Command::Message("hello /there".to_owned()))
        );
        assert_eq!(Command::parse("/H"), Some(Command::Help));
        assert_eq!(Command::parse("/obs"), Some(Command::Observe));
        assert_eq!(
            Command::parse("/switch research extra"),
            Some(Command::Switch(Some("research".to_owned())))
        );
        assert_eq!(Command::parse("/load"), Some(Command::Load(None)));
        assert_eq!(
            Command::parse("/Frobnicate now"),
            Some(Command::Unknown("/frobnicate".to_owned()))
        );
    }
}
