use std::io::{self, Write};

use agent_land_core::{DepsType, OutputType};

use super::config::{AgentConfig, ToolConfig, ToolKind};
use super::store::{AgentStore, is_valid_name, is_valid_tool_name};
use super::templates::{AgentTemplate, BLANK_TEMPLATE, TEMPLATES};
use crate::helpers::title_case;
use crate::playground::LineSource;

/// Models offered by the wizard; the first one is the default.
pub static MODEL_CHOICES: [&str; 3] = [
    "openai:gpt-4o",
    "openai:gpt-3.5-turbo",
    "anthropic:claude-3-sonnet",
];

const DEPS_CHOICES: [DepsType; 4] = [
    DepsType::Base,
    DepsType::Chat,
    DepsType::Research,
    DepsType::Data,
];

enum Abort {
    Cancelled,
    Io(io::Error),
}

impl From<io::Error> for Abort {
    fn from(err: io::Error) -> Self {
        Abort::Io(err)
    }
}

struct Prompter<'a, L, W> {
    lines: &'a mut L,
    out: &'a mut W,
}

impl<L: LineSource, W: Write> Prompter<'_, L, W> {
    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    async fn ask_raw(&mut self, prompt: &str) -> Result<String, Abort> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        self.lines.read_line().await.ok_or(Abort::Cancelled)
    }

    async fn ask(&mut self, prompt: &str) -> Result<String, Abort> {
        Ok(self.ask_raw(prompt).await?.trim().to_owned())
    }

    async fn confirm(&mut self, prompt: &str) -> Result<bool, Abort> {
        Ok(self.ask(prompt).await?.eq_ignore_ascii_case("y"))
    }

    async fn multiline(&mut self, prompt: &str) -> Result<String, Abort> {
        self.say(prompt)?;
        self.say("(Enter text, then press Enter on empty line to finish)")?;
        let mut lines = vec![];
        loop {
            let line = self.ask_raw("  ").await?;
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    /// Asks for a 1-based choice among `options`, returning `current` on an
    /// empty or invalid answer.
    async fn choose<T: Copy + PartialEq>(
        &mut self,
        prompt: &str,
        options: &[(T, &str)],
        current: T,
    ) -> Result<T, Abort> {
        for (i, (value, name)) in options.iter().enumerate() {
            let marker = if *value == current { " (current)" } else { "" };
            writeln!(self.out, "   {}. {name}{marker}", i + 1)?;
        }
        let answer = self.ask(prompt).await?;
        Ok(pick(options, &answer).map_or(current, |(value, _)| *value))
    }
}

fn pick<'a, T>(options: &'a [T], answer: &str) -> Option<&'a T> {
    let index = answer.parse::<usize>().ok()?.checked_sub(1)?;
    options.get(index)
}

/// Walks the operator through creating an agent, then saves it in `store`.
///
/// Returns the new configuration, or `None` if the operator gave an invalid
/// answer or the input ended. Only failures to write prompts are errors.
pub async fn create_agent_interactive<L, W>(
    store: &mut AgentStore,
    lines: &mut L,
    out: &mut W,
) -> io::Result<Option<AgentConfig>>
where
    L: LineSource,
    W: Write,
{
    let mut prompter = Prompter { lines, out };
    match run(store, &mut prompter).await {
        Ok(config) => Ok(config),
        Err(Abort::Cancelled) => {
            prompter.say("\n❌ Agent creation cancelled")?;
            Ok(None)
        }
        Err(Abort::Io(err)) => Err(err),
    }
}

async fn run<L: LineSource, W: Write>(
    store: &mut AgentStore,
    p: &mut Prompter<'_, L, W>,
) -> Result<Option<AgentConfig>, Abort> {
    p.say("🎨 Agent Creation Wizard")?;
    p.say(&"=".repeat(40))?;

    p.say("\n1. Choose a starting point:")?;
    p.say("   0. Create from scratch")?;
    for (i, template) in TEMPLATES.iter().enumerate() {
        p.say(&format!("   {}. {} template", i + 1, title_case(template.name)))?;
    }
    let choice = p
        .ask(&format!("\nEnter choice (0-{}): ", TEMPLATES.len()))
        .await?;
    let template: &AgentTemplate = if choice == "0" {
        &BLANK_TEMPLATE
    } else {
        let Some(template) = pick(&TEMPLATES, &choice) else {
            p.say("❌ Invalid choice")?;
            return Ok(None);
        };
        p.say(&format!("\n✅ Using {} template", template.name))?;
        template
    };

    p.say("\n2. Agent Configuration")?;
    let name = p.ask("Agent name (e.g., 'my_helper'): ").await?;
    if !is_valid_name(&name) {
        p.say("❌ Invalid agent name. Use letters, numbers, and underscores only.")?;
        return Ok(None);
    }
    if store.contains(&name) {
        p.say(&format!("❌ Agent '{name}' already exists"))?;
        return Ok(None);
    }

    p.say("\n3. Agent Instructions")?;
    let instructions = if template.instructions.is_empty() {
        p.multiline("Enter agent instructions:").await?
    } else {
        p.say(&format!("Template instructions: {}", template.instructions))?;
        if p.confirm("Use template instructions? (y/n): ").await? {
            template.instructions.to_owned()
        } else {
            p.multiline("Enter custom instructions:").await?
        }
    };

    p.say("\n4. Model Selection")?;
    for (i, model) in MODEL_CHOICES.iter().enumerate() {
        p.say(&format!("   {}. {model}", i + 1))?;
    }
    let answer = p
        .ask(&format!("Choose model (1-{}) [1]: ", MODEL_CHOICES.len()))
        .await?;
    let model = pick(&MODEL_CHOICES, &answer).unwrap_or(&MODEL_CHOICES[0]);

    p.say("\n5. Dependencies Type")?;
    let options = DEPS_CHOICES.map(|ty| (ty, ty.name()));
    let deps_type = p
        .choose(
            &format!("Choose dependencies (1-{}) [current]: ", options.len()),
            &options,
            template.deps_type,
        )
        .await?;

    p.say("\n6. Output Type")?;
    let options = OutputType::ALL.map(|ty| (ty, ty.name()));
    let output_type = p
        .choose(
            &format!("Choose output type (1-{}) [current]: ", options.len()),
            &options,
            template.output_type,
        )
        .await?;

    p.say("\n7. Tools (optional)")?;
    let mut config = AgentConfig::new(&name, instructions)
        .with_model(*model)
        .with_deps_type(deps_type)
        .with_output_type(output_type);
    if !template.suggested_tools.is_empty() {
        p.say(&format!(
            "Suggested tools for this template: {}",
            template.suggested_tools.join(", ")
        ))?;
        if p.confirm("Add suggested tools? (y/n): ").await? {
            config.tools.extend(template.suggested_tool_configs());
        }
    }
    while p.confirm("Add a custom tool? (y/n): ").await? {
        if let Some(tool) = custom_tool(p).await? {
            config.tools.push(tool);
        }
    }

    p.say("\n8. Creating Agent...")?;
    match store.create(config.clone()).await {
        Ok(path) => {
            p.say(&format!("✅ Successfully created agent '{name}'!"))?;
            p.say(&format!("📄 Configuration saved to {}", path.display()))?;
            Ok(Some(config))
        }
        Err(err) => {
            error!("agent creation error: {err}");
            p.say(&format!("❌ Error creating agent: {err}"))?;
            Ok(None)
        }
    }
}

async fn custom_tool<L: LineSource, W: Write>(
    p: &mut Prompter<'_, L, W>,
) -> Result<Option<ToolConfig>, Abort> {
    p.say("\n🔧 Custom Tool Creation")?;

    let name = p.ask("Tool name: ").await?;
    if !is_valid_tool_name(&name) {
        p.say("❌ Invalid tool name")?;
        return Ok(None);
    }

    let mut description = p.ask("Tool description: ").await?;
    if description.is_empty() {
        description = format!("Custom tool: {name}");
    }

    p.say("\nTool type:")?;
    p.say("1. Echo (returns input)")?;
    p.say("2. Format (text formatting)")?;
    p.say("3. Counter (simple counter)")?;
    let kind = match p.ask("Choose type (1-3): ").await?.as_str() {
        "2" => ToolKind::Format,
        "3" => ToolKind::Counter,
        _ => ToolKind::Echo,
    };

    Ok(Some(ToolConfig::new(name, description, kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground::ScriptedLines;

    async fn run_script(store: &mut AgentStore, script: &[&str]) -> (Option<AgentConfig>, String) {
        let mut lines = ScriptedLines::new(script.iter().copied());
        let mut out = vec![];
        let config = create_agent_interactive(store, &mut lines, &mut out)
            .await
            .unwrap();
        (config, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_from_template() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AgentStore::new(dir.path());
        let script = [
            "3",          // researcher
            "digger",     // name
            "y",          // template instructions
            "3",          // anthropic model
            "",           // keep deps
            "1",          // AgentResult
            "y",          // suggested tools
            "y",          // custom tool
            "shout",
            "",
            "2",
            "n",
        ];
        let (config, output) = run_script(&mut store, &script).await;
        let config = config.unwrap();

        assert_eq!(config.name, "digger");
        assert_eq!(config.model, "anthropic:claude-3-sonnet");
        assert_eq!(config.deps_type, DepsType::Research);
        assert_eq!(config.output_type, OutputType::AgentResult);
        assert_eq!(config.instructions, TEMPLATES[2].instructions);
        let tools: Vec<_> = config.tools.iter().map(|t| (t.name.as_str(), t.kind)).collect();
        assert_eq!(
            tools,
            [
                ("echo_tool", ToolKind::Echo),
                ("counter", ToolKind::Counter),
                ("shout", ToolKind::Format),
            ]
        );
        assert_eq!(config.tools[2].description, "Custom tool: shout");

        assert!(output.contains("\n✅ Using researcher template\n"));
        assert!(output.contains("   3. ResearchDependencies (current)\n"));
        assert!(output.contains("✅ Successfully created agent 'digger'!"));
        assert!(store.contains("digger"));
    }

    #[tokio::test]
    async fn test_reserved_tool_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AgentStore::new(dir.path());
        let script = ["0", "closer", "Wrap up.", "", "", "", "", "y", "final_result", "n"];
        let (config, output) = run_script(&mut store, &script).await;

        assert!(config.unwrap().tools.is_empty());
        assert!(output.contains("❌ Invalid tool name"));
        assert!(store.contains("closer"));
    }

    #[tokio::test]
    async fn test_from_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AgentStore::new(dir.path());
        let script = ["0", "blank", "  Line one", "Line two", "", "", "9", "", "n"];
        let (config, output) = run_script(&mut store, &script).await;
        let config = config.unwrap();

        assert_eq!(config.instructions, "  Line one\nLine two");
        assert_eq!(config.model, MODEL_CHOICES[0]);
        assert_eq!(config.deps_type, DepsType::Base);
        assert_eq!(config.output_type, OutputType::AgentResult);
        assert!(config.tools.is_empty());
        assert!(output.contains("(Enter text, then press Enter on empty line to finish)"));
        assert!(!output.contains("Suggested tools"));
    }

    #[tokio::test]
    async fn test_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AgentStore::new(dir.path());

        let (config, output) = run_script(&mut store, &["7"]).await;
        assert!(config.is_none());
        assert!(output.ends_with("❌ Invalid choice\n"));

        let (config, output) = run_script(&mut store, &["1", "no spaces"]).await;
        assert!(config.is_none());
        assert!(output.contains("❌ Invalid agent name."));

        store
            .create(AgentConfig::new("taken", "x"))
            .await
            .unwrap();
        let (_, output) = run_script(&mut store, &["1", "taken"]).await;
        assert!(output.contains("❌ Agent 'taken' already exists"));

        let (config, output) = run_script(&mut store, &["1", "fresh"]).await;
        assert!(config.is_none());
        assert!(output.ends_with("\n❌ Agent creation cancelled\n"));
        assert!(!store.contains("fresh"));
    }
}
