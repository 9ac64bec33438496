use std::io::IsTerminal;

use owo_colors::OwoColorize;

const BAR_CHAR: &str = "▎";

/// How the playground decorates its output.
///
/// The plain theme prints exactly the text; the terminal theme adds colors
/// and a spinner while an agent is thinking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Theme {
    color: bool,
}

impl Theme {
    /// Undecorated output.
    pub const PLAIN: Theme = Theme { color: false };

    /// Colors when stdout is a terminal.
    pub fn for_stdout() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    /// Whether colors and the spinner are on.
    #[inline]
    pub fn is_decorated(self) -> bool {
        self.color
    }

    pub(super) fn prompt(self, agent: &str) -> String {
        if self.color {
            format!("\n[{}] > ", agent.bright_cyan())
        } else {
            format!("\n[{agent}] > ")
        }
    }

    pub(super) fn reply(self, agent: &str, text: &str) -> String {
        if self.color {
            format!(
                "\n{}🤖 {}: {}",
                BAR_CHAR.bright_cyan(),
                agent.bold(),
                text.bright_white()
            )
        } else {
            format!("\n🤖 {agent}: {text}")
        }
    }

    pub(super) fn error(self, text: &str) -> String {
        if self.color {
            format!("{}", format!("❌ {text}").bright_red())
        } else {
            format!("❌ {text}")
        }
    }

    pub(super) fn observe(self, text: &str) -> String {
        if self.color {
            format!("{}", format!("🔍 [OBSERVE] {text}").dimmed())
        } else {
            format!("🔍 [OBSERVE] {text}")
        }
    }

    /// Awaits `fut`, spinning while it is pending.
    #[cfg(feature = "cli")]
    pub(super) async fn spin<F: Future>(self, fut: F) -> F::Output {
        use std::time::Duration;

        use indicatif::{ProgressBar, ProgressStyle};
        use tokio::time::sleep;

        if !self.color {
            return fut.await;
        }
        let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") else {
            return fut.await;
        };
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        progress_bar.set_message("🤔 Thinking...");

        tokio::pin!(fut);
        loop {
            tokio::select! {
                output = &mut fut => {
                    progress_bar.finish_and_clear();
                    return output;
                }
                _ = sleep(Duration::from_millis(100)) => progress_bar.inc(1),
            }
        }
    }

    #[cfg(not(feature = "cli"))]
    pub(super) async fn spin<F: Future>(self, fut: F) -> F::Output {
        fut.await
    }
}
