//! The agent playground in the terminal.

use agent_land::logging;
use agent_land::playground::{Playground, StdinLines, Theme};
use agent_land::providers::ModelFactory;
use agent_land::settings::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("❌ {err}");
            return;
        }
    };
    if let Err(err) = logging::init(&settings) {
        eprintln!("❌ {err}");
        return;
    }

    let factory = ModelFactory::from_settings(&settings);
    let playground = Playground::new(&settings, factory, StdinLines::new(), std::io::stdout())
        .with_theme(Theme::for_stdout());
    if let Err(err) = playground.run().await {
        eprintln!("❌ Unexpected error: {err}");
    }
}
