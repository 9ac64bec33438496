//! Log output for the CLI.
//!
//! The console gets terse lines on stderr so they don't mix with the
//! playground output; the log file, when configured, gets detailed lines
//! appended.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as layer_fmt};

use crate::settings::Settings;

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(settings: &Settings) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(settings)));

    let console = layer_fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let file = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError {
                    path: path.clone(),
                    source,
                })?;
            Some(
                layer_fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(())
}

fn default_directive(settings: &Settings) -> String {
    if settings.debug {
        "debug".to_owned()
    } else {
        settings.log_level.to_ascii_lowercase()
    }
}

/// The log file could not be opened.
#[derive(Debug)]
pub struct LoggingError {
    path: PathBuf,
    source: io::Error,
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot open log file {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl StdError for LoggingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}
