//! A playground for LLM agents: example agents, mock tools, an agent
//! builder, observers and an interactive command-line session.
//!
//! The crate includes a CLI for using in the terminal. The modules can also
//! be used as a library to bring the agents and tools into your own apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod agents;
pub mod builder;
pub mod helpers;
#[cfg(feature = "cli")]
pub mod logging;
pub mod observer;
pub mod patterns;
pub mod playground;
pub mod providers;
pub mod settings;
pub mod tools;
pub mod tracker;

/// Re-exports of [`agent_land_core`] crate.
pub mod core {
    pub use agent_land_core::*;
}
