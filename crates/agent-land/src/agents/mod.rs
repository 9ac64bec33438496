//! Ready-made example agents.
//!
//! Each function builds an agent for the given model identifier, talking
//! through the given client.

mod analyst;
mod chat;
mod research;
mod template;

pub use analyst::data_analyst;
pub use chat::simple_chat;
pub use research::research_agent;
pub use template::template_agent;
