//! A provider-neutral protocol for talking to LLMs.
//!
//! Agents only see the types in this crate, so a model provider can be
//! swapped (a hosted API, an offline echo model, a scripted test double)
//! without touching the agent loop.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod model_id;
mod provider;
mod request;
mod response;

pub use error::*;
pub use model_id::*;
pub use provider::*;
pub use request::*;
pub use response::*;
