//! Mock tools for agents: web search, guarded file access, and tabular
//! data helpers.

pub mod data;
mod file_ops;
mod web_search;

pub use data::{DataError, DataStats, DataSummary, Record};
pub use file_ops::{FileInfo, FileOpError, FileOps};
pub use web_search::{SearchResult, WebSearch};
