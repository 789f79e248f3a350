//! Web search for reply references

mod duckduckgo;

pub use duckduckgo::DuckDuckGoSearch;

use thiserror::Error;

/// Failure to fetch search results. Never fatal to a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search returned HTTP {0}")]
    Status(u16),
}
