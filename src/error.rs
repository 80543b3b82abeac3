//! Error types for the fgo crate

use thiserror::Error;

/// Result type for fgo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fgo operations
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching a source page failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Source markup could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid crawler or storage configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset could not be persisted or read
    #[error("Storage error: {0}")]
    Storage(String),

    /// A scrape run collected no servants at all
    #[error("No servants were scraped")]
    EmptyScrape,

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
