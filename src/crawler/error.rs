//! Error types for the crawler module
//!
//! Everything here except a store write failure is soft: the pipeline logs it,
//! reports it and keeps going.

use crate::error::Error as CrateError;
use thiserror::Error;

/// Failure to retrieve a single source page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or transport failure, including timeouts
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body cannot be handed to the extractor
    #[error("unusable body from {url}: {reason}")]
    Body { url: String, reason: String },
}

impl FetchError {
    /// URL of the page that failed
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. } => url,
        }
    }
}

/// Failure to interpret a page's markup as a servant table
#[derive(Debug, Error)]
pub enum ParseError {
    /// No table matched the configured selector
    #[error("no table matching '{selector}' found")]
    MissingTable { selector: String },

    /// A configured CSS selector is invalid
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}

/// A single table row that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("row {row}: {found} cells, at least {required} required")]
    TooFewCells {
        row: usize,
        found: usize,
        required: usize,
    },

    #[error("row {row}: identifier '{value}' is not an integer")]
    InvalidId { row: usize, value: String },

    #[error("row {row}: identifier {id} exceeds maximum {max_id}")]
    BeyondRange { row: usize, id: u32, max_id: u32 },

    #[error("row {row}: empty name")]
    EmptyName { row: usize },

    #[error("row {row}: empty class")]
    EmptyClass { row: usize },
}

/// Error for a page that produced no rows, for whatever reason
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        CrateError::Fetch(err.to_string())
    }
}

impl From<ParseError> for CrateError {
    fn from(err: ParseError) -> Self {
        CrateError::Parse(err.to_string())
    }
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Fetch(e) => e.into(),
            CrawlError::Parse(e) => e.into(),
        }
    }
}
