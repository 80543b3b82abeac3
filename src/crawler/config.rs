//! # Crawler Configuration Module
//!
//! Configuration for a scrape run: where the wiki lives, how much of the
//! identifier space to cover, how politely to fetch and how to read the
//! tables. Uses a builder pattern like the rest of the crate.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration

use std::time::Duration;

use url::Url;

use super::aggregate::DuplicatePolicy;
use super::extraction::{ColumnLayout, RecordShape};
use crate::error::{Error, Result};

/// Root of the wiki the servant lists live under
pub const DEFAULT_BASE_URL: &str = "https://fategrandorder.fandom.com/wiki";

/// Highest servant id known to exist on the wiki
pub const DEFAULT_MAX_ID: u32 = 428;

/// Number of identifiers listed on one sub-page
pub const DEFAULT_WINDOW_SIZE: u32 = 100;

/// Browser identity sent with every request; the wiki rejects bare clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Wiki root, e.g. `https://fategrandorder.fandom.com/wiki`
    pub base_url: String,

    /// Highest identifier to collect
    pub max_id: u32,

    /// Number of records the run is expected to produce; defaults to `max_id`
    pub expected_total: Option<u32>,

    /// Identifiers per source page
    pub window_size: u32,

    /// Minimum milliseconds between the start of two requests
    pub rate_limit_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent to use for requests
    pub user_agent: String,

    /// CSS selector of the data table
    pub table_selector: String,

    /// Which fields to extract
    pub shape: RecordShape,

    /// Where the fields sit in each row
    pub layout: ColumnLayout,

    /// What to do when two rows share an id
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_id: DEFAULT_MAX_ID,
            expected_total: None,
            window_size: DEFAULT_WINDOW_SIZE,
            rate_limit_ms: 1000,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            table_selector: "table.wikitable.sortable".to_string(),
            shape: RecordShape::Minimal,
            layout: ColumnLayout::by_id(),
            duplicate_policy: DuplicatePolicy::KeepFirst,
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the wiki root URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the highest identifier to collect
    pub fn max_id(mut self, max_id: u32) -> Self {
        self.config.max_id = max_id;
        self
    }

    /// Set the number of records the run should produce
    pub fn expected_total(mut self, expected_total: u32) -> Self {
        self.config.expected_total = Some(expected_total);
        self
    }

    /// Set the number of identifiers per source page
    pub fn window_size(mut self, window_size: u32) -> Self {
        self.config.window_size = window_size;
        self
    }

    /// Set the rate limit in milliseconds between requests
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the CSS selector of the data table
    pub fn table_selector(mut self, table_selector: impl Into<String>) -> Self {
        self.config.table_selector = table_selector.into();
        self
    }

    /// Set the record shape
    pub fn shape(mut self, shape: RecordShape) -> Self {
        self.config.shape = shape;
        self
    }

    /// Set the column layout
    pub fn layout(mut self, layout: ColumnLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the duplicate-id policy
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Records the run is expected to produce
    pub fn expected_total(&self) -> u32 {
        self.expected_total.unwrap_or(self.max_id)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::Config("window size must be positive".to_string()));
        }
        if self.rate_limit_ms == 0 {
            return Err(Error::Config(
                "delay between requests must be positive".to_string(),
            ));
        }
        if self.expected_total() > self.max_id {
            return Err(Error::Config(format!(
                "expected total {} exceeds max id {}",
                self.expected_total(),
                self.max_id
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {}", self.base_url, e)))?;
        Ok(())
    }
}
