//! # fgo - Fate/Grand Order servant catalog
//!
//! This crate scrapes the servant list from the Fate/Grand Order wiki, turns
//! it into an ordered, deduplicated dataset, stores it as a JSON file and
//! answers lookups against that file.
//!
//! ## Features
//!
//! - Page planning over the wiki's "Servant List by ID" sub-pages
//! - Rate-limited fetching with a fixed browser identity and request timeout
//! - Table extraction driven by a declared record shape and column layout
//! - Aggregation with duplicate handling and coverage reporting
//! - Atomic dataset persistence
//! - Read-only query service by id, class and rarity
//!
//! ## Example
//!
//! ```rust,no_run
//! use fgo::crawler::{CrawlerConfig, DatasetStore, HttpFetcher, RecordShape, TracingReporter};
//!
//! #[tokio::main]
//! async fn main() -> fgo::prelude::Result<()> {
//!     let config = CrawlerConfig::builder().shape(RecordShape::Full).build();
//!     let fetcher = HttpFetcher::new(&config)?;
//!     let store = DatasetStore::new();
//!
//!     let outcome = fgo::crawler::run_scrape(&fetcher, &config, &store, &TracingReporter).await?;
//!     println!("Saved {} servants", outcome.aggregate.dataset.len());
//!     Ok(())
//! }
//! ```

mod error;

pub mod crawler;
pub mod query;
pub mod servant;

pub use error::Error;
pub use servant::{Dataset, ServantRecord};

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::query::{QueryError, QueryService, ServantFilter};
    pub use crate::servant::{Dataset, ServantRecord};
}
