//! # Servant Crawler Module
//!
//! Collects the servant catalog from the wiki's "Servant List by ID" pages and
//! turns it into one ordered dataset. It is the whole write side of the crate:
//! the query module only ever reads what this module saved.
//!
//! ## Key Components
//!
//! - `PagePlanner`: splits the id space into list pages
//! - `HttpFetcher`: rate-limited page retrieval behind the `PageSource` trait
//! - `TableExtractor`: reads records from a page's sortable table
//! - `aggregate`: merges page batches, orders and deduplicates them
//! - `DatasetStore`: persists the result as JSON
//! - `scrape_servants` / `run_scrape`: the sequential pipeline tying them together
//!
//! ## Failure model
//!
//! Pages are fetched one after another. A page that cannot be fetched or has
//! no table is skipped, a row that cannot be read is skipped, and a short
//! dataset only produces a coverage warning. The only error that ends a run
//! is failing to save the result.

mod aggregate;
mod config;
mod error;
mod extraction;
mod fetcher;
mod planner;
pub mod rules;
pub mod storage;

pub use aggregate::{Aggregate, Coverage, CoverageWarning, DuplicatePolicy, aggregate};
pub use config::{
    CrawlerConfig, CrawlerConfigBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_ID, DEFAULT_USER_AGENT,
    DEFAULT_WINDOW_SIZE,
};
pub use error::{CrawlError, FetchError, ParseError, RowError};
pub use extraction::{ColumnLayout, IdSource, MIN_CELLS, PageRows, RecordShape, TableExtractor};
pub use fetcher::{HttpFetcher, PageSource};
pub use planner::{Listing, PagePlanner, SourcePage, window_offsets};
pub use storage::{DatasetStore, StorageConfig, StorageError};

use tracing::{Instrument, error, info, info_span, instrument, warn};

use crate::error::{Error, Result};

/// Receives progress of a scrape run
///
/// The pipeline calls these hooks in order; what gets shown to a user is up to
/// the implementation. All methods default to doing nothing.
pub trait ScrapeReporter {
    /// Called once with every page the run will visit
    fn run_started(&self, _pages: &[SourcePage]) {}

    fn page_finished(&self, _page: &SourcePage, _rows: &PageRows) {}

    /// Called for a page that was skipped
    fn page_failed(&self, _page: &SourcePage, _error: &CrawlError) {}

    fn run_finished(&self, _coverage: &Coverage) {}
}

/// Reporter that only writes tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ScrapeReporter for TracingReporter {
    fn run_started(&self, pages: &[SourcePage]) {
        info!("Visiting {} pages", pages.len());
    }

    fn page_finished(&self, page: &SourcePage, rows: &PageRows) {
        info!(
            "Page {}-{}: {} servants, {} rows skipped",
            page.start,
            page.end,
            rows.records.len(),
            rows.rejected.len()
        );
    }

    fn page_failed(&self, page: &SourcePage, error: &CrawlError) {
        warn!("Page {}-{} skipped: {}", page.start, page.end, error);
    }

    fn run_finished(&self, coverage: &Coverage) {
        info!(
            "Collected {} of {} servants",
            coverage.collected, coverage.expected
        );
    }
}

/// A page that contributed nothing to the dataset
#[derive(Debug)]
pub struct PageFailure {
    pub page: SourcePage,
    pub error: CrawlError,
}

/// Everything a scrape run produced
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub aggregate: Aggregate,
    pub failed_pages: Vec<PageFailure>,
    pub rejected_rows: usize,
}

async fn scrape_page<S: PageSource>(
    source: &S,
    extractor: &TableExtractor,
    page: &SourcePage,
    max_id: u32,
) -> std::result::Result<PageRows, CrawlError> {
    let markup = source.fetch(&page.url).await?;
    Ok(extractor.try_extract(&markup, page.start, max_id)?)
}

/// Visit every planned page in order and aggregate what was found
///
/// Only an invalid configuration fails; page and row problems end up in the
/// outcome and the reporter.
#[instrument(skip_all, fields(max_id = config.max_id))]
pub async fn scrape_servants<S, R>(
    source: &S,
    config: &CrawlerConfig,
    reporter: &R,
) -> Result<ScrapeOutcome>
where
    S: PageSource,
    R: ScrapeReporter + ?Sized,
{
    config.validate()?;
    let extractor = TableExtractor::from_config(config)?;
    let pages = PagePlanner::new(&config.base_url, config.window_size)
        .plan_listing(config.layout.listing, config.max_id);

    info!("Starting servant scrape of {} pages", pages.len());
    reporter.run_started(&pages);

    let mut batches = Vec::with_capacity(pages.len());
    let mut failed_pages = Vec::new();
    let mut rejected_rows = 0;

    for page in pages {
        let span = info_span!("page", start = page.start, url = %page.url);
        match scrape_page(source, &extractor, &page, config.max_id)
            .instrument(span)
            .await
        {
            Ok(rows) => {
                reporter.page_finished(&page, &rows);
                rejected_rows += rows.rejected.len();
                batches.push(rows.records);
            }
            Err(e) => {
                warn!("Skipping page {}: {}", page.url, e);
                reporter.page_failed(&page, &e);
                failed_pages.push(PageFailure { page, error: e });
            }
        }
    }

    let aggregate = aggregate(batches, config.expected_total(), config.duplicate_policy);
    reporter.run_finished(&aggregate.coverage);
    info!(
        "Scrape finished: {} servants, {} pages failed, {} rows skipped",
        aggregate.dataset.len(),
        failed_pages.len(),
        rejected_rows
    );

    Ok(ScrapeOutcome {
        aggregate,
        failed_pages,
        rejected_rows,
    })
}

/// Scrape and replace the stored dataset
///
/// A run that found nothing leaves the previous file in place.
pub async fn run_scrape<S, R>(
    source: &S,
    config: &CrawlerConfig,
    store: &DatasetStore,
    reporter: &R,
) -> Result<ScrapeOutcome>
where
    S: PageSource,
    R: ScrapeReporter + ?Sized,
{
    let outcome = scrape_servants(source, config, reporter).await?;
    persist_outcome(store, &outcome).await?;
    Ok(outcome)
}

/// Save a finished run's dataset
///
/// An empty dataset is refused and the previous file stays in place.
pub async fn persist_outcome(store: &DatasetStore, outcome: &ScrapeOutcome) -> Result<()> {
    if outcome.aggregate.dataset.is_empty() {
        error!("No servants were scraped, keeping {}", store.path().display());
        return Err(Error::EmptyScrape);
    }

    store.save(&outcome.aggregate.dataset).await?;
    Ok(())
}
