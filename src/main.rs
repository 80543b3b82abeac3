//! # fgo CLI Application
//!
//! Command-line front end for the servant catalog:
//!
//! - `scrape`: crawl the wiki and replace the stored dataset
//! - `list`: print stored servants, optionally filtered by class or rarity
//! - `get`: print a single servant by id
//!
//! Lookups that find nothing exit with status 2; other failures exit with 1.

mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use fgo::crawler::{
    ColumnLayout, Coverage, CrawlError, CrawlerConfig, DEFAULT_BASE_URL, DEFAULT_MAX_ID,
    DatasetStore, DuplicatePolicy, HttpFetcher, PageRows, RecordShape, ScrapeReporter, SourcePage,
};
use fgo::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{instrument, warn};

/// Exit status for lookups that found nothing
const EXIT_NOT_FOUND: u8 = 2;

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(author, version, about = "Scrape and query the Fate/Grand Order servant catalog", long_about = None)]
struct Cli {
    /// Write logs to <DIR>/fgo.log instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape the wiki and save the servant dataset
    Scrape(ScrapeArgs),

    /// List stored servants
    List(ListArgs),

    /// Show a stored servant by id
    Get(GetArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Highest servant id to collect
    #[arg(short, long, default_value_t = DEFAULT_MAX_ID)]
    max_id: u32,

    /// Number of servants expected (defaults to max id)
    #[arg(short, long)]
    expected: Option<u32>,

    /// Servant ids per wiki page
    #[arg(short, long, default_value = "100")]
    window: u32,

    /// Minimum delay between requests in milliseconds
    #[arg(short, long, default_value = "1000")]
    delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "30")]
    timeout_secs: u64,

    /// Fields to extract (minimal|full)
    #[arg(short, long, default_value = "full", value_parser = ["minimal", "full"])]
    shape: String,

    /// Table layout (by-id|servant-list)
    #[arg(short, long, default_value = "by-id", value_parser = ["by-id", "servant-list"])]
    layout: String,

    /// On duplicate ids keep the last row seen instead of the first
    #[arg(long)]
    keep_last: bool,

    /// Wiki root URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Dataset file to write
    #[arg(short, long, default_value = "data/servants.json")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only servants of this class
    #[arg(short, long)]
    class: Option<String>,

    /// Only servants of this rarity
    #[arg(short, long)]
    rarity: Option<u8>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Dataset file to read
    #[arg(short, long, default_value = "data/servants.json")]
    data: PathBuf,
}

#[derive(Args, Debug)]
struct GetArgs {
    /// Servant id
    #[arg(required = true)]
    id: u32,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Dataset file to read
    #[arg(short, long, default_value = "data/servants.json")]
    data: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse command line arguments
    let cli = Cli::parse();

    match &cli.log_dir {
        Some(dir) => telemetry::init_file_logging(dir)?,
        None => telemetry::init_tracing_subscriber(),
    }

    match cli.command {
        Some(Commands::Scrape(args)) => scrape_command(args).await,
        Some(Commands::List(args)) => list_command(args).await,
        Some(Commands::Get(args)) => get_command(args).await,
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["fgo", "--help"]);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Drives an indicatif bar from pipeline events
struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pages {msg}")?
                .progress_chars("##-"),
        );
        Ok(Self { bar })
    }
}

impl ScrapeReporter for ProgressReporter {
    fn run_started(&self, pages: &[SourcePage]) {
        self.bar.set_length(pages.len() as u64);
    }

    fn page_finished(&self, page: &SourcePage, rows: &PageRows) {
        self.bar.set_message(format!(
            "{}-{}: {} servants",
            page.start,
            page.end,
            rows.records.len()
        ));
        self.bar.inc(1);
    }

    fn page_failed(&self, page: &SourcePage, error: &CrawlError) {
        self.bar
            .println(format!("Skipped {}-{}: {}", page.start, page.end, error));
        self.bar.inc(1);
    }

    fn run_finished(&self, coverage: &Coverage) {
        self.bar.finish_with_message(format!(
            "{} of {} servants",
            coverage.collected, coverage.expected
        ));
    }
}

fn parse_shape(shape: &str) -> RecordShape {
    match shape {
        "minimal" => RecordShape::Minimal,
        _ => RecordShape::Full,
    }
}

fn parse_layout(layout: &str) -> ColumnLayout {
    match layout {
        "servant-list" => ColumnLayout::servant_list(),
        _ => ColumnLayout::by_id(),
    }
}

#[instrument]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<ExitCode> {
    let mut builder = CrawlerConfig::builder()
        .base_url(args.base_url)
        .max_id(args.max_id)
        .window_size(args.window)
        .rate_limit_ms(args.delay_ms)
        .timeout_secs(args.timeout_secs)
        .shape(parse_shape(&args.shape))
        .layout(parse_layout(&args.layout))
        .duplicate_policy(if args.keep_last {
            DuplicatePolicy::KeepLast
        } else {
            DuplicatePolicy::KeepFirst
        });
    if let Some(expected) = args.expected {
        builder = builder.expected_total(expected);
    }
    let config = builder.build();

    let fetcher = HttpFetcher::new(&config)?;
    let store = DatasetStore::at(&args.output);
    let reporter = ProgressReporter::new()?;

    println!("Scraping servants 1-{}...", config.max_id);

    // dropping the scrape future discards everything collected so far
    let outcome = tokio::select! {
        result = fgo::crawler::scrape_servants(&fetcher, &config, &reporter) => result?,
        _ = tokio::signal::ctrl_c() => {
            reporter.bar.abandon_with_message("interrupted");
            warn!("Scrape interrupted, {} left untouched", store.path().display());
            eprintln!("Interrupted; existing dataset left untouched");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };
    // the save itself is never raced against Ctrl-C
    fgo::crawler::persist_outcome(&store, &outcome).await?;

    let coverage = &outcome.aggregate.coverage;
    println!(
        "Saved {} servants to {}",
        outcome.aggregate.dataset.len(),
        store.path().display()
    );
    if let Some(warning) = coverage.warning() {
        println!("Warning: {}", warning);
        if !coverage.missing_ids.is_empty() {
            println!("Missing ids: {:?}", coverage.missing_ids);
        }
    }
    for failure in &outcome.failed_pages {
        println!("Failed page {}: {}", failure.page.url, failure.error);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_servant(servant: &ServantRecord) {
    let class = servant.class.as_deref().unwrap_or("-");
    match servant.rarity {
        Some(rarity) => println!("{:>4}  {}  ({}, {}★)", servant.id, servant.name, class, rarity),
        None if servant.class.is_some() => {
            println!("{:>4}  {}  ({})", servant.id, servant.name, class)
        }
        None => println!("{:>4}  {}", servant.id, servant.name),
    }
}

fn not_found(err: QueryError) -> ExitCode {
    eprintln!("{}", err);
    ExitCode::from(EXIT_NOT_FOUND)
}

#[instrument]
async fn list_command(args: ListArgs) -> anyhow::Result<ExitCode> {
    let service = QueryService::new(DatasetStore::at(&args.data));
    let filter = ServantFilter {
        class: args.class,
        rarity: args.rarity,
    };

    let servants = match service.filter(&filter).await {
        Ok(servants) => servants,
        Err(e) => return Ok(not_found(e)),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&servants)?);
    } else {
        for servant in &servants {
            print_servant(servant);
        }
        if !filter.is_empty() {
            println!("{} matching servants", servants.len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[instrument]
async fn get_command(args: GetArgs) -> anyhow::Result<ExitCode> {
    let service = QueryService::new(DatasetStore::at(&args.data));

    let servant = match service.get_by_id(args.id).await {
        Ok(servant) => servant,
        Err(e) => return Ok(not_found(e)),
    };

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&servant)
            .map_err(|e| anyhow!("failed to encode servant {}: {}", args.id, e))?;
        println!("{}", json);
    } else {
        print_servant(&servant);
    }

    Ok(ExitCode::SUCCESS)
}
