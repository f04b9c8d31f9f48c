//! CLI entry point for the ASIN reviews tool.
//!
//! Fetches rating statistics for a list of ASINs from the product API,
//! prints a table with summary metrics and a star chart, and exports the
//! results to a spreadsheet.

use anyhow::{Context, Result};
use asin_reviews::analyzers::{aggregate, grand_total_record};
use asin_reviews::batch::BatchRunner;
use asin_reviews::config::{AppConfig, AttributeTokens};
use asin_reviews::error::InputError;
use asin_reviews::export::{ExportOutcome, export};
use asin_reviews::fetch::{BasicClient, auth::UrlParam};
use asin_reviews::fetcher::RecordFetcher;
use asin_reviews::output::{render_json, render_metrics, render_star_chart, render_table};
use asin_reviews::overrides::{DEFAULT_OVERRIDE_PATH, OverrideTable};
use asin_reviews::record::collect_identifiers;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "asin_reviews")]
#[command(about = "Fetch and summarize Amazon review ratings for a list of ASINs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch reviews for the given ASINs and export the results
    Fetch(FetchArgs),
    /// Load the override file and list its entries
    CheckOverrides {
        /// Path to the override file
        #[arg(value_name = "PATH", default_value = DEFAULT_OVERRIDE_PATH)]
        path: PathBuf,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// ASINs to fetch
    #[arg(value_name = "ASIN")]
    asins: Vec<String>,

    /// File with one ASIN per line (blank lines ignored)
    #[arg(short = 'f', long)]
    asins_file: Option<PathBuf>,

    /// Override file mapping ASIN to Design/Size
    #[arg(long, default_value = DEFAULT_OVERRIDE_PATH)]
    overrides: PathBuf,

    /// Spreadsheet to write
    #[arg(short, long, default_value = "asin_reviews.xlsx")]
    output: PathBuf,

    /// Amazon marketplace domain
    #[arg(long)]
    marketplace: Option<String>,

    /// Delay after each lookup, in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Specification-name substring marking the Size attribute (repeatable)
    #[arg(long = "size-token")]
    size_tokens: Vec<String>,

    /// Specification-name substring marking the Design attribute (repeatable)
    #[arg(long = "design-token")]
    design_tokens: Vec<String>,

    /// Access password, required when APP_PASSWORD is set
    #[arg(long)]
    password: Option<String>,

    /// Print the run as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Guard must outlive the run so buffered file logs get flushed.
    let _log_guard = init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch(args) => run_fetch(args).await?,
        Commands::CheckOverrides { path } => check_overrides(&path)?,
    }

    Ok(())
}

/// Colored stderr logs plus a JSON daily-rolling log file.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/asin_reviews.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("asin_reviews.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn build_config(args: &FetchArgs) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;
    config.authorize(args.password.as_deref())?;

    if let Some(marketplace) = &args.marketplace {
        config.marketplace = marketplace.clone();
    }
    if let Some(ms) = args.pacing_ms {
        config.pacing = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    config.tokens = AttributeTokens::new(args.size_tokens.clone(), args.design_tokens.clone());
    Ok(config)
}

#[tracing::instrument(skip_all)]
async fn run_fetch(args: FetchArgs) -> Result<()> {
    let config = build_config(&args)?;

    let file_text = match &args.asins_file {
        Some(path) => Some(std::fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.display().to_string(),
            source,
        })?),
        None => None,
    };
    let asins = collect_identifiers(&args.asins, file_text.as_deref())?;

    let overrides = OverrideTable::load(&args.overrides);

    let client = UrlParam::api_key(
        BasicClient::new(config.timeout).context("failed to build HTTP client")?,
        config.api_key.clone(),
    );
    let runner = BatchRunner::new(RecordFetcher::new(client, &config, &overrides), config.pacing);

    info!(
        count = asins.len(),
        marketplace = %config.marketplace,
        overrides = overrides.len(),
        "Fetching reviews"
    );
    let outcome = runner
        .run(&asins, |p| {
            info!(
                done = p.done,
                total = p.total,
                percent = p.fraction() * 100.0,
                "Progress"
            );
        })
        .await;

    if !outcome.failures.is_empty() {
        let failed: Vec<&str> = outcome.failures.iter().map(|f| f.asin.as_str()).collect();
        warn!(count = failed.len(), asins = ?failed, "Some ASINs returned no data");
    }
    if !outcome.unrated.is_empty() {
        let unrated: Vec<&str> = outcome.unrated.iter().map(|a| a.as_str()).collect();
        warn!(count = unrated.len(), asins = ?unrated, "Some ASINs have no usable rating");
    }

    let summary = aggregate(&outcome.records);

    if args.json {
        println!("{}", render_json(&outcome.records, &summary, &outcome.quota)?);
    } else {
        println!("{}", render_table(&outcome.records, &grand_total_record(&summary)));
        println!("{}", render_metrics(&summary, &outcome.quota));
        println!("{}", render_star_chart(&summary.stars));
    }

    match export(&args.output, &outcome.records, &summary, &outcome.quota) {
        Ok(ExportOutcome::Workbook { path }) => {
            info!(path = %path.display(), "Excel export ready");
        }
        Ok(ExportOutcome::CsvFallback { path, warning }) => {
            warn!(path = %path.display(), "{warning}");
        }
        Err(e) => {
            error!(error = %e, "Export failed, results above were not saved");
        }
    }

    Ok(())
}

fn check_overrides(path: &Path) -> Result<()> {
    match OverrideTable::try_load(path) {
        Ok(None) => {
            info!(path = %path.display(), "Override file not found, no overrides will be applied");
        }
        Ok(Some(table)) => {
            for (asin, entry) in table.iter() {
                info!(
                    asin = %asin,
                    design = entry.design.as_deref().unwrap_or(""),
                    size = entry.size.as_deref().unwrap_or(""),
                    "Override"
                );
            }

            let with_design = table.iter().filter(|(_, e)| e.design.is_some()).count();
            let with_size = table.iter().filter(|(_, e)| e.size.is_some()).count();
            info!(
                total = table.len(),
                with_design,
                with_size,
                "Override file summary"
            );
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Override file is malformed and would be ignored");
        }
    }
    Ok(())
}
