//! CloudGuard Activity - Cloud Guard problem reporter
//!
//! A CLI tool that lists the problems Cloud Guard detected in a
//! compartment, prints an activity summary and exports the problems
//! to CSV.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Missing compartment, client, fetch or export failure

mod analysis;
mod cli;
mod config;
mod enrich;
mod error;
mod filter;
mod models;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::ActivityFilter;
use source::{CloudGuardClient, ProblemSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        println!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("CloudGuard Activity v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        debug!("Run failed: {:?}", e);
        println!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .cloudguard-activity.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        println!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the command-line verbosity.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the fetch, summarize and export pipeline.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let compartment_id = args.compartment_id()?;

    // Captured once so the window and problem ages agree
    let now = Utc::now();
    let filter = args.to_filter(compartment_id, &config.general, now)?;
    print_search_header(&filter);

    let client =
        CloudGuardClient::new(&config.service).context("Error creating Cloud Guard client")?;
    info!("Using Cloud Guard endpoint {}", client.endpoint());

    let spinner = fetch_spinner(args.quiet);
    let mut problem_source = ProblemSource::new(&client);
    if let Some(ref pb) = spinner {
        problem_source = problem_source.with_progress(pb.clone());
    }

    let fetched = problem_source.fetch(&filter, now).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let mut problems = fetched.context("Error getting detected problems")?;

    if args.newest_first {
        analysis::sort_by_last_detected(&mut problems);
    }

    let mut summary = analysis::summarize(&problems);
    summary.recent.truncate(config.report.recent_count);
    print!(
        "{}",
        report::render_summary(&summary, config.report.description_width)
    );

    if args.summary {
        println!("\nSummary only mode - skipping CSV export");
        return Ok(());
    }

    let output = PathBuf::from(&config.general.output);
    report::export_csv(&problems, &output).context("Error exporting to CSV")?;

    println!("\nActivity report saved to: {}", output.display());
    Ok(())
}

/// Print the search window and the active filters.
fn print_search_header(filter: &ActivityFilter) {
    if let (Some(start), Some(end)) = (filter.start_time, filter.end_time) {
        println!(
            "Searching Cloud Guard activity from {} to {}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
    }
    println!("Compartment: {}", filter.compartment_id);

    if let Some(ref region) = filter.region {
        println!("Region: {}", region);
    }
    if let Some(ref resource_type) = filter.resource_type {
        println!("Resource Type: {}", resource_type);
    }
    if let Some(ref risk_level) = filter.risk_level {
        println!("Risk Level: {}", risk_level);
    }
}

/// Spinner shown while pages are fetched, unless running quietly.
fn fetch_spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} Fetching problems... {msg}")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
