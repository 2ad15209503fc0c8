//! Command-line entry point: scrape the careers site and export the jobs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use henkel_jobs::export::{self, ExportFormat};
use henkel_jobs::{telemetry, CareersClient, Progress, ScrapeConfig, Scraper};

#[derive(Parser)]
#[command(name = "henkel-jobs")]
#[command(about = "Scrape Henkel job postings into a CSV or JSON export")]
struct Cli {
    /// Config file (toml, yaml or json); defaults to ./henkel_jobs.* if present
    #[arg(long)]
    config: Option<String>,

    /// Region to include, repeatable (Europe, Latin America, North America, Asia-Pacific)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Maximum number of jobs to collect, 0 for all
    #[arg(long)]
    max_jobs: Option<usize>,

    /// Concurrent detail page fetches
    #[arg(long)]
    workers: Option<usize>,

    /// Jobs requested per listing page
    #[arg(long)]
    page_size: Option<usize>,

    /// Output file
    #[arg(short, long, default_value = "henkel_jobs.csv")]
    output: PathBuf,

    /// Output format, guessed from the output extension when omitted
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,
}

impl Cli {
    fn apply(&self, config: &mut ScrapeConfig) {
        if !self.regions.is_empty() {
            config.regions = self.regions.clone();
        }
        if let Some(max_jobs) = self.max_jobs {
            config.max_jobs = max_jobs;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let mut config =
        ScrapeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let client = CareersClient::new(&config).context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, finishing in-flight requests");
            ctrl_c.cancel();
        }
    });

    let (progress_tx, mut progress_rx) = watch::channel(Progress::default());
    let reporter = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let progress = *progress_rx.borrow_and_update();
            info!(
                "Progress: {:.0}% ({} jobs, {} failed)",
                progress.fraction * 100.0,
                progress.accepted,
                progress.failed
            );
        }
    });

    let scraper = Scraper::new(config, Arc::new(client))
        .with_cancellation(cancel)
        .with_progress(progress_tx);
    let report = scraper.run().await.context("Scrape failed")?;
    drop(scraper);
    let _ = reporter.await;

    if report.is_empty() {
        warn!("No jobs found.");
        return Ok(());
    }

    let format = cli
        .format
        .unwrap_or_else(|| ExportFormat::from_path(&cli.output));
    export::write_file(&report.outcomes, &cli.output, format)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    info!(
        "Found {} jobs ({} failed) -> {}",
        report.job_count(),
        report.failure_count(),
        cli.output.display()
    );
    if report.cancelled {
        warn!("Run was cancelled, the export is partial");
    }
    Ok(())
}
