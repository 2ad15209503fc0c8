//! Pagination driver
//!
//! Walks the listing at offsets `0, page_size, 2 * page_size, ...`, fanning
//! out each page's stubs before asking for the next one. Stops on an empty
//! page, once `resultsTotal` stubs have been seen, when the job cap is
//! reached, or when the run is cancelled.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::aggregator::{Aggregator, Progress};
use crate::client::JobSource;
use crate::config::ScrapeConfig;
use crate::error::{FetchError, Result, ScrapeError};
use crate::fetcher::DetailFetcher;
use crate::listing::PageResponse;
use crate::record::{JobOutcome, JobRecord};
use crate::scheduler::FanOut;

/// Everything a finished (or cancelled) run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    /// Arrival order: page by page, completion order within a page
    pub outcomes: Vec<JobOutcome>,
    /// Non-empty listing pages processed
    pub pages: usize,
    /// Listing requests issued, retries included
    pub listing_requests: usize,
    pub results_total: Option<usize>,
    pub cancelled: bool,
}

impl ScrapeReport {
    pub fn jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.outcomes.iter().filter_map(JobOutcome::as_job)
    }

    pub fn job_count(&self) -> usize {
        self.jobs().count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// No job was fetched successfully.
    pub fn is_empty(&self) -> bool {
        self.job_count() == 0
    }
}

pub struct Scraper {
    config: ScrapeConfig,
    source: Arc<dyn JobSource>,
    cancel: CancellationToken,
    progress: Option<watch::Sender<Progress>>,
}

impl Scraper {
    pub fn new(config: ScrapeConfig, source: Arc<dyn JobSource>) -> Self {
        Self {
            config,
            source,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Publish a progress snapshot after every page.
    pub fn with_progress(mut self, progress: watch::Sender<Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run the whole scrape. Only listing failures abort it.
    pub async fn run(&self) -> Result<ScrapeReport> {
        self.config.validate()?;

        let regions = self.config.region_filter();
        let page_size = self.config.page_size;
        let fetcher = DetailFetcher::new(self.source.clone(), &self.config, self.cancel.clone());
        let fan_out = FanOut::new(fetcher, self.config.worker_count, self.cancel.clone());
        let mut aggregator = Aggregator::new(self.config.job_cap());

        let mut offset = 0;
        let mut stubs_seen = 0;
        let mut pages = 0;
        let mut listing_requests = 0;
        let mut results_total = None;

        info!(regions = %regions, max_jobs = self.config.max_jobs, page_size, "starting scrape");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let Some(page) = self
                .fetch_listing(offset, &regions, &mut listing_requests)
                .await?
            else {
                break;
            };

            if page.is_last() {
                debug!(offset, "empty listing page, pagination finished");
                break;
            }

            if page.results_total.is_some() {
                results_total = page.results_total;
            }
            aggregator.set_results_total(page.results_total);
            stubs_seen += page.results.len();

            let mut stubs = page.results;
            if let Some(remaining) = aggregator.remaining() {
                if stubs.len() > remaining {
                    debug!(remaining, dropped = stubs.len() - remaining, "truncating page to job cap");
                    stubs.truncate(remaining);
                }
            }

            for outcome in fan_out.dispatch(stubs).await {
                if !aggregator.accept(outcome) {
                    warn!("record arrived after the job cap was reached, dropping it");
                }
            }
            pages += 1;

            let progress = aggregator.progress();
            info!(
                page = pages,
                offset,
                accepted = progress.accepted,
                failed = progress.failed,
                fraction = progress.fraction,
                "page complete"
            );
            if let Some(tx) = &self.progress {
                tx.send_replace(progress);
            }

            if aggregator.is_full() {
                debug!("job cap reached");
                break;
            }
            if results_total.is_some_and(|total| stubs_seen >= total) {
                debug!(stubs_seen, "all listed jobs seen");
                break;
            }

            offset += page_size;
            if !self.pause().await {
                break;
            }
        }

        let cancelled = self.cancel.is_cancelled();
        let refused = aggregator.refused();
        let report = ScrapeReport {
            outcomes: aggregator.finalize(),
            pages,
            listing_requests,
            results_total,
            cancelled,
        };
        info!(
            jobs = report.job_count(),
            failures = report.failure_count(),
            pages = report.pages,
            refused,
            cancelled,
            "scrape finished"
        );
        Ok(report)
    }

    /// One listing page, retried like detail pages. `None` when cancelled.
    #[instrument(skip(self, regions, requests))]
    async fn fetch_listing(
        &self,
        offset: usize,
        regions: &str,
        requests: &mut usize,
    ) -> Result<Option<PageResponse>> {
        let max_attempts = self.config.max_retries.max(1);
        let timeout = self.config.request_timeout;

        let mut attempt = 0;
        loop {
            attempt += 1;
            *requests += 1;

            let fetched = tokio::time::timeout(
                timeout,
                self.source.fetch_page(offset, self.config.page_size, regions),
            )
            .await;
            let result = match fetched {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(timeout)),
            };

            match result {
                Ok(page) => return Ok(Some(page)),
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    warn!(attempt, error = %e, "listing request failed, retrying");
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(self.config.retry_delay) => {}
                    }
                }
                Err(e) => return Err(ScrapeError::Listing { offset, source: e }),
            }
        }
    }

    /// Flat courtesy delay between pages. `false` when cancelled meanwhile.
    async fn pause(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.page_delay) => true,
        }
    }
}
