//! Detail page fetching with bounded retries
//!
//! Each attempt is one timed-out request followed by extraction. Errors stay
//! inside: after the last attempt the stub is turned into a `FailureRecord`,
//! so callers always get exactly one `JobOutcome` back.

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::client::JobSource;
use crate::config::ScrapeConfig;
use crate::error::FetchError;
use crate::extract::extract_job;
use crate::listing::JobStub;
use crate::record::{FailureRecord, JobOutcome, JobRecord};

#[derive(Clone)]
pub struct DetailFetcher {
    source: Arc<dyn JobSource>,
    company: String,
    max_retries: u32,
    retry_delay: Duration,
    request_timeout: Duration,
    cancel: CancellationToken,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn JobSource>, config: &ScrapeConfig, cancel: CancellationToken) -> Self {
        Self {
            source,
            company: config.company.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay,
            request_timeout: config.request_timeout,
            cancel,
        }
    }

    /// Fetch and extract one job, retrying any failed attempt.
    #[instrument(skip(self, stub), fields(job_id = %stub.id))]
    pub async fn fetch_detail(&self, stub: &JobStub) -> JobOutcome {
        let url = match self.source.detail_url(&stub.link) {
            Ok(url) => url,
            Err(e) => {
                warn!(link = %stub.link, error = %e, "unusable job link");
                return failure(stub, format!("Invalid job link: {}", e));
            }
        };

        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            match self.attempt(&url, stub).await {
                Ok(job) => {
                    debug!(attempt, "detail page extracted");
                    return JobOutcome::Job(job);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        warn!(attempt, error = %e, "detail fetch failed, retrying");
                        tokio::select! {
                            _ = self.cancel.cancelled() => {
                                return failure(
                                    stub,
                                    format!("Cancelled after {} attempts: {}", attempt, e),
                                );
                            }
                            _ = tokio::time::sleep(self.retry_delay) => {}
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
        warn!(url = %url, error = %cause, "giving up on detail page");
        failure(
            stub,
            format!("Failed after {} attempts: {}", self.max_retries, cause),
        )
    }

    async fn attempt(&self, url: &Url, stub: &JobStub) -> Result<JobRecord, FetchError> {
        let html = tokio::time::timeout(self.request_timeout, self.source.fetch_detail(url))
            .await
            .map_err(|_| FetchError::Timeout(self.request_timeout))??;
        Ok(parse_detail(&html, stub, &self.company, url))
    }
}

fn parse_detail(html: &str, stub: &JobStub, company: &str, url: &Url) -> JobRecord {
    let document = Html::parse_document(html);
    extract_job(&document, stub, company, url)
}

fn failure(stub: &JobStub, error: String) -> JobOutcome {
    JobOutcome::Failure(FailureRecord {
        name: stub.title.clone(),
        error,
    })
}
