//! Scripted `JobSource` for pipeline tests
//!
//! Serves canned listing pages and synthetic detail pages, and records how
//! it was called: listing requests, detail attempts per link and the peak
//! number of detail fetches in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::client::JobSource;
use crate::error::FetchError;
use crate::listing::{JobStub, PageResponse};

pub(crate) fn stub(i: usize) -> JobStub {
    JobStub {
        id: i.to_string(),
        title: format!("Job {}", i),
        location: format!("City {}, Country, Region", i),
        link: format!("/careers/jobs/{}", i),
    }
}

/// `count` stubs numbered from `start`.
pub(crate) fn stubs(start: usize, count: usize) -> Vec<JobStub> {
    (start..start + count).map(stub).collect()
}

/// Pages of `page_size` stubs, `pages` of them, numbered consecutively.
pub(crate) fn full_pages(pages: usize, page_size: usize, total: Option<usize>) -> Vec<PageResponse> {
    (0..pages)
        .map(|p| PageResponse {
            results: stubs(p * page_size, page_size),
            results_total: total,
        })
        .collect()
}

#[derive(Default)]
pub(crate) struct ScriptedSource {
    pages: Vec<PageResponse>,
    page_size: usize,
    detail_delay: Duration,
    slow_links: HashMap<String, Duration>,
    fail_first: HashMap<String, usize>,
    failing_listing_offset: Option<usize>,
    listing_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    attempts: Mutex<HashMap<String, usize>>,
    offsets: Mutex<Vec<usize>>,
}

impl ScriptedSource {
    /// Listing pages indexed by `offset / page_size`; past the end the
    /// source answers with an empty page.
    pub(crate) fn new(pages: Vec<PageResponse>, page_size: usize) -> Self {
        Self {
            pages,
            page_size,
            ..Self::default()
        }
    }

    pub(crate) fn with_detail_delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }

    pub(crate) fn with_slow_link(mut self, link: &str, delay: Duration) -> Self {
        self.slow_links.insert(link.to_string(), delay);
        self
    }

    /// The first `failures` attempts at `link` fail with HTTP 503.
    pub(crate) fn failing_first(mut self, link: &str, failures: usize) -> Self {
        self.fail_first.insert(link.to_string(), failures);
        self
    }

    /// Listing requests at `offset` always fail with HTTP 500.
    pub(crate) fn failing_listing_at(mut self, offset: usize) -> Self {
        self.failing_listing_offset = Some(offset);
        self
    }

    pub(crate) fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn attempts(&self, link: &str) -> usize {
        let path = format!("https://careers.test{}", link);
        self.attempts
            .lock()
            .unwrap()
            .get(&path)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn offsets(&self) -> Vec<usize> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSource for ScriptedSource {
    async fn fetch_page(
        &self,
        offset: usize,
        _page_size: usize,
        _regions: &str,
    ) -> Result<PageResponse, FetchError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.offsets.lock().unwrap().push(offset);

        if self.failing_listing_offset == Some(offset) {
            return Err(FetchError::HttpStatus {
                status: 500,
                url: format!("https://careers.test/listing?startIndex={}", offset),
            });
        }

        let index = offset / self.page_size.max(1);
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn fetch_detail(&self, url: &Url) -> Result<String, FetchError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let delay = self
            .slow_links
            .get(url.path())
            .copied()
            .unwrap_or(self.detail_delay);
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failures = self.fail_first.get(url.path()).copied().unwrap_or(0);
        if attempt <= failures {
            return Err(FetchError::HttpStatus {
                status: 503,
                url: url.to_string(),
            });
        }

        Ok(format!(
            r#"<html><body>
                <div class="job-detail__content-description"><p>Details for {}</p></div>
            </body></html>"#,
            url.path()
        ))
    }

    fn detail_url(&self, link: &str) -> Result<Url, FetchError> {
        Url::parse("https://careers.test")
            .and_then(|base| base.join(link))
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}
