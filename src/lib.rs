//! Henkel careers scraper
//!
//! Pages through the careers listing endpoint, fetches every job's detail
//! page across a bounded worker pool and normalizes the markup into a fixed
//! record schema:
//! - listing pagination with cap and total-based termination
//! - per-page fan-out with retries and per-attempt timeouts
//! - field extraction from the detail-page markup
//! - CSV / JSON export of the collected records

pub mod aggregator;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetcher;
pub mod listing;
pub mod pagination;
pub mod record;
pub mod scheduler;
pub mod slug;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{Aggregator, Progress};
pub use client::{CareersClient, JobSource};
pub use config::ScrapeConfig;
pub use error::{FetchError, ScrapeError};
pub use extract::extract_job;
pub use fetcher::DetailFetcher;
pub use listing::{JobStub, PageResponse};
pub use pagination::{ScrapeReport, Scraper};
pub use record::{FailureRecord, JobOutcome, JobRecord, EXPORT_COLUMNS};
pub use scheduler::FanOut;
pub use slug::slug;
