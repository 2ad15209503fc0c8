//! Run configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! config file, then `HENKEL_JOBS__*` environment variables. The CLI applies
//! its own overrides on top of the loaded value.

use std::time::Duration;

use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ScrapeError};

/// Region names the listing endpoint is known to understand.
pub const KNOWN_REGIONS: &[&str] = &["Europe", "Latin America", "North America", "Asia-Pacific"];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Settings for one scrape run. Immutable once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Region names, comma-joined into the region filter parameter
    pub regions: Vec<String>,
    /// Global cap on collected records, 0 = unbounded
    pub max_jobs: usize,
    /// Stubs requested per listing call (`loadCount`)
    pub page_size: usize,
    /// Detail fetches allowed in flight at once
    pub worker_count: usize,
    /// Attempts per request, including the first
    pub max_retries: u32,
    #[serde(rename = "retry_delay_ms", with = "duration_ms")]
    pub retry_delay: Duration,
    /// Courtesy pause between listing pages
    #[serde(rename = "page_delay_ms", with = "duration_ms")]
    pub page_delay: Duration,
    #[serde(rename = "request_timeout_ms", with = "duration_ms")]
    pub request_timeout: Duration,
    pub base_url: String,
    pub listing_path: String,
    pub referer_path: String,
    pub region_filter_key: String,
    pub company: String,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            regions: vec!["Europe".to_string()],
            max_jobs: 50,
            page_size: 10,
            worker_count: 10,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            page_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            base_url: "https://www.henkel.com".to_string(),
            listing_path: "/ajax/collection/en/34828-34828/queryresults/asJson".to_string(),
            referer_path: "/careers/jobs-and-application".to_string(),
            region_filter_key: "Locations_279384".to_string(),
            company: "Henkel".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Load from defaults, `henkel_jobs.*` (or `path`) and the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like `load`, reading `HENKEL_JOBS__*` variables from `env` instead of
    /// the process environment when given.
    pub fn load_with_env(path: Option<&str>, env: Option<Map<String, String>>) -> Result<Self> {
        let defaults = Self::default();
        let file = match path {
            Some(p) => File::with_name(p).required(true),
            None => File::with_name("henkel_jobs").required(false),
        };

        let settings = Config::builder()
            .set_default("regions", defaults.regions.clone())?
            .set_default("max_jobs", defaults.max_jobs as u64)?
            .set_default("page_size", defaults.page_size as u64)?
            .set_default("worker_count", defaults.worker_count as u64)?
            .set_default("max_retries", defaults.max_retries as u64)?
            .set_default("retry_delay_ms", defaults.retry_delay.as_millis() as u64)?
            .set_default("page_delay_ms", defaults.page_delay.as_millis() as u64)?
            .set_default(
                "request_timeout_ms",
                defaults.request_timeout.as_millis() as u64,
            )?
            .set_default("base_url", defaults.base_url)?
            .set_default("listing_path", defaults.listing_path)?
            .set_default("referer_path", defaults.referer_path)?
            .set_default("region_filter_key", defaults.region_filter_key)?
            .set_default("company", defaults.company)?
            .set_default("user_agent", defaults.user_agent)?
            .add_source(file)
            .add_source(
                Environment::with_prefix("HENKEL_JOBS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("regions")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ScrapeError::InvalidConfig("page_size must be at least 1".into()));
        }
        if self.worker_count == 0 {
            return Err(ScrapeError::InvalidConfig(
                "worker_count must be at least 1".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ScrapeError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            ScrapeError::InvalidConfig(format!("base_url {:?}: {}", self.base_url, e))
        })?;

        for region in &self.regions {
            if !KNOWN_REGIONS.contains(&region.as_str()) {
                warn!(region = %region, "unknown region, passing it through unchanged");
            }
        }
        Ok(())
    }

    /// Regions in the form the listing endpoint expects.
    pub fn region_filter(&self) -> String {
        let mut seen: Vec<&str> = Vec::with_capacity(self.regions.len());
        for region in &self.regions {
            let region = region.trim();
            if !region.is_empty() && !seen.contains(&region) {
                seen.push(region);
            }
        }
        seen.join(",")
    }

    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.listing_path)
    }

    pub fn referer(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.referer_path)
    }

    /// Effective cap, `None` when unbounded.
    pub fn job_cap(&self) -> Option<usize> {
        (self.max_jobs > 0).then_some(self.max_jobs)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
