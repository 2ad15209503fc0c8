//! HTTP access to the careers site
//!
//! `JobSource` is the seam between the pipeline and the network: the
//! pagination driver asks it for listing pages, the detail fetcher for
//! detail page bodies. `CareersClient` is the reqwest implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::config::ScrapeConfig;
use crate::error::{FetchError, Result, ScrapeError};
use crate::listing::PageResponse;

#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch one listing page starting at `offset`.
    async fn fetch_page(
        &self,
        offset: usize,
        page_size: usize,
        regions: &str,
    ) -> Result<PageResponse, FetchError>;

    /// Fetch the raw HTML of a detail page.
    async fn fetch_detail(&self, url: &Url) -> Result<String, FetchError>;

    /// Absolute detail URL for a stub link.
    fn detail_url(&self, link: &str) -> Result<Url, FetchError>;
}

/// Listing and detail requests against the live site.
#[derive(Debug, Clone)]
pub struct CareersClient {
    http: reqwest::Client,
    base_url: Url,
    listing_url: String,
    region_filter_key: String,
}

impl CareersClient {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ScrapeError::InvalidConfig(format!("base_url: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        let referer = HeaderValue::from_str(&config.referer())
            .map_err(|e| ScrapeError::InvalidConfig(format!("referer: {}", e)))?;
        headers.insert(REFERER, referer);
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ScrapeError::InvalidConfig(format!("user_agent: {}", e)))?;
        headers.insert(USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ScrapeError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            listing_url: config.listing_url(),
            region_filter_key: config.region_filter_key.clone(),
        })
    }

    async fn get_text(&self, request: reqwest::RequestBuilder) -> Result<String, FetchError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl JobSource for CareersClient {
    async fn fetch_page(
        &self,
        offset: usize,
        page_size: usize,
        regions: &str,
    ) -> Result<PageResponse, FetchError> {
        debug!(offset, page_size, regions, "requesting listing page");
        let start_index = offset.to_string();
        let load_count = page_size.to_string();
        let query = [
            ("Career_Level_18682", ""),
            ("Functional_Area_18674", ""),
            ("Digital_1030670", ""),
            (self.region_filter_key.as_str(), regions),
            ("search_filter", ""),
            ("startIndex", start_index.as_str()),
            ("loadCount", load_count.as_str()),
            ("ignoreDefaultFilterTags", "true"),
        ];

        let body = self
            .get_text(self.http.get(&self.listing_url).query(&query))
            .await?;
        PageResponse::from_json(&body)
    }

    async fn fetch_detail(&self, url: &Url) -> Result<String, FetchError> {
        debug!(%url, "requesting detail page");
        self.get_text(self.http.get(url.clone())).await
    }

    fn detail_url(&self, link: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(link.trim())
            .map_err(|e| FetchError::MalformedResponse(format!("bad job link {:?}: {}", link, e)))
    }
}
