use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{PlatformListingsResponse, PlatformRestaurant};

/// Maximum number of pages to fetch for one area before returning an error.
/// Prevents infinite loops when the platform misreports `totalPages`.
const MAX_PAGES: usize = 50;

/// Page size requested from the platform.
const PAGE_LIMIT: u32 = 50;

/// HTTP client for the delivery platform's area-listings endpoint.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. Transient errors (429, network failures) are automatically
/// retried with exponential backoff up to `max_retries` additional attempts.
pub struct ListingsClient {
    client: Client,
    /// Base URL of the platform API, without a trailing slash.
    base_url: String,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl ListingsClient {
    /// Creates a `ListingsClient` with configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for retriable errors (429, network errors). Set to `0` to
    /// disable retries.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse as an
    ///   absolute http(s) URL.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed (e.g., invalid TLS config).
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches one page of listings for an area, with automatic retry on
    /// transient errors.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ScraperError::NotFound`] — HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`] — any other non-2xx status (not retried).
    /// - [`ScraperError::Http`] — network or TLS failure after all retries exhausted.
    /// - [`ScraperError::Deserialize`] — response body is not valid JSON or
    ///   does not match the expected shape (not retried).
    pub async fn fetch_listings_page(
        &self,
        area_slug: &str,
        page: u32,
    ) -> Result<PlatformListingsResponse, ScraperError> {
        let url = self.listings_url(area_slug, page);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let area_slug = area_slug.to_owned();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        url,
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<PlatformListingsResponse>(&body).map_err(|e| {
                    ScraperError::Deserialize {
                        context: format!("listings page {page} for area {area_slug}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    /// Fetches every listing for an area by walking its pages.
    ///
    /// Starts at page 1 and follows the platform's `totalPages` counter until
    /// the last page has been collected. `inter_request_delay_ms` is applied
    /// between page requests (never before the first).
    ///
    /// A single page failure aborts the whole area: partial snapshots would
    /// make the stored data look like restaurants disappeared.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_listings_page`]. Returns
    /// [`ScraperError::PaginationLimit`] if the page count exceeds [`MAX_PAGES`].
    pub async fn fetch_area(
        &self,
        area_slug: &str,
        inter_request_delay_ms: u64,
    ) -> Result<Vec<PlatformRestaurant>, ScraperError> {
        let mut all: Vec<PlatformRestaurant> = Vec::new();
        let mut page = 1u32;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(ScraperError::PaginationLimit {
                    area: area_slug.to_owned(),
                    max_pages: MAX_PAGES,
                });
            }

            if page > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            let response = self.fetch_listings_page(area_slug, page).await?;
            let total_pages = response.total_pages;
            all.extend(response.restaurants);

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!(area = area_slug, listings = all.len(), pages = page_count, "fetched area");
        Ok(all)
    }

    /// Builds the listings URL for an area and page.
    fn listings_url(&self, area_slug: &str, page: u32) -> String {
        format!(
            "{}/v2/areas/{area_slug}/restaurants?page={page}&limit={PAGE_LIMIT}",
            self.base_url
        )
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
