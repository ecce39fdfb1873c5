use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use tavola_core::ExtractedItem;
use tavola_provider::{MenuSourceProvider, ProviderError, RateLimitedClient};

use crate::parse::{parse_detail, ExtractionLimits};
use crate::types::VenueDetail;

/// Client for the venue detail endpoint of the menu source.
///
/// Shares the rate-limited call discipline with the places client: one
/// [`RateLimitedClient`] owns pacing and retry for all detail fetches.
pub struct MenuClient {
    http: Client,
    limiter: RateLimitedClient,
    base_url: Url,
    limits: ExtractionLimits,
}

impl MenuClient {
    /// Creates a client for the given base URL (point at a mock server in
    /// tests).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::Malformed`] if `base_url`
    /// does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        limiter: RateLimitedClient,
        limits: ExtractionLimits,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ProviderError::Malformed {
            context: "menus base URL".to_owned(),
            reason: format!("'{base_url}' does not parse: {e}"),
        })?;

        Ok(Self {
            http,
            limiter,
            base_url,
            limits,
        })
    }

    /// Attempt counters for run-end reporting.
    #[must_use]
    pub fn counters(&self) -> tavola_provider::AttemptCounters {
        self.limiter.counters()
    }

    async fn request_json(&self, url: Url) -> Result<serde_json::Value, ProviderError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::QuotaExceeded(format!(
                "HTTP 429 from {}",
                url.path()
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                context: url.path().to_owned(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl MenuSourceProvider for MenuClient {
    /// Fetches and parses the detail blob for `external_id`.
    ///
    /// A 404 means the source simply has no record for the venue; that is
    /// "no items", not a failure, and returns an empty vec.
    async fn fetch_detail(&self, external_id: &str) -> Result<Vec<ExtractedItem>, ProviderError> {
        let url = self
            .base_url
            .join(&format!("venues/{external_id}"))
            .map_err(|e| ProviderError::Malformed {
                context: format!("venues/{external_id}"),
                reason: e.to_string(),
            })?;

        let body = match self
            .limiter
            .execute("menus.fetch_detail", || self.request_json(url.clone()))
            .await
        {
            Ok(body) => body,
            Err(ProviderError::NotFound { .. }) => {
                tracing::debug!(venue = external_id, "no detail record at menu source");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let detail: VenueDetail =
            serde_json::from_value(body).map_err(|e| ProviderError::Deserialize {
                context: format!("venues/{external_id}"),
                source: e,
            })?;

        Ok(parse_detail(external_id, &detail, &self.limits))
    }
}
