use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use tavola_core::CandidateRecord;
use tavola_provider::{PlaceSearchProvider, ProviderError, RateLimitedClient};

use crate::types::{DetailsResponse, SearchResponse};

/// Client for the place-search REST API.
///
/// Every request goes through the owned [`RateLimitedClient`], so the
/// inter-request delay and retry policy apply uniformly to searches and
/// detail lookups. The API key is supplied at construction (loaded from the
/// environment by the caller) and sent as a query parameter; it is never
/// logged.
pub struct PlacesClient {
    http: Client,
    limiter: RateLimitedClient,
    base_url: Url,
    api_key: Option<String>,
}

impl PlacesClient {
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
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
        limiter: RateLimitedClient,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: exactly one trailing slash so Url::join appends the
        // endpoint instead of replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ProviderError::Malformed {
            context: "places base URL".to_owned(),
            reason: format!("'{base_url}' does not parse: {e}"),
        })?;

        Ok(Self {
            http,
            limiter,
            base_url,
            api_key,
        })
    }

    /// Attempt counters for run-end reporting.
    #[must_use]
    pub fn counters(&self) -> tavola_provider::AttemptCounters {
        self.limiter.counters()
    }

    /// Builds the endpoint URL with percent-encoded query parameters, the
    /// API key included when configured.
    fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ProviderError::Malformed {
                context: format!("places endpoint {endpoint}"),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request, maps HTTP-level failures onto the provider
    /// taxonomy, and parses the body as JSON.
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

    /// Maps the envelope `status` field onto the taxonomy shared by both
    /// endpoints. Returns `Ok(())` for statuses the caller handles itself.
    fn check_envelope(status: &str, message: Option<&str>, context: &str) -> Result<(), ProviderError> {
        match status {
            "ok" | "zero_results" | "not_found" => Ok(()),
            "quota_exceeded" => Err(ProviderError::QuotaExceeded(
                message.unwrap_or("provider quota status").to_owned(),
            )),
            other => Err(ProviderError::Malformed {
                context: context.to_owned(),
                reason: format!(
                    "unrecognized status '{other}': {}",
                    message.unwrap_or("no message")
                ),
            }),
        }
    }
}

#[async_trait]
impl PlaceSearchProvider for PlacesClient {
    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>, ProviderError> {
        let url = self.endpoint_url("search", &[("query", query)])?;
        let body = self
            .limiter
            .execute("places.search", || self.request_json(url.clone()))
            .await?;

        let envelope: SearchResponse =
            serde_json::from_value(body).map_err(|e| ProviderError::Deserialize {
                context: format!("search(query={query})"),
                source: e,
            })?;

        Self::check_envelope(
            &envelope.status,
            envelope.message.as_deref(),
            &format!("search(query={query})"),
        )?;

        Ok(envelope
            .results
            .into_iter()
            .map(CandidateRecord::from)
            .collect())
    }

    async fn details(&self, external_id: &str) -> Result<CandidateRecord, ProviderError> {
        let url = self.endpoint_url("details", &[("id", external_id)])?;
        let body = self
            .limiter
            .execute("places.details", || self.request_json(url.clone()))
            .await?;

        let context = format!("details(id={external_id})");
        let envelope: DetailsResponse =
            serde_json::from_value(body).map_err(|e| ProviderError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        Self::check_envelope(&envelope.status, envelope.message.as_deref(), &context)?;

        match envelope.result {
            Some(result) if envelope.status == "ok" => Ok(CandidateRecord::from(result)),
            _ => Err(ProviderError::NotFound { context }),
        }
    }
}
