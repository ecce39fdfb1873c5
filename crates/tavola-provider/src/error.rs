use thiserror::Error;

/// The four-way classification the orchestrator branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Retryable: network failures, HTTP 5xx.
    Transient,
    /// Fatal to the whole run; never retried.
    QuotaExceeded,
    /// Expected and non-fatal; yields a not-found resolution.
    NotFound,
    /// Undeserializable or provider-reported error body; non-fatal per item.
    Malformed,
}

/// Errors surfaced by provider clients.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider signalled quota exhaustion (HTTP 429 or an explicit
    /// quota status in the response envelope).
    #[error("provider quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The provider has no record for the requested id.
    #[error("no provider record for {context}")]
    NotFound { context: String },

    /// The provider reported an application-level error.
    #[error("provider error for {context}: {reason}")]
    Malformed { context: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other non-2xx HTTP status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

impl ProviderError {
    /// Maps the concrete error onto the taxonomy.
    ///
    /// HTTP-level errors are transient only when retrying can plausibly
    /// change the outcome: timeouts, connection failures, and 5xx statuses.
    /// Everything else at the HTTP layer is treated as malformed.
    #[must_use]
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Http(e) => {
                if e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
                {
                    ProviderErrorKind::Transient
                } else {
                    ProviderErrorKind::Malformed
                }
            }
            ProviderError::UnexpectedStatus { status, .. } => {
                if *status >= 500 {
                    ProviderErrorKind::Transient
                } else {
                    ProviderErrorKind::Malformed
                }
            }
            ProviderError::QuotaExceeded(_) => ProviderErrorKind::QuotaExceeded,
            ProviderError::NotFound { .. } => ProviderErrorKind::NotFound,
            ProviderError::Malformed { .. } | ProviderError::Deserialize { .. } => {
                ProviderErrorKind::Malformed
            }
        }
    }

    /// Returns `true` for errors worth retrying after a back-off delay.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        self.kind() == ProviderErrorKind::Transient
    }
}
