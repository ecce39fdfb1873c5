use async_trait::async_trait;
use tavola_core::{CandidateRecord, ExtractedItem};

use crate::error::ProviderError;

/// Place-search collaborator. Implementations own their HTTP client and
/// credentials; they are constructed once at process start and passed down.
#[async_trait]
pub trait PlaceSearchProvider: Send + Sync {
    /// Searches for venues matching `query`, in provider-ranked order.
    ///
    /// Zero results is `Ok(vec![])`, not an error.
    ///
    /// # Errors
    ///
    /// [`ProviderError`]; quota exhaustion is fatal to the run, everything
    /// else is scoped to the current item.
    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>, ProviderError>;

    /// Fetches the full record for a known external id.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NotFound`] when the id is unknown to the provider.
    async fn details(&self, external_id: &str) -> Result<CandidateRecord, ProviderError>;
}

/// Menu/photo source collaborator. Returns items already parsed, capped,
/// and normalized — schema variations never leak past this boundary.
#[async_trait]
pub trait MenuSourceProvider: Send + Sync {
    /// Fetches structured content for a matched record.
    ///
    /// An empty vec is a valid, non-exceptional outcome ("the provider has
    /// no data"), distinct from a fetch failure.
    ///
    /// # Errors
    ///
    /// [`ProviderError`] on fetch or parse failure.
    async fn fetch_detail(&self, external_id: &str) -> Result<Vec<ExtractedItem>, ProviderError>;
}
