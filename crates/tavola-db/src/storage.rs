//! The persistence seam the reconciliation runner writes through.
//!
//! The runner never talks to `sqlx` directly: it sees only this trait, so
//! tests drive it with an in-memory implementation and the binary hands it
//! a [`PgStorage`] constructed once at process start.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;

use tavola_core::{CandidateRecord, ExtractedItem, RunOutcome};

use crate::{establishments, items, runs, DbError};

/// Idempotent persistence operations plus the run log that drives resume.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upserts the establishment and returns its internal id.
    async fn upsert_establishment(&self, record: &CandidateRecord) -> Result<i64, DbError>;

    /// Replaces the establishment's items; returns the number written.
    async fn replace_items(
        &self,
        establishment_id: i64,
        items: &[ExtractedItem],
    ) -> Result<usize, DbError>;

    /// Creates a run and transitions it to `running`; returns the run id.
    async fn create_run(&self, trigger_source: &str) -> Result<i64, DbError>;

    /// Records the outcome for one input name within a run.
    async fn record_outcome(&self, run_id: i64, outcome: &RunOutcome) -> Result<(), DbError>;

    /// Marks the run `succeeded`.
    async fn complete_run(&self, run_id: i64, names_processed: i32) -> Result<(), DbError>;

    /// Marks the run `failed` with a message.
    async fn fail_run(&self, run_id: i64, error_message: &str) -> Result<(), DbError>;

    /// Returns the subset of `names` that already have a done outcome in
    /// any prior run.
    async fn completed_inputs(&self, names: &[String]) -> Result<HashSet<String>, DbError>;
}

/// Postgres-backed [`Storage`].
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn upsert_establishment(&self, record: &CandidateRecord) -> Result<i64, DbError> {
        establishments::upsert_establishment(&self.pool, record).await
    }

    async fn replace_items(
        &self,
        establishment_id: i64,
        extracted: &[ExtractedItem],
    ) -> Result<usize, DbError> {
        items::replace_items(&self.pool, establishment_id, extracted).await
    }

    async fn create_run(&self, trigger_source: &str) -> Result<i64, DbError> {
        let run = runs::create_reconciliation_run(&self.pool, trigger_source).await?;
        runs::start_reconciliation_run(&self.pool, run.id).await?;
        Ok(run.id)
    }

    async fn record_outcome(&self, run_id: i64, outcome: &RunOutcome) -> Result<(), DbError> {
        runs::upsert_run_input(
            &self.pool,
            run_id,
            &outcome.input_name,
            outcome.status.as_str(),
            outcome.items_written,
            outcome.error.as_deref(),
        )
        .await
    }

    async fn complete_run(&self, run_id: i64, names_processed: i32) -> Result<(), DbError> {
        runs::complete_reconciliation_run(&self.pool, run_id, names_processed).await
    }

    async fn fail_run(&self, run_id: i64, error_message: &str) -> Result<(), DbError> {
        runs::fail_reconciliation_run(&self.pool, run_id, error_message).await
    }

    async fn completed_inputs(&self, names: &[String]) -> Result<HashSet<String>, DbError> {
        let done = runs::completed_input_names(&self.pool, names).await?;
        Ok(done.into_iter().collect())
    }
}
