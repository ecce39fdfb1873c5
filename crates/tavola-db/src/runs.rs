//! Database operations for `reconciliation_runs` and
//! `reconciliation_run_inputs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `reconciliation_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReconciliationRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub names_processed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `reconciliation_run_inputs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunInputRow {
    pub id: i64,
    pub run_id: i64,
    pub input_name: String,
    pub status: String,
    pub items_written: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// reconciliation_runs operations
// ---------------------------------------------------------------------------

/// Creates a new reconciliation run in `queued` status.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_reconciliation_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<ReconciliationRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ReconciliationRunRow>(
        "INSERT INTO reconciliation_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING id, public_id, trigger_source, status, started_at, completed_at, \
                   names_processed, error_message, created_at",
    )
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_reconciliation_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE reconciliation_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded`, sets `completed_at = NOW()` and
/// `names_processed`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_reconciliation_run(
    pool: &PgPool,
    id: i64,
    names_processed: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE reconciliation_runs \
         SET status = 'succeeded', completed_at = NOW(), names_processed = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(names_processed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, sets `completed_at = NOW()` and `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_reconciliation_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE reconciliation_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_reconciliation_run(
    pool: &PgPool,
    id: i64,
) -> Result<ReconciliationRunRow, DbError> {
    let row = sqlx::query_as::<_, ReconciliationRunRow>(
        "SELECT id, public_id, trigger_source, status, started_at, completed_at, \
                names_processed, error_message, created_at \
         FROM reconciliation_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reconciliation_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ReconciliationRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ReconciliationRunRow>(
        "SELECT id, public_id, trigger_source, status, started_at, completed_at, \
                names_processed, error_message, created_at \
         FROM reconciliation_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// reconciliation_run_inputs operations
// ---------------------------------------------------------------------------

/// Inserts or updates the per-input outcome row for a run.
///
/// Conflicts on `(run_id, input_name)` update `status`, `items_written`,
/// and `error_message` in place — a resumed run overwrites its own earlier
/// failure rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_run_input(
    pool: &PgPool,
    run_id: i64,
    input_name: &str,
    status: &str,
    items_written: i32,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO reconciliation_run_inputs \
             (run_id, input_name, status, items_written, error_message) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (run_id, input_name) DO UPDATE SET \
             status        = EXCLUDED.status, \
             items_written = EXCLUDED.items_written, \
             error_message = EXCLUDED.error_message",
    )
    .bind(run_id)
    .bind(input_name)
    .bind(status)
    .bind(items_written)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns all per-input outcome rows for a given run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_run_inputs(pool: &PgPool, run_id: i64) -> Result<Vec<RunInputRow>, DbError> {
    let rows = sqlx::query_as::<_, RunInputRow>(
        "SELECT id, run_id, input_name, status, items_written, error_message, created_at \
         FROM reconciliation_run_inputs \
         WHERE run_id = $1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the subset of `names` that already have a done outcome in any
/// prior run. Resume skips these; computing the set across all runs (not
/// just the latest) keeps chained resumes from reprocessing earlier
/// successes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn completed_input_names(
    pool: &PgPool,
    names: &[String],
) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT input_name \
         FROM reconciliation_run_inputs \
         WHERE input_name = ANY($1) \
           AND status IN ('matched', 'not_found', 'extraction_empty')",
    )
    .bind(names)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
