//! Database operations for the `establishments` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tavola_core::CandidateRecord;

use crate::DbError;

/// A row from the `establishments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EstablishmentRow {
    pub id: i64,
    /// `NULL` for legacy rows imported without a provider record.
    pub external_id: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts an establishment from a resolved provider record.
///
/// Keyed on `external_id` when the record carries one: conflicts update each
/// field to `COALESCE(EXCLUDED.field, existing)`, so an absent incoming value
/// never nulls out stored data. `name` is always present and always wins.
///
/// A record with an empty external id falls back to a plain insert under the
/// system-assigned key; two such calls with the same name are intentionally
/// NOT merged — duplicate detection is a separate pass, never part of the
/// write path.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_establishment(
    pool: &PgPool,
    record: &CandidateRecord,
) -> Result<i64, DbError> {
    let review_count = record.review_count.and_then(|c| i32::try_from(c).ok());
    let (lat, lng) = match record.geo {
        Some(geo) => (Some(geo.lat), Some(geo.lng)),
        None => (None, None),
    };

    if record.external_id.is_empty() {
        let id: i64 = sqlx::query_scalar::<_, i64>(
            "INSERT INTO establishments (external_id, name, address, phone, rating, review_count, lat, lng) \
             VALUES (NULL, $1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(&record.display_name)
        .bind(&record.address)
        .bind(&record.phone)
        .bind(record.rating)
        .bind(review_count)
        .bind(lat)
        .bind(lng)
        .fetch_one(pool)
        .await?;
        return Ok(id);
    }

    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO establishments (external_id, name, address, phone, rating, review_count, lat, lng) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (external_id) WHERE external_id IS NOT NULL DO UPDATE SET \
             name         = EXCLUDED.name, \
             address      = COALESCE(EXCLUDED.address, establishments.address), \
             phone        = COALESCE(EXCLUDED.phone, establishments.phone), \
             rating       = COALESCE(EXCLUDED.rating, establishments.rating), \
             review_count = COALESCE(EXCLUDED.review_count, establishments.review_count), \
             lat          = COALESCE(EXCLUDED.lat, establishments.lat), \
             lng          = COALESCE(EXCLUDED.lng, establishments.lng), \
             updated_at   = NOW() \
         RETURNING id",
    )
    .bind(&record.external_id)
    .bind(&record.display_name)
    .bind(&record.address)
    .bind(&record.phone)
    .bind(record.rating)
    .bind(review_count)
    .bind(lat)
    .bind(lng)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns the full establishment catalog, ordered by id, for duplicate
/// detection. The catalog is bounded (thousands of rows), so loading it in
/// one read is acceptable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_establishments(pool: &PgPool) -> Result<Vec<EstablishmentRow>, DbError> {
    let rows = sqlx::query_as::<_, EstablishmentRow>(
        "SELECT id, external_id, name, address, phone, rating, review_count, lat, lng, \
                created_at, updated_at \
         FROM establishments \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes the given establishments (and, via `ON DELETE CASCADE`, their
/// items) in a single statement. Used by duplicate-group removal.
///
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_establishments(pool: &PgPool, ids: &[i64]) -> Result<u64, DbError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query("DELETE FROM establishments WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
