//! Database operations for `menu_items` and `venue_photos`.

use sqlx::PgPool;

use tavola_core::ExtractedItem;

use crate::DbError;

/// Replaces an establishment's items with the given extracted sequence.
///
/// One transaction per establishment: existing rows are deleted and the new
/// ones inserted in presentation order, so a crash mid-write never leaves a
/// half-updated item set. Re-running with the same input produces the same
/// end state.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement in the transaction fails; the
/// transaction rolls back and the previous item set stays intact.
pub async fn replace_items(
    pool: &PgPool,
    establishment_id: i64,
    items: &[ExtractedItem],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM menu_items WHERE establishment_id = $1")
        .bind(establishment_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM venue_photos WHERE establishment_id = $1")
        .bind(establishment_id)
        .execute(&mut *tx)
        .await?;

    let mut menu_position: i32 = 0;
    let mut photo_position: i32 = 0;

    for item in items {
        match item {
            ExtractedItem::MenuLine(line) => {
                sqlx::query(
                    "INSERT INTO menu_items \
                         (establishment_id, position, name, description, price, \
                          currency_code, category, image_url) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(establishment_id)
                .bind(menu_position)
                .bind(&line.name)
                .bind(&line.description)
                .bind(line.price)
                .bind(&line.currency_code)
                .bind(&line.category)
                .bind(&line.image_url)
                .execute(&mut *tx)
                .await?;
                menu_position += 1;
            }
            ExtractedItem::Photo(photo) => {
                let width = photo.width.and_then(|w| i32::try_from(w).ok());
                let height = photo.height.and_then(|h| i32::try_from(h).ok());
                sqlx::query(
                    "INSERT INTO venue_photos \
                         (establishment_id, position, source_url, width, height, is_enhanced) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(establishment_id)
                .bind(photo_position)
                .bind(&photo.source_url)
                .bind(width)
                .bind(height)
                .bind(photo.is_enhanced)
                .execute(&mut *tx)
                .await?;
                photo_position += 1;
            }
        }
    }

    tx.commit().await?;

    Ok(items.len())
}
