//! The `dedupe` command: report duplicate clusters in the establishment
//! catalog and, with `--apply`, remove the non-canonical members.

use sqlx::PgPool;

use tavola_core::AppConfig;
use tavola_match::{default_stoplist, find_duplicates, DedupeConfig, DedupeRecord};

/// Detect (and optionally remove) duplicate establishments.
///
/// Detection never runs inside the write path — this is the separate pass
/// that owns merging decisions. Without `--apply` it only reports.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read or a delete fails.
pub(crate) async fn run_dedupe(
    pool: &PgPool,
    config: &AppConfig,
    apply: bool,
) -> anyhow::Result<()> {
    let rows = tavola_db::list_establishments(pool).await?;
    let records: Vec<DedupeRecord> = rows
        .iter()
        .map(|row| DedupeRecord {
            id: row.id,
            external_id: row.external_id.clone(),
            name: row.name.clone(),
            address: row.address.clone(),
        })
        .collect();

    let dedupe_config = DedupeConfig {
        name_threshold: config.dedupe_name_threshold,
        address_threshold: config.dedupe_address_threshold,
        loose_address_threshold: config.dedupe_loose_address_threshold,
        stoplist: default_stoplist(),
    };
    let groups = find_duplicates(&records, &dedupe_config);

    if groups.is_empty() {
        println!(
            "no duplicate establishments found across {} records",
            records.len()
        );
        return Ok(());
    }

    let mut duplicate_count = 0usize;
    for group in &groups {
        duplicate_count += group.member_ids.len();
        let members = group
            .member_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "establishment {} duplicates [{}] — {}",
            group.canonical_id, members, group.reason
        );
    }
    println!(
        "{} duplicate establishments across {} groups",
        duplicate_count,
        groups.len()
    );

    if apply {
        let mut removed = 0u64;
        for group in &groups {
            removed += tavola_db::delete_establishments(pool, &group.member_ids).await?;
            tracing::info!(
                canonical_id = group.canonical_id,
                members = group.member_ids.len(),
                reason = %group.reason,
                "removed duplicate group members"
            );
        }
        println!("removed {removed} duplicate establishments (items cascade)");
    } else {
        println!("re-run with --apply to remove the duplicates");
    }

    Ok(())
}
