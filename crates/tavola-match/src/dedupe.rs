//! Duplicate detection over the stored establishment catalog.
//!
//! Runs as its own pass (`tavola dedupe`), never inside the write path.
//! O(n²) pairwise comparison is acceptable here: the catalog is thousands
//! of rows per invocation, not millions, and this is not a hot path.

use crate::normalize::{default_stoplist, normalize, normalize_for_dedupe};
use crate::similarity::similarity;

/// The slice of a stored establishment that duplicate detection needs.
#[derive(Debug, Clone)]
pub struct DedupeRecord {
    pub id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub address: Option<String>,
}

/// A cluster of confirmed duplicates of `canonical_id`. Groups never
/// overlap within one detector invocation. `reason` describes the first
/// confirming criterion.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub canonical_id: i64,
    pub member_ids: Vec<i64>,
    pub reason: String,
}

/// Thresholds for the pairwise criteria. Defaults follow the resolution
/// tuning: 0.9 name / 0.8 address for the combined criterion, 0.6 address
/// for the exact-name criterion. All overridable per run.
#[derive(Debug, Clone)]
pub struct DedupeConfig {
    pub name_threshold: f64,
    pub address_threshold: f64,
    pub loose_address_threshold: f64,
    pub stoplist: Vec<String>,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            name_threshold: 0.9,
            address_threshold: 0.8,
            loose_address_threshold: 0.6,
            stoplist: default_stoplist(),
        }
    }
}

struct PreparedRecord<'a> {
    record: &'a DedupeRecord,
    stripped_name: String,
    normalized_address: Option<String>,
}

/// Groups `records` into duplicate clusters.
///
/// Criteria per pair, in priority order (first hit wins):
/// 1. both external ids present and equal;
/// 2. stoplisted-name similarity above `name_threshold` AND address
///    similarity above `address_threshold`;
/// 3. exact stoplisted-name equality AND address similarity above
///    `loose_address_threshold`.
///
/// A missing or empty address scores 0.0, so records without an external id
/// and without an address can never be merged on name alone. A name that
/// strips to nothing is likewise unusable for criteria 2 and 3.
///
/// Grouping is a single pass: once a record joins a group it is never
/// re-evaluated as the start of a new one.
#[must_use]
pub fn find_duplicates(records: &[DedupeRecord], config: &DedupeConfig) -> Vec<DuplicateGroup> {
    let prepared: Vec<PreparedRecord<'_>> = records
        .iter()
        .map(|record| PreparedRecord {
            record,
            stripped_name: normalize_for_dedupe(&record.name, &config.stoplist),
            normalized_address: record
                .address
                .as_deref()
                .map(normalize)
                .filter(|a| !a.is_empty()),
        })
        .collect();

    let mut assigned = vec![false; prepared.len()];
    let mut groups = Vec::new();

    for i in 0..prepared.len() {
        if assigned[i] {
            continue;
        }
        let mut member_ids = Vec::new();
        let mut reason: Option<String> = None;

        for j in (i + 1)..prepared.len() {
            if assigned[j] {
                continue;
            }
            if let Some(pair_reason) = duplicate_reason(&prepared[i], &prepared[j], config) {
                assigned[j] = true;
                member_ids.push(prepared[j].record.id);
                reason.get_or_insert(pair_reason);
            }
        }

        if let Some(reason) = reason {
            assigned[i] = true;
            groups.push(DuplicateGroup {
                canonical_id: prepared[i].record.id,
                member_ids,
                reason,
            });
        }
    }

    groups
}

fn duplicate_reason(
    a: &PreparedRecord<'_>,
    b: &PreparedRecord<'_>,
    config: &DedupeConfig,
) -> Option<String> {
    if let (Some(ext_a), Some(ext_b)) = (
        non_empty(a.record.external_id.as_deref()),
        non_empty(b.record.external_id.as_deref()),
    ) {
        if ext_a == ext_b {
            return Some("same external id".to_string());
        }
    }

    if a.stripped_name.is_empty() || b.stripped_name.is_empty() {
        return None;
    }

    let address_score = address_similarity(a, b);

    let name_score = similarity(&a.stripped_name, &b.stripped_name);
    if name_score > config.name_threshold && address_score > config.address_threshold {
        return Some(format!(
            "name similarity {name_score:.2}, address similarity {address_score:.2}"
        ));
    }

    if a.stripped_name == b.stripped_name && address_score > config.loose_address_threshold {
        return Some("exact name, similar address".to_string());
    }

    None
}

/// Address similarity with the missing-address guard: any absent or empty
/// side scores 0.0 so it can never clear a threshold.
fn address_similarity(a: &PreparedRecord<'_>, b: &PreparedRecord<'_>) -> f64 {
    match (&a.normalized_address, &b.normalized_address) {
        (Some(addr_a), Some(addr_b)) => similarity(addr_a, addr_b),
        _ => 0.0,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
