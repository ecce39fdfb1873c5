//! Resolution of an input venue name against a provider candidate catalog.

use tavola_core::{CandidateRecord, MatchKind, MatchResult};

use crate::normalize::normalize;
use crate::similarity::similarity;

/// Tuning for [`resolve`]. The default threshold of 0.85 empirically
/// separates franchise/punctuation variants of the same venue from
/// different venues with similar generic names; operators may override it
/// per run.
#[derive(Debug, Clone, Copy)]
pub struct MatcherConfig {
    pub threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { threshold: 0.85 }
    }
}

/// Picks the best candidate for `input_name` from `catalog`, or reports
/// not-found.
///
/// An exact match requires normalized-name equality against a candidate
/// that carries an external id; the first such candidate wins (catalog
/// order is provider-ranked). Otherwise the highest-similarity candidate is
/// selected when it scores at or above `config.threshold`. An empty catalog
/// or an input that normalizes to nothing resolves to not-found without
/// further processing.
#[must_use]
pub fn resolve(
    input_name: &str,
    catalog: &[CandidateRecord],
    config: &MatcherConfig,
) -> MatchResult {
    let normalized_input = normalize(input_name);
    if catalog.is_empty() || normalized_input.is_empty() {
        return MatchResult::not_found(input_name);
    }

    let normalized_names: Vec<String> = catalog
        .iter()
        .map(|c| normalize(&c.display_name))
        .collect();

    for (candidate, normalized_name) in catalog.iter().zip(&normalized_names) {
        if !candidate.external_id.is_empty() && *normalized_name == normalized_input {
            return MatchResult {
                input_name: input_name.to_string(),
                matched: Some(candidate.clone()),
                score: 1.0,
                kind: MatchKind::Exact,
            };
        }
    }

    let mut best_index = 0;
    let mut best_score = f64::MIN;
    for (index, normalized_name) in normalized_names.iter().enumerate() {
        let score = similarity(&normalized_input, normalized_name);
        // Strict comparison: ties keep the earlier, higher-ranked candidate.
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    if best_score >= config.threshold {
        MatchResult {
            input_name: input_name.to_string(),
            matched: Some(catalog[best_index].clone()),
            score: best_score,
            kind: MatchKind::Fuzzy,
        }
    } else {
        MatchResult::not_found(input_name)
    }
}
