use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A venue as returned by the place-search provider.
///
/// Created once per API response and treated as immutable; discarded after
/// resolution unless selected as the match. `external_id` is opaque and
/// provider-scoped — the pipeline never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub external_id: String,
    pub display_name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub phone: Option<String>,
    /// Opaque photo tokens in the provider's presentation order.
    pub photo_refs: Vec<String>,
    pub geo: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// How an input name was matched against the candidate catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy,
    NotFound,
}

/// Result of resolving one input name against a candidate catalog.
///
/// Invariants: `Exact` implies `score == 1.0` and a candidate carrying an
/// external id; `NotFound` implies `matched.is_none()` and `score == 0.0`.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub input_name: String,
    pub matched: Option<CandidateRecord>,
    pub score: f64,
    pub kind: MatchKind,
}

impl MatchResult {
    #[must_use]
    pub fn not_found(input_name: &str) -> Self {
        Self {
            input_name: input_name.to_string(),
            matched: None,
            score: 0.0,
            kind: MatchKind::NotFound,
        }
    }

    /// Returns `true` when a candidate was selected (exact or fuzzy).
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }
}

/// A single menu line extracted for a matched venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuLine {
    pub name: String,
    pub description: Option<String>,
    /// Non-negative, scoped by `currency_code`.
    pub price: Decimal,
    pub currency_code: String,
    /// Menu section the line appeared under, when the provider has one.
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// A venue photo extracted for a matched venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenuePhoto {
    pub source_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub is_enhanced: bool,
}

/// Structured content obtained for a matched record. Sequences of these keep
/// the provider's presentation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractedItem {
    MenuLine(MenuLine),
    Photo(VenuePhoto),
}

impl ExtractedItem {
    #[must_use]
    pub fn is_photo(&self) -> bool {
        matches!(self, ExtractedItem::Photo(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_has_zero_score_and_no_record() {
        let result = MatchResult::not_found("Totally Unknown Venue Xyz123");
        assert_eq!(result.kind, MatchKind::NotFound);
        assert!(result.matched.is_none());
        assert!((result.score - 0.0).abs() < f64::EPSILON);
        assert!(!result.is_match());
    }

    #[test]
    fn candidate_record_round_trips_through_json() {
        let record = CandidateRecord {
            external_id: "abc".to_string(),
            display_name: "Trabuxu Bistro".to_string(),
            address: Some("Valletta".to_string()),
            rating: Some(4.5),
            review_count: Some(321),
            phone: None,
            photo_refs: vec!["tok1".to_string()],
            geo: Some(GeoPoint {
                lat: 35.897,
                lng: 14.512,
            }),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CandidateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.external_id, "abc");
        assert_eq!(back.photo_refs, vec!["tok1".to_string()]);
    }
}
