//! Wire types for the place-search API.
//!
//! The pipeline assumes nothing about the provider beyond what maps into a
//! [`CandidateRecord`]; anything extra in the payload is ignored.

use serde::Deserialize;
use tavola_core::{CandidateRecord, GeoPoint};

/// Envelope for `GET /search`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope for `GET /details`.
#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<PlaceResult>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One venue as the provider returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Opaque photo tokens, provider-ranked.
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl From<PlaceResult> for CandidateRecord {
    fn from(result: PlaceResult) -> Self {
        CandidateRecord {
            external_id: result.id,
            display_name: result.name,
            address: result.address,
            rating: result.rating,
            review_count: result.review_count,
            phone: result.phone,
            photo_refs: result.photos,
            geo: result.location.map(|l| GeoPoint {
                lat: l.lat,
                lng: l.lng,
            }),
        }
    }
}
