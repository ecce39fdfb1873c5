//! HTTP implementation of the place-search collaborator.

mod client;
mod types;

pub use client::PlacesClient;
pub use types::{DetailsResponse, PlaceResult, SearchResponse};
