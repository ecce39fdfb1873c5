//! Wire types for the venue detail endpoint.
//!
//! ## Observed schema variations
//!
//! ### Prices
//! Two shapes occur across source feeds: a decimal string (`"price":
//! "4.50"`) and integer minor units (`"price_cents": 450`). When both are
//! present, minor units win — they are the less ambiguous form. Currency
//! may be absent; lines default to EUR at parse time.
//!
//! ### Sections
//! Section names are optional. A missing name still groups its items; the
//! lines simply carry no category.
//!
//! ### Photos
//! `enhanced` marks provider-side retouched images; absent means `false`.

use serde::Deserialize;

/// Top-level response from `GET /venues/{id}`.
#[derive(Debug, Deserialize)]
pub struct VenueDetail {
    #[serde(default)]
    pub menu: Option<VenueMenu>,
    #[serde(default)]
    pub photos: Vec<PhotoEntry>,
}

#[derive(Debug, Deserialize)]
pub struct VenueMenu {
    #[serde(default)]
    pub sections: Vec<MenuSection>,
}

#[derive(Debug, Deserialize)]
pub struct MenuSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<MenuEntry>,
}

/// A single menu line as the provider returns it.
#[derive(Debug, Deserialize)]
pub struct MenuEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Decimal-string price, e.g. `"4.50"`.
    #[serde(default)]
    pub price: Option<String>,
    /// Integer minor-units price, e.g. `450`.
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoEntry {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub enhanced: bool,
}
