//! HTTP implementation of the menu/photo source collaborator, plus the
//! extraction parsing that turns raw venue detail blobs into ordered
//! [`tavola_core::ExtractedItem`] sequences.

mod client;
mod parse;
mod types;

pub use client::MenuClient;
pub use parse::{parse_detail, ExtractionLimits};
pub use types::{MenuEntry, MenuSection, PhotoEntry, VenueDetail, VenueMenu};
