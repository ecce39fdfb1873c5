//! Parsing of raw venue detail blobs into ordered extracted items.
//!
//! All schema normalization happens here; nothing downstream ever sees a
//! minor-units price or an unparseable line.

use rust_decimal::Decimal;

use tavola_core::{ExtractedItem, MenuLine, VenuePhoto};

use crate::types::{MenuEntry, VenueDetail};

/// Currency assumed when the provider omits one.
const DEFAULT_CURRENCY: &str = "EUR";

/// Caps on persisted volume per venue.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    pub max_menu_items: usize,
    pub max_photos: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_menu_items: 100,
            max_photos: 5,
        }
    }
}

/// Flattens a venue detail blob into extracted items: menu lines first
/// (sections in order, section name as category), then photos. Both
/// sequences keep the provider's presentation order and are capped by
/// `limits`.
///
/// Lines whose price cannot be normalized to a non-negative decimal are
/// skipped with a warning — one bad line must not discard the rest of the
/// menu. An entirely empty blob produces an empty vec, which is a valid
/// outcome.
#[must_use]
pub fn parse_detail(
    external_id: &str,
    detail: &VenueDetail,
    limits: &ExtractionLimits,
) -> Vec<ExtractedItem> {
    let mut items = Vec::new();

    if let Some(menu) = &detail.menu {
        'sections: for section in &menu.sections {
            for entry in &section.items {
                if items.len() >= limits.max_menu_items {
                    tracing::debug!(
                        venue = external_id,
                        max_menu_items = limits.max_menu_items,
                        "menu line cap reached; dropping remaining lines"
                    );
                    break 'sections;
                }
                let Some(price) = normalize_price(entry) else {
                    tracing::warn!(
                        venue = external_id,
                        line = %entry.name,
                        "skipping menu line with missing or invalid price"
                    );
                    continue;
                };
                items.push(ExtractedItem::MenuLine(MenuLine {
                    name: entry.name.clone(),
                    description: entry.description.clone(),
                    price,
                    currency_code: entry
                        .currency
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                    category: section.name.clone(),
                    image_url: entry.image_url.clone(),
                }));
            }
        }
    }

    for photo in detail.photos.iter().take(limits.max_photos) {
        items.push(ExtractedItem::Photo(VenuePhoto {
            source_url: photo.url.clone(),
            width: photo.width,
            height: photo.height,
            is_enhanced: photo.enhanced,
        }));
    }

    items
}

/// Normalizes the two observed price shapes to a non-negative [`Decimal`].
///
/// Minor units win when both are present. Returns `None` for absent,
/// unparseable, or negative prices.
fn normalize_price(entry: &MenuEntry) -> Option<Decimal> {
    let price = if let Some(cents) = entry.price_cents {
        Decimal::new(cents, 2)
    } else {
        entry.price.as_deref()?.trim().parse::<Decimal>().ok()?
    };
    if price < Decimal::ZERO {
        None
    } else {
        Some(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MenuSection, PhotoEntry, VenueMenu};

    fn entry(name: &str, price: Option<&str>, price_cents: Option<i64>) -> MenuEntry {
        MenuEntry {
            name: name.to_string(),
            description: None,
            price: price.map(str::to_string),
            price_cents,
            currency: None,
            image_url: None,
        }
    }

    fn detail_with_menu(entries: Vec<MenuEntry>) -> VenueDetail {
        VenueDetail {
            menu: Some(VenueMenu {
                sections: vec![MenuSection {
                    name: Some("Starters".to_string()),
                    items: entries,
                }],
            }),
            photos: Vec::new(),
        }
    }

    fn photo(url: &str) -> PhotoEntry {
        PhotoEntry {
            url: url.to_string(),
            width: Some(1024),
            height: Some(768),
            enhanced: false,
        }
    }

    #[test]
    fn decimal_string_price_normalizes() {
        let detail = detail_with_menu(vec![entry("Bruschetta", Some("4.50"), None)]);
        let items = parse_detail("abc", &detail, &ExtractionLimits::default());
        assert_eq!(items.len(), 1);
        match &items[0] {
            ExtractedItem::MenuLine(line) => {
                assert_eq!(line.price, Decimal::new(450, 2));
                assert_eq!(line.currency_code, "EUR");
                assert_eq!(line.category.as_deref(), Some("Starters"));
            }
            other => panic!("expected MenuLine, got: {other:?}"),
        }
    }

    #[test]
    fn minor_units_price_normalizes() {
        let detail = detail_with_menu(vec![entry("Bruschetta", None, Some(450))]);
        let items = parse_detail("abc", &detail, &ExtractionLimits::default());
        match &items[0] {
            ExtractedItem::MenuLine(line) => assert_eq!(line.price, Decimal::new(450, 2)),
            other => panic!("expected MenuLine, got: {other:?}"),
        }
    }

    #[test]
    fn minor_units_win_over_decimal_string() {
        let detail = detail_with_menu(vec![entry("Bruschetta", Some("9.99"), Some(450))]);
        let items = parse_detail("abc", &detail, &ExtractionLimits::default());
        match &items[0] {
            ExtractedItem::MenuLine(line) => assert_eq!(line.price, Decimal::new(450, 2)),
            other => panic!("expected MenuLine, got: {other:?}"),
        }
    }

    #[test]
    fn unparseable_and_negative_prices_are_skipped() {
        let detail = detail_with_menu(vec![
            entry("No price", None, None),
            entry("Bad price", Some("four fifty"), None),
            entry("Negative", Some("-1.00"), None),
            entry("Good", Some("12.00"), None),
        ]);
        let items = parse_detail("abc", &detail, &ExtractionLimits::default());
        assert_eq!(items.len(), 1);
        match &items[0] {
            ExtractedItem::MenuLine(line) => assert_eq!(line.name, "Good"),
            other => panic!("expected MenuLine, got: {other:?}"),
        }
    }

    #[test]
    fn menu_lines_are_capped() {
        let entries = (0..10)
            .map(|i| entry(&format!("Line {i}"), Some("1.00"), None))
            .collect();
        let limits = ExtractionLimits {
            max_menu_items: 3,
            max_photos: 5,
        };
        let items = parse_detail("abc", &detail_with_menu(entries), &limits);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn photos_are_capped_at_limit() {
        let detail = VenueDetail {
            menu: None,
            photos: (0..8).map(|i| photo(&format!("https://cdn.example/p{i}"))).collect(),
        };
        let items = parse_detail("abc", &detail, &ExtractionLimits::default());
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(ExtractedItem::is_photo));
    }

    #[test]
    fn menu_lines_precede_photos_in_presentation_order() {
        let mut detail = detail_with_menu(vec![
            entry("First", Some("1.00"), None),
            entry("Second", Some("2.00"), None),
        ]);
        detail.photos = vec![photo("https://cdn.example/p0")];
        let items = parse_detail("abc", &detail, &ExtractionLimits::default());
        assert_eq!(items.len(), 3);
        assert!(!items[0].is_photo());
        assert!(!items[1].is_photo());
        assert!(items[2].is_photo());
        match (&items[0], &items[1]) {
            (ExtractedItem::MenuLine(a), ExtractedItem::MenuLine(b)) => {
                assert_eq!(a.name, "First");
                assert_eq!(b.name, "Second");
            }
            other => panic!("expected two MenuLines, got: {other:?}"),
        }
    }

    #[test]
    fn empty_blob_yields_no_items() {
        let detail = VenueDetail {
            menu: None,
            photos: Vec::new(),
        };
        assert!(parse_detail("abc", &detail, &ExtractionLimits::default()).is_empty());
    }
}
