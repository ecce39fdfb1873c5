//! Canonicalization of free-text venue names and addresses for comparison.
//!
//! Two distinct modes: [`normalize`] is used for resolution matching, where
//! generic venue-type words ("bistro", "bar") carry signal and must be kept;
//! [`normalize_for_dedupe`] additionally strips those words, because two
//! stored records for the same venue frequently differ only in them.
//! Normalized forms are comparison keys only and are never persisted as
//! display values.

/// Generic venue-type words stripped during dedup normalization.
const DEFAULT_STOPLIST: &[&str] = &[
    "restaurant",
    "bar",
    "cafe",
    "café",
    "bistro",
    "grill",
    "pub",
    "lounge",
    "kitchen",
    "eatery",
    "diner",
    "pizzeria",
    "trattoria",
    "taverna",
    "wine",
    "house",
];

/// Returns the default dedup stoplist as owned strings, for use as the
/// starting point of a [`crate::DedupeConfig`].
#[must_use]
pub fn default_stoplist() -> Vec<String> {
    DEFAULT_STOPLIST.iter().map(|w| (*w).to_string()).collect()
}

/// Lower-cases, removes characters outside letters/digits/whitespace,
/// collapses whitespace runs to a single space, and trims.
///
/// Total and deterministic; the empty string maps to itself. Unicode
/// letters (accents, non-Latin scripts) are kept.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize`], then drop any word found in `stoplist`.
///
/// Used only for duplicate detection. May produce the empty string when a
/// name consists entirely of stoplisted words; callers must treat an empty
/// result as unusable for name comparison rather than as a wildcard.
#[must_use]
pub fn normalize_for_dedupe(text: &str, stoplist: &[String]) -> String {
    normalize(text)
        .split_whitespace()
        .filter(|word| !stoplist.iter().any(|s| s == word))
        .collect::<Vec<_>>()
        .join(" ")
}
