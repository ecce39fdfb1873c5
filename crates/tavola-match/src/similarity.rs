//! Edit-distance similarity over normalized strings.

/// Normalized Levenshtein similarity in `[0, 1]`.
///
/// `1 - distance / max(len)` over characters. Both inputs are expected to
/// already be normalized; the function itself does no canonicalization.
/// Returns `1.0` when both strings are empty. Symmetric and reflexive.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    1.0 - (distance as f64) / (max_len as f64)
}
