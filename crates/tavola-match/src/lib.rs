//! Name normalization, similarity scoring, resolution matching, and
//! duplicate detection for the venue catalog. Pure logic — no I/O.

mod dedupe;
mod normalize;
mod resolve;
mod similarity;

pub use dedupe::{find_duplicates, DedupeConfig, DedupeRecord, DuplicateGroup};
pub use normalize::{default_stoplist, normalize, normalize_for_dedupe};
pub use resolve::{resolve, MatcherConfig};
pub use similarity::similarity;
