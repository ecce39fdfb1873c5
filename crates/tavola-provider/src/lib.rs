//! The provider boundary: error taxonomy, shared rate limiting and retry,
//! and the traits the pipeline consumes providers through.
//!
//! Every external call goes through [`RateLimitedClient`], which owns the
//! shared rate budget (minimum inter-request delay) and the retry policy.
//! Concrete HTTP clients live in `tavola-places` and `tavola-menus`; the
//! orchestrator only ever sees [`PlaceSearchProvider`] and
//! [`MenuSourceProvider`].

mod client;
mod error;
mod pacer;
mod traits;

pub use client::{AttemptCounters, RateLimitedClient};
pub use error::{ProviderError, ProviderErrorKind};
pub use pacer::Pacer;
pub use traits::{MenuSourceProvider, PlaceSearchProvider};
