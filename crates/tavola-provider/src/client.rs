//! Rate-limited, retrying wrapper around provider calls.
//!
//! All provider traffic funnels through one [`RateLimitedClient`] per
//! provider so pacing and retry policy live in one place instead of being
//! copy-pasted per call site with drifting constants.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::pacer::Pacer;

const MAX_BACKOFF_MS: u64 = 60_000;

/// Snapshot of per-attempt counters, for run-end reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptCounters {
    pub attempts: u64,
    pub successes: u64,
    pub retries: u64,
    pub giveups: u64,
}

/// Wraps provider calls with a minimum inter-request delay, bounded retry
/// with exponential back-off for transient errors, and per-attempt
/// observability.
///
/// Quota exhaustion is never retried: the caller needs to see it
/// immediately so the whole run can halt instead of burning the remaining
/// quota on certain failures.
pub struct RateLimitedClient {
    pacer: Pacer,
    /// Additional attempts after the first failure. `0` disables retries.
    max_retries: u32,
    /// Base delay for exponential back-off: `base × 2^(attempt-1)`, capped
    /// at 60 s, with ±25 % jitter.
    backoff_base_secs: u64,
    attempts: AtomicU64,
    successes: AtomicU64,
    retries: AtomicU64,
    giveups: AtomicU64,
}

impl RateLimitedClient {
    #[must_use]
    pub fn new(inter_request_delay: Duration, max_retries: u32, backoff_base_secs: u64) -> Self {
        Self {
            pacer: Pacer::new(inter_request_delay),
            max_retries,
            backoff_base_secs,
            attempts: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            giveups: AtomicU64::new(0),
        }
    }

    /// Runs `operation` under the shared rate budget.
    ///
    /// Each attempt first waits on the pacer, so the inter-request delay
    /// holds on first calls as well as between retries. Transient errors
    /// are retried up to `max_retries` additional attempts; all other
    /// errors — quota above all — are returned immediately.
    ///
    /// # Errors
    ///
    /// The last [`ProviderError`] once retries are exhausted, or the first
    /// non-retriable error.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0u32;
        loop {
            self.pacer.wait().await;
            self.attempts.fetch_add(1, Ordering::Relaxed);

            match operation().await {
                Ok(value) => {
                    self.successes.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(label, attempt, "provider call succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    if err.kind() == ProviderErrorKind::QuotaExceeded {
                        self.giveups.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(label, error = %err, "provider quota exhausted — giving up");
                        return Err(err);
                    }
                    if !err.is_retriable() || attempt >= self.max_retries {
                        self.giveups.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            label,
                            attempt,
                            max_retries = self.max_retries,
                            error = %err,
                            "provider call failed — giving up"
                        );
                        return Err(err);
                    }

                    attempt += 1;
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    let delay_ms = self.backoff_delay_ms(attempt);
                    tracing::warn!(
                        label,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms,
                        error = %err,
                        "transient provider error — retrying after back-off"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    /// Exponential back-off with ±25 % jitter, capped at 60 s.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let base_ms = self.backoff_base_secs.saturating_mul(1_000);
        let computed = base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
        let capped = computed.min(MAX_BACKOFF_MS);
        (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
    }

    /// Point-in-time view of the attempt counters.
    #[must_use]
    pub fn counters(&self) -> AttemptCounters {
        AttemptCounters {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            giveups: self.giveups.load(Ordering::Relaxed),
        }
    }
}
