//! The per-run orchestration: resolve → enrich → extract → persist, with
//! batch sequencing, quota halt, failure isolation, cancellation, and
//! resume.
//!
//! Items are processed strictly sequentially — external quota, not CPU, is
//! the bottleneck, and the providers share one rate budget. The only
//! suspension points are inside the rate-limited provider calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tavola_core::{CandidateRecord, RunOutcome, RunStatus, RunSummary};
use tavola_db::Storage;
use tavola_match::{resolve, MatcherConfig};
use tavola_provider::{
    MenuSourceProvider, PlaceSearchProvider, ProviderError, ProviderErrorKind,
};

/// Per-run knobs, resolved from config and CLI flags by the command layer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunnerConfig {
    pub batch_size: usize,
    pub match_threshold: f64,
    pub resume: bool,
}

/// What a finished run hands back to the command layer. `halted` carries
/// the abort reason when the run stopped early (quota, cancellation); the
/// summary is complete either way.
pub(crate) struct RunReport {
    pub run_id: i64,
    pub summary: RunSummary,
    pub halted: Option<String>,
}

pub(crate) struct ReconciliationRunner<'a, P, M, S> {
    places: &'a P,
    menus: &'a M,
    storage: &'a S,
    config: RunnerConfig,
    cancel: Arc<AtomicBool>,
}

impl<'a, P, M, S> ReconciliationRunner<'a, P, M, S>
where
    P: PlaceSearchProvider,
    M: MenuSourceProvider,
    S: Storage,
{
    pub(crate) fn new(
        places: &'a P,
        menus: &'a M,
        storage: &'a S,
        config: RunnerConfig,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            places,
            menus,
            storage,
            config,
            cancel,
        }
    }

    /// Processes `input_names` and returns the run report.
    ///
    /// With `resume`, names that already have a done outcome in any prior
    /// run are skipped before the run starts, so a restart neither
    /// reprocesses successes nor double-charges the provider.
    ///
    /// # Errors
    ///
    /// Only run-level storage failures (creating the run, recording an
    /// outcome) propagate; per-item failures become outcome rows.
    pub(crate) async fn run(&self, input_names: &[String]) -> anyhow::Result<RunReport> {
        let mut pending: Vec<&String> = input_names.iter().collect();
        if self.config.resume {
            let done = self.storage.completed_inputs(input_names).await?;
            if !done.is_empty() {
                tracing::info!(
                    skipped = done.len(),
                    "resume: skipping inputs that already have a done outcome"
                );
                pending.retain(|name| !done.contains(name.as_str()));
            }
        }

        let run_id = self.storage.create_run("cli").await?;
        tracing::info!(run_id, pending = pending.len(), "reconciliation run started");

        let mut summary = RunSummary::default();
        let mut halted: Option<String> = None;
        let batch_size = self.config.batch_size.max(1);

        let mut index = 0;
        while index < pending.len() {
            if index % batch_size == 0 {
                tracing::info!(
                    batch = index / batch_size + 1,
                    remaining = pending.len() - index,
                    "starting batch"
                );
            }
            // Cancellation is observed between items, never mid-item.
            if self.cancel.load(Ordering::SeqCst) {
                halted = Some("cancelled".to_string());
                break;
            }

            let name = pending[index];
            let outcome = match self.process_input(name).await {
                Ok(outcome) => outcome,
                Err(quota) => {
                    // The item that hit the quota fails with the provider's
                    // message; everything after it is marked below.
                    let outcome = RunOutcome::failed(name, RunStatus::Failed, quota.to_string());
                    self.storage.record_outcome(run_id, &outcome).await?;
                    summary.record(&outcome);
                    index += 1;
                    halted = Some("quota exceeded, run aborted".to_string());
                    break;
                }
            };
            self.storage.record_outcome(run_id, &outcome).await?;
            summary.record(&outcome);
            index += 1;
        }

        if let Some(reason) = &halted {
            for name in &pending[index..] {
                let outcome = RunOutcome::failed(name, RunStatus::Failed, reason.clone());
                self.storage.record_outcome(run_id, &outcome).await?;
                summary.record(&outcome);
            }
            tracing::error!(run_id, reason, "reconciliation run aborted");
            self.storage.fail_run(run_id, reason).await?;
        } else {
            let processed = i32::try_from(summary.total).unwrap_or(i32::MAX);
            self.storage.complete_run(run_id, processed).await?;
            tracing::info!(
                run_id,
                matched = summary.matched,
                not_found = summary.not_found,
                failed = summary.failed,
                items_written = summary.items_written,
                "reconciliation run completed"
            );
        }

        Ok(RunReport {
            run_id,
            summary,
            halted,
        })
    }

    /// Runs one input name through the pipeline.
    ///
    /// Returns `Err` only for quota exhaustion — the one condition that
    /// must halt the whole run. Every other failure is converted into a
    /// terminal [`RunOutcome`] here and never crosses the batch boundary.
    async fn process_input(&self, name: &str) -> Result<RunOutcome, ProviderError> {
        let catalog = match self.places.search(name).await {
            Ok(catalog) => catalog,
            Err(err) => match err.kind() {
                ProviderErrorKind::QuotaExceeded => return Err(err),
                ProviderErrorKind::NotFound => Vec::new(),
                _ => {
                    tracing::warn!(input = name, error = %err, "place search failed");
                    return Ok(RunOutcome::failed(
                        name,
                        RunStatus::Failed,
                        format!("search failed: {err}"),
                    ));
                }
            },
        };

        let matcher = MatcherConfig {
            threshold: self.config.match_threshold,
        };
        let result = resolve(name, &catalog, &matcher);
        let Some(record) = result.matched else {
            tracing::info!(input = name, "no candidate at or above threshold");
            return Ok(RunOutcome::new(name, RunStatus::NotFound, 0));
        };
        tracing::debug!(
            input = name,
            external_id = %record.external_id,
            score = result.score,
            kind = ?result.kind,
            "resolved"
        );

        let record = self.enrich(record).await?;

        let items = match self.menus.fetch_detail(&record.external_id).await {
            Ok(items) => items,
            Err(err) => match err.kind() {
                ProviderErrorKind::QuotaExceeded => return Err(err),
                _ => {
                    tracing::warn!(input = name, error = %err, "extraction failed");
                    return Ok(RunOutcome::failed(
                        name,
                        RunStatus::Failed,
                        format!("extraction failed: {err}"),
                    ));
                }
            },
        };

        let establishment_id = match self.storage.upsert_establishment(&record).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(input = name, error = %err, "establishment upsert failed");
                return Ok(RunOutcome::failed(
                    name,
                    RunStatus::PersistError,
                    err.to_string(),
                ));
            }
        };

        if items.is_empty() {
            tracing::info!(input = name, establishment_id, "provider has no items for venue");
            return Ok(RunOutcome::new(name, RunStatus::ExtractionEmpty, 0));
        }

        match self.storage.replace_items(establishment_id, &items).await {
            Ok(written) => Ok(RunOutcome::new(
                name,
                RunStatus::Matched,
                i32::try_from(written).unwrap_or(i32::MAX),
            )),
            Err(err) => {
                // The establishment row exists with zero (or stale) items —
                // a valid, detectable partial state.
                tracing::warn!(input = name, establishment_id, error = %err, "item write failed");
                Ok(RunOutcome::failed(
                    name,
                    RunStatus::PersistError,
                    format!("items failed after establishment upsert: {err}"),
                ))
            }
        }
    }

    /// Fetches the full provider record for a matched candidate. Search
    /// results are partial; the details call fills in phone, photos, and
    /// geo. Failure degrades to the search record — only quota is fatal.
    async fn enrich(&self, record: CandidateRecord) -> Result<CandidateRecord, ProviderError> {
        match self.places.details(&record.external_id).await {
            Ok(full) => Ok(full),
            Err(err) if err.kind() == ProviderErrorKind::QuotaExceeded => Err(err),
            Err(err) => {
                tracing::warn!(
                    external_id = %record.external_id,
                    error = %err,
                    "details enrichment failed; keeping search record"
                );
                Ok(record)
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
