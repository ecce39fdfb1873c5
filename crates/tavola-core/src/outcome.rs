/// Terminal status of one input name within a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Resolved, extracted, and persisted.
    Matched,
    /// No candidate scored at or above the resolution threshold.
    NotFound,
    /// Resolved and persisted, but the provider had no items for the venue.
    ExtractionEmpty,
    /// The establishment may exist but item persistence failed.
    PersistError,
    /// Aborted before completion (per-item error, quota halt, cancellation).
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Matched => "matched",
            RunStatus::NotFound => "not_found",
            RunStatus::ExtractionEmpty => "extraction_empty",
            RunStatus::PersistError => "persist_error",
            RunStatus::Failed => "failed",
        }
    }

    /// Done statuses are skipped by `--resume`; the rest are reprocessed.
    #[must_use]
    pub fn is_done(self) -> bool {
        matches!(
            self,
            RunStatus::Matched | RunStatus::NotFound | RunStatus::ExtractionEmpty
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-input-name record appended to the run log. Never mutated after the
/// item completes.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub input_name: String,
    pub status: RunStatus,
    pub items_written: i32,
    pub error: Option<String>,
}

impl RunOutcome {
    #[must_use]
    pub fn new(input_name: &str, status: RunStatus, items_written: i32) -> Self {
        Self {
            input_name: input_name.to_string(),
            status,
            items_written,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(input_name: &str, status: RunStatus, error: String) -> Self {
        Self {
            input_name: input_name.to_string(),
            status,
            items_written: 0,
            error: Some(error),
        }
    }
}

/// Aggregated counts reported at run end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub not_found: usize,
    pub extraction_empty: usize,
    pub items_written: i64,
    pub failed: usize,
}

impl RunSummary {
    /// Folds one outcome into the summary.
    pub fn record(&mut self, outcome: &RunOutcome) {
        self.total += 1;
        self.items_written += i64::from(outcome.items_written);
        match outcome.status {
            RunStatus::Matched => self.matched += 1,
            RunStatus::NotFound => self.not_found += 1,
            RunStatus::ExtractionEmpty => self.extraction_empty += 1,
            RunStatus::PersistError | RunStatus::Failed => self.failed += 1,
        }
    }
}
