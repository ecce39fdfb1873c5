//! Runner tests against mock providers and an in-memory `Storage`, so the
//! full orchestration (batching, quota halt, failure isolation, resume,
//! cancellation) is exercised without a database or network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use tavola_core::{CandidateRecord, ExtractedItem, MenuLine, RunOutcome, RunStatus, VenuePhoto};
use tavola_db::{DbError, Storage};
use tavola_provider::{MenuSourceProvider, PlaceSearchProvider, ProviderError};

use super::{ReconciliationRunner, RunnerConfig};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockPlaces {
    results: HashMap<String, Vec<CandidateRecord>>,
    quota_on: HashSet<String>,
    fail_on: HashSet<String>,
    search_calls: AtomicU32,
}

#[async_trait]
impl PlaceSearchProvider for MockPlaces {
    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.quota_on.contains(query) {
            return Err(ProviderError::QuotaExceeded("daily limit".to_string()));
        }
        if self.fail_on.contains(query) {
            return Err(ProviderError::Malformed {
                context: query.to_string(),
                reason: "bad payload".to_string(),
            });
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn details(&self, external_id: &str) -> Result<CandidateRecord, ProviderError> {
        for candidates in self.results.values() {
            if let Some(c) = candidates.iter().find(|c| c.external_id == external_id) {
                return Ok(c.clone());
            }
        }
        Err(ProviderError::NotFound {
            context: external_id.to_string(),
        })
    }
}

#[derive(Default)]
struct MockMenus {
    items: HashMap<String, Vec<ExtractedItem>>,
    fail_on: HashSet<String>,
    quota_on: HashSet<String>,
    fetch_calls: AtomicU32,
}

#[async_trait]
impl MenuSourceProvider for MockMenus {
    async fn fetch_detail(&self, external_id: &str) -> Result<Vec<ExtractedItem>, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.quota_on.contains(external_id) {
            return Err(ProviderError::QuotaExceeded("daily limit".to_string()));
        }
        if self.fail_on.contains(external_id) {
            return Err(ProviderError::Malformed {
                context: external_id.to_string(),
                reason: "bad payload".to_string(),
            });
        }
        Ok(self.items.get(external_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct MemStorage {
    establishments: Mutex<Vec<(i64, CandidateRecord)>>,
    items: Mutex<HashMap<i64, Vec<ExtractedItem>>>,
    outcomes: Mutex<Vec<(i64, RunOutcome)>>,
    completed_runs: Mutex<Vec<i64>>,
    failed_runs: Mutex<Vec<(i64, String)>>,
    next_establishment_id: AtomicI64,
    next_run_id: AtomicI64,
    item_write_calls: AtomicU32,
    fail_item_writes: AtomicBool,
}

#[async_trait]
impl Storage for MemStorage {
    async fn upsert_establishment(&self, record: &CandidateRecord) -> Result<i64, DbError> {
        let mut rows = self.establishments.lock().unwrap();
        if !record.external_id.is_empty() {
            if let Some((id, existing)) = rows
                .iter_mut()
                .find(|(_, r)| r.external_id == record.external_id)
            {
                *existing = record.clone();
                return Ok(*id);
            }
        }
        let id = self.next_establishment_id.fetch_add(1, Ordering::SeqCst) + 1;
        rows.push((id, record.clone()));
        Ok(id)
    }

    async fn replace_items(
        &self,
        establishment_id: i64,
        items: &[ExtractedItem],
    ) -> Result<usize, DbError> {
        self.item_write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_item_writes.load(Ordering::SeqCst) {
            return Err(DbError::NotFound);
        }
        self.items
            .lock()
            .unwrap()
            .insert(establishment_id, items.to_vec());
        Ok(items.len())
    }

    async fn create_run(&self, _trigger_source: &str) -> Result<i64, DbError> {
        Ok(self.next_run_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn record_outcome(&self, run_id: i64, outcome: &RunOutcome) -> Result<(), DbError> {
        self.outcomes.lock().unwrap().push((run_id, outcome.clone()));
        Ok(())
    }

    async fn complete_run(&self, run_id: i64, _names_processed: i32) -> Result<(), DbError> {
        self.completed_runs.lock().unwrap().push(run_id);
        Ok(())
    }

    async fn fail_run(&self, run_id: i64, error_message: &str) -> Result<(), DbError> {
        self.failed_runs
            .lock()
            .unwrap()
            .push((run_id, error_message.to_string()));
        Ok(())
    }

    async fn completed_inputs(&self, names: &[String]) -> Result<HashSet<String>, DbError> {
        let outcomes = self.outcomes.lock().unwrap();
        Ok(outcomes
            .iter()
            .filter(|(_, o)| o.status.is_done() && names.contains(&o.input_name))
            .map(|(_, o)| o.input_name.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn candidate(external_id: &str, name: &str, address: &str) -> CandidateRecord {
    CandidateRecord {
        external_id: external_id.to_string(),
        display_name: name.to_string(),
        address: Some(address.to_string()),
        rating: Some(4.5),
        review_count: Some(100),
        phone: None,
        photo_refs: Vec::new(),
        geo: None,
    }
}

fn menu_line(name: &str) -> ExtractedItem {
    ExtractedItem::MenuLine(MenuLine {
        name: name.to_string(),
        description: None,
        price: Decimal::new(450, 2),
        currency_code: "EUR".to_string(),
        category: None,
        image_url: None,
    })
}

fn photo(url: &str) -> ExtractedItem {
    ExtractedItem::Photo(VenuePhoto {
        source_url: url.to_string(),
        width: None,
        height: None,
        is_enhanced: false,
    })
}

fn config() -> RunnerConfig {
    RunnerConfig {
        batch_size: 10,
        match_threshold: 0.85,
        resume: false,
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn no_cancel() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn matched_input_persists_establishment_and_items() {
    let mut places = MockPlaces::default();
    places.results.insert(
        "Trabuxu Bistro".to_string(),
        vec![candidate("abc", "Trabuxu Bistro", "Valletta")],
    );
    let mut menus = MockMenus::default();
    menus.items.insert(
        "abc".to_string(),
        vec![menu_line("Bruschetta"), menu_line("Rabbit Stew"), photo("https://cdn.example/p1")],
    );
    let storage = MemStorage::default();

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let report = runner.run(&names(&["Trabuxu Bistro"])).await.unwrap();

    assert!(report.halted.is_none());
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.matched, 1);
    assert_eq!(report.summary.items_written, 3);
    assert_eq!(report.summary.failed, 0);

    let establishments = storage.establishments.lock().unwrap();
    assert_eq!(establishments.len(), 1);
    assert_eq!(establishments[0].1.external_id, "abc");
    let items = storage.items.lock().unwrap();
    assert_eq!(items.get(&establishments[0].0).unwrap().len(), 3);

    let outcomes = storage.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1.status, RunStatus::Matched);
    assert_eq!(outcomes[0].1.items_written, 3);
    assert!(storage.completed_runs.lock().unwrap().contains(&report.run_id));
}

#[tokio::test]
async fn not_found_input_makes_no_extraction_or_persistence_calls() {
    let places = MockPlaces::default(); // empty catalog for every query
    let menus = MockMenus::default();
    let storage = MemStorage::default();

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let report = runner
        .run(&names(&["Totally Unknown Venue Xyz123"]))
        .await
        .unwrap();

    assert_eq!(report.summary.not_found, 1);
    assert_eq!(report.summary.items_written, 0);
    assert_eq!(menus.fetch_calls.load(Ordering::SeqCst), 0);
    assert!(storage.establishments.lock().unwrap().is_empty());
    let outcomes = storage.outcomes.lock().unwrap();
    assert_eq!(outcomes[0].1.status, RunStatus::NotFound);
}

#[tokio::test]
async fn quota_halts_the_run_and_marks_unprocessed_inputs_failed() {
    let mut places = MockPlaces::default();
    places.quota_on.insert("Alpha".to_string());
    let menus = MockMenus::default();
    let storage = MemStorage::default();

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let report = runner
        .run(&names(&["Alpha", "Beta", "Gamma"]))
        .await
        .unwrap();

    assert_eq!(report.halted.as_deref(), Some("quota exceeded, run aborted"));
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.failed, 3);
    // Only the quota-hitting item ever reached the provider.
    assert_eq!(places.search_calls.load(Ordering::SeqCst), 1);

    let outcomes = storage.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].1.error.as_deref().unwrap().contains("quota"));
    assert_eq!(
        outcomes[1].1.error.as_deref(),
        Some("quota exceeded, run aborted")
    );
    assert_eq!(
        outcomes[2].1.error.as_deref(),
        Some("quota exceeded, run aborted")
    );
    assert_eq!(storage.failed_runs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn one_bad_input_does_not_abort_the_run() {
    let mut places = MockPlaces::default();
    places.fail_on.insert("Bad Venue".to_string());
    places.results.insert(
        "Rubino".to_string(),
        vec![candidate("r1", "Rubino", "Old Bakery Street")],
    );
    let mut menus = MockMenus::default();
    menus.items.insert("r1".to_string(), vec![menu_line("Octopus Stew")]);
    let storage = MemStorage::default();

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let report = runner.run(&names(&["Bad Venue", "Rubino"])).await.unwrap();

    assert!(report.halted.is_none());
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.matched, 1);
    assert!(storage.completed_runs.lock().unwrap().contains(&report.run_id));

    let outcomes = storage.outcomes.lock().unwrap();
    assert_eq!(outcomes[0].1.status, RunStatus::Failed);
    assert_eq!(outcomes[1].1.status, RunStatus::Matched);
}

#[tokio::test]
async fn extraction_failure_marks_item_failed_but_continues() {
    let mut places = MockPlaces::default();
    places.results.insert(
        "Trabuxu Bistro".to_string(),
        vec![candidate("abc", "Trabuxu Bistro", "Valletta")],
    );
    let mut menus = MockMenus::default();
    menus.fail_on.insert("abc".to_string());
    let storage = MemStorage::default();

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let report = runner.run(&names(&["Trabuxu Bistro"])).await.unwrap();

    assert!(report.halted.is_none());
    assert_eq!(report.summary.failed, 1);
    let outcomes = storage.outcomes.lock().unwrap();
    assert_eq!(outcomes[0].1.status, RunStatus::Failed);
    assert!(outcomes[0].1.error.as_deref().unwrap().contains("extraction failed"));
}

#[tokio::test]
async fn empty_extraction_persists_establishment_with_zero_items() {
    let mut places = MockPlaces::default();
    places.results.insert(
        "Trabuxu Bistro".to_string(),
        vec![candidate("abc", "Trabuxu Bistro", "Valletta")],
    );
    let menus = MockMenus::default(); // no items configured → empty vec
    let storage = MemStorage::default();

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let report = runner.run(&names(&["Trabuxu Bistro"])).await.unwrap();

    assert_eq!(report.summary.extraction_empty, 1);
    assert_eq!(report.summary.items_written, 0);
    assert_eq!(storage.establishments.lock().unwrap().len(), 1);
    let outcomes = storage.outcomes.lock().unwrap();
    assert_eq!(outcomes[0].1.status, RunStatus::ExtractionEmpty);
}

#[tokio::test]
async fn item_write_failure_is_a_persist_error_with_establishment_intact() {
    let mut places = MockPlaces::default();
    places.results.insert(
        "Trabuxu Bistro".to_string(),
        vec![candidate("abc", "Trabuxu Bistro", "Valletta")],
    );
    let mut menus = MockMenus::default();
    menus.items.insert("abc".to_string(), vec![menu_line("Bruschetta")]);
    let storage = MemStorage::default();
    storage.fail_item_writes.store(true, Ordering::SeqCst);

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let report = runner.run(&names(&["Trabuxu Bistro"])).await.unwrap();

    assert!(report.halted.is_none());
    assert_eq!(report.summary.failed, 1);
    assert_eq!(storage.establishments.lock().unwrap().len(), 1);
    let outcomes = storage.outcomes.lock().unwrap();
    assert_eq!(outcomes[0].1.status, RunStatus::PersistError);
}

#[tokio::test]
async fn resume_skips_done_inputs_and_writes_nothing_new() {
    let mut places = MockPlaces::default();
    places.results.insert(
        "Trabuxu Bistro".to_string(),
        vec![candidate("abc", "Trabuxu Bistro", "Valletta")],
    );
    let mut menus = MockMenus::default();
    menus.items.insert(
        "abc".to_string(),
        vec![menu_line("Bruschetta"), menu_line("Rabbit Stew"), photo("https://cdn.example/p1")],
    );
    let storage = MemStorage::default();

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), no_cancel());
    let first = runner.run(&names(&["Trabuxu Bistro"])).await.unwrap();
    assert_eq!(first.summary.items_written, 3);
    assert_eq!(storage.item_write_calls.load(Ordering::SeqCst), 1);

    let resume_config = RunnerConfig {
        resume: true,
        ..config()
    };
    let resumed = ReconciliationRunner::new(&places, &menus, &storage, resume_config, no_cancel());
    let second = resumed.run(&names(&["Trabuxu Bistro"])).await.unwrap();

    assert_eq!(second.summary.total, 0);
    assert_eq!(second.summary.items_written, 0);
    assert_eq!(
        storage.item_write_calls.load(Ordering::SeqCst),
        1,
        "the second run must not write any additional items"
    );
    assert_eq!(
        places.search_calls.load(Ordering::SeqCst),
        1,
        "the second run must not re-query the provider for done inputs"
    );
}

#[tokio::test]
async fn resume_reprocesses_previously_failed_inputs() {
    // First run: search fails for the venue.
    let mut failing_places = MockPlaces::default();
    failing_places.fail_on.insert("Rubino".to_string());
    let menus = MockMenus::default();
    let storage = MemStorage::default();

    let runner =
        ReconciliationRunner::new(&failing_places, &menus, &storage, config(), no_cancel());
    let first = runner.run(&names(&["Rubino"])).await.unwrap();
    assert_eq!(first.summary.failed, 1);

    // Second run: the provider has recovered; resume must retry the name.
    let mut places = MockPlaces::default();
    places.results.insert(
        "Rubino".to_string(),
        vec![candidate("r1", "Rubino", "Old Bakery Street")],
    );
    let mut menus = MockMenus::default();
    menus.items.insert("r1".to_string(), vec![menu_line("Octopus Stew")]);
    let resume_config = RunnerConfig {
        resume: true,
        ..config()
    };
    let resumed = ReconciliationRunner::new(&places, &menus, &storage, resume_config, no_cancel());
    let second = resumed.run(&names(&["Rubino"])).await.unwrap();

    assert_eq!(second.summary.total, 1);
    assert_eq!(second.summary.matched, 1);
}

#[tokio::test]
async fn cancellation_marks_unprocessed_inputs_failed() {
    let places = MockPlaces::default();
    let menus = MockMenus::default();
    let storage = MemStorage::default();
    let cancel = Arc::new(AtomicBool::new(true));

    let runner = ReconciliationRunner::new(&places, &menus, &storage, config(), cancel);
    let report = runner.run(&names(&["Alpha", "Beta"])).await.unwrap();

    assert_eq!(report.halted.as_deref(), Some("cancelled"));
    assert_eq!(report.summary.failed, 2);
    assert_eq!(places.search_calls.load(Ordering::SeqCst), 0);
    let outcomes = storage.outcomes.lock().unwrap();
    assert!(outcomes.iter().all(|(_, o)| o.error.as_deref() == Some("cancelled")));
}
