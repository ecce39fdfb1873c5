//! The `reconcile` command: wire config, providers, and storage together,
//! install the cancellation handler, and drive the runner.

mod runner;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use tavola_core::{load_venue_list, AppConfig};
use tavola_db::PgStorage;
use tavola_menus::{ExtractionLimits, MenuClient};
use tavola_places::PlacesClient;
use tavola_provider::RateLimitedClient;

use runner::{ReconciliationRunner, RunnerConfig};

/// Per-invocation options resolved from CLI flags.
pub(crate) struct ReconcileArgs {
    pub input: Option<PathBuf>,
    pub resume: bool,
    pub batch_size: Option<usize>,
    pub threshold: Option<f64>,
    pub dry_run: bool,
}

/// Resolve venue names, extract menus and photos, and persist results.
///
/// # Errors
///
/// Returns an error if the venue list cannot be loaded, a client cannot be
/// constructed, a run-level storage operation fails, or the run was halted
/// (quota, cancellation). Per-item failures are recorded as outcomes and do
/// not error the command.
pub(crate) async fn run_reconcile(
    pool: &PgPool,
    config: &AppConfig,
    args: ReconcileArgs,
) -> anyhow::Result<()> {
    let venues_path = args.input.unwrap_or_else(|| config.venues_path.clone());
    let list = load_venue_list(&venues_path)?;

    if args.dry_run {
        println!(
            "dry-run: would reconcile {} venues from {}: [{}]",
            list.venues.len(),
            venues_path.display(),
            list.venues.join(", ")
        );
        return Ok(());
    }

    if config.places_api_key.is_none() {
        anyhow::bail!(
            "TAVOLA_PLACES_API_KEY is not set; the place-search provider requires a key"
        );
    }

    let places = PlacesClient::new(
        &config.places_base_url,
        config.places_api_key.clone(),
        config.request_timeout_secs,
        &config.user_agent,
        RateLimitedClient::new(
            Duration::from_millis(config.inter_request_delay_ms),
            config.max_retries,
            config.retry_backoff_base_secs,
        ),
    )?;
    let menus = MenuClient::new(
        &config.menus_base_url,
        config.request_timeout_secs,
        &config.user_agent,
        RateLimitedClient::new(
            Duration::from_millis(config.inter_request_delay_ms),
            config.max_retries,
            config.retry_backoff_base_secs,
        ),
        ExtractionLimits {
            max_menu_items: config.max_menu_items_per_venue,
            max_photos: config.max_photos_per_venue,
        },
    )?;
    let storage = PgStorage::new(pool.clone());

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancellation requested — stopping after the current item");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let runner_config = RunnerConfig {
        batch_size: args.batch_size.unwrap_or(config.batch_size),
        match_threshold: args.threshold.unwrap_or(config.match_threshold),
        resume: args.resume,
    };
    let runner = ReconciliationRunner::new(&places, &menus, &storage, runner_config, cancel);
    let report = runner.run(&list.venues).await?;

    let summary = report.summary;
    println!(
        "run {}: {} processed — {} matched, {} not found, {} empty, {} failed, {} items written",
        report.run_id,
        summary.total,
        summary.matched,
        summary.not_found,
        summary.extraction_empty,
        summary.failed,
        summary.items_written
    );

    let place_counters = places.counters();
    let menu_counters = menus.counters();
    tracing::info!(
        attempts = place_counters.attempts,
        retries = place_counters.retries,
        giveups = place_counters.giveups,
        "place provider call totals"
    );
    tracing::info!(
        attempts = menu_counters.attempts,
        retries = menu_counters.retries,
        giveups = menu_counters.giveups,
        "menu provider call totals"
    );

    if let Some(reason) = report.halted {
        anyhow::bail!("run aborted: {reason}");
    }
    Ok(())
}
