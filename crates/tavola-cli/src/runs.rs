//! The `runs` command: list the reconciliation run audit trail, or show one
//! run's per-input outcomes.

use sqlx::PgPool;

/// Print recent reconciliation runs (newest first), or the per-input
/// outcome log of a single run when `run_id` is given.
///
/// # Errors
///
/// Returns an error if the run does not exist or a query fails.
pub(crate) async fn run_list(
    pool: &PgPool,
    limit: i64,
    run_id: Option<i64>,
) -> anyhow::Result<()> {
    if let Some(id) = run_id {
        return show_run(pool, id).await;
    }

    let runs = tavola_db::list_reconciliation_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no reconciliation runs recorded");
        return Ok(());
    }

    for run in runs {
        let completed = run
            .completed_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        println!(
            "{}  {}  {:<9}  {} names  created {}  completed {}{}",
            run.id,
            run.public_id,
            run.status,
            run.names_processed,
            run.created_at.to_rfc3339(),
            completed,
            run.error_message
                .map_or_else(String::new, |e| format!("  error: {e}"))
        );
    }

    Ok(())
}

async fn show_run(pool: &PgPool, id: i64) -> anyhow::Result<()> {
    let run = tavola_db::get_reconciliation_run(pool, id).await?;
    println!(
        "run {} ({})  {}  trigger {}  {} names",
        run.id, run.public_id, run.status, run.trigger_source, run.names_processed
    );

    let inputs = tavola_db::list_run_inputs(pool, id).await?;
    if inputs.is_empty() {
        println!("no per-input outcomes recorded");
        return Ok(());
    }
    for input in inputs {
        println!(
            "  {:<16} {:>4} items  {}{}",
            input.status,
            input.items_written,
            input.input_name,
            input
                .error_message
                .map_or_else(String::new, |e| format!("  error: {e}"))
        );
    }

    Ok(())
}
