use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod dedupe;
mod reconcile;
mod runs;

#[derive(Debug, Parser)]
#[command(name = "tavola")]
#[command(about = "Establishment & menu reconciliation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve venue names, extract menus and photos, and persist results
    Reconcile {
        /// Venue list YAML (defaults to TAVOLA_VENUES_PATH)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Skip inputs that already have a done outcome in a prior run
        #[arg(long)]
        resume: bool,

        /// Names per batch (defaults to TAVOLA_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Resolution similarity threshold (defaults to TAVOLA_MATCH_THRESHOLD)
        #[arg(long)]
        threshold: Option<f64>,

        /// Print what would be reconciled without touching providers or the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Report duplicate establishments; --apply removes non-canonical members
    Dedupe {
        /// Delete duplicate group members instead of only reporting them
        #[arg(long)]
        apply: bool,
    },
    /// List recent reconciliation runs
    Runs {
        /// Maximum number of runs to list
        #[arg(long, default_value_t = 20)]
        limit: i64,

        /// Show the per-input outcome log of one run instead
        #[arg(long)]
        run: Option<i64>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = tavola_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();

    let pool_config = tavola_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = tavola_db::connect_pool(&config.database_url, pool_config).await?;
    tavola_db::ping(&pool).await?;

    match cli.command {
        Commands::Reconcile {
            input,
            resume,
            batch_size,
            threshold,
            dry_run,
        } => {
            reconcile::run_reconcile(
                &pool,
                &config,
                reconcile::ReconcileArgs {
                    input,
                    resume,
                    batch_size,
                    threshold,
                    dry_run,
                },
            )
            .await
        }
        Commands::Dedupe { apply } => dedupe::run_dedupe(&pool, &config, apply).await,
        Commands::Runs { limit, run } => runs::run_list(&pool, limit, run).await,
        Commands::Migrate => {
            tavola_db::run_migrations(&pool).await?;
            println!("migrations applied");
            Ok(())
        }
    }
}
