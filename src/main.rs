use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voidwatch_sync::config::SyncConfig;
use voidwatch_sync::jobs::stats_sync::run_once;

/// Voidwatch market data import
#[derive(Parser, Debug)]
#[command(name = "voidwatch-sync", version, about)]
struct Cli {
    /// Refresh catalogs and prune, but skip fetching item statistics
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (.env + environment)
    let report = run_once(SyncConfig::from_env(), cli.dry_run).await;
    tracing::debug!(?report, "Run finished");
}
