use std::sync::Arc;

use doc_router::config::RouterConfig;
use doc_router::pipeline::DocumentRouter;
use doc_router::store::{DocumentStore, LibSqlBackend};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing: stdout always, plus a non-blocking file appender
/// under `logs/` when the directory can be created. Returns the appender
/// guard, which must stay alive for the duration of the run.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer().with_target(false);

    // File logging is best-effort; a read-only working directory degrades
    // to console-only output.
    if std::fs::create_dir_all("logs").is_ok() {
        let appender = tracing_appender::rolling::never("logs", "doc-router.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .init();
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing();

    let config = RouterConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📄 Doc Router v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Store:   {} (table: {})",
        config.db_path.display(),
        config.table
    );
    eprintln!("   Archive: {}", config.archive_root.display());
    if let Some(threshold) = config.review_below {
        eprintln!("   Review threshold: {threshold}");
    }

    let store: Arc<dyn DocumentStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path, &config.table)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open document store at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );

    // Store failures inside the sweep propagate and exit non-zero;
    // per-record relocation failures do not.
    let router = DocumentRouter::from_config(&config, store);
    let summary = router.run().await?;

    println!(
        "Routing complete: {} documents processed ({} moved, {} move failures)",
        summary.processed, summary.moved, summary.failed_moves
    );
    Ok(())
}
