//! Kapaladaru entry point
//!
//! Loads configuration from the environment, then runs reconciliation passes
//! once or forever depending on `RUN_ONCE`.

use tokio_util::sync::CancellationToken;

use kapaladaru::app;
use kapaladaru::config::Config;
use kapaladaru::jobs::{self, RunMode};
use kapaladaru::services::{LogFormat, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    tracing::info!("Starting Kapaladaru movie checker");

    let config = Config::from_env()?;
    config.log_summary();

    let app = app::build(&config)?;

    // A missing ledger directory only degrades marking, so keep going
    if let Err(e) = app.reconciler.ledger().ensure_dir().await {
        tracing::warn!(error = %e, "Checked directory unavailable - entries will not be marked");
    }

    match app.ollama.test_connection().await {
        Ok(models) => tracing::info!(models = ?models, "Ollama reachable"),
        Err(e) => tracing::warn!(error = %e, "Ollama not reachable - classifications will fail until it is"),
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C");
            shutdown.cancel();
        }
    });

    let passes = jobs::run(&app.reconciler, RunMode::from_config(&config), cancel).await;
    tracing::info!(passes, "Kapaladaru stopped");

    Ok(())
}
