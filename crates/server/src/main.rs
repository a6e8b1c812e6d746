// crates/server/src/main.rs
//! Baton server binary.
//!
//! Parses flags/environment, starts the Axum server and serves until Ctrl-C.

use anyhow::{Context, Result};
use baton_server::{create_app, AppState, ServerArgs};
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Resolve once Ctrl-C is received, flipping the shutdown flag so open SSE
/// streams end and `axum::serve` can drain.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
    }
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,baton_server=info,baton_core=info".into()),
        )
        .compact()
        .init();

    let args = ServerArgs::parse();
    let config = args.baton_config();
    let (state, shutdown_tx) =
        AppState::new(config).context("invalid request timing configuration")?;
    let app = create_app(state);

    let addr = args.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        checker_period_ms = args.checker_period_ms,
        tick_budget = args.tick_budget,
        work_duration_ms = args.work_duration_ms,
        "Baton server listening"
    );
    eprintln!("\n  baton v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("  \u{2192} http://{}/api/async\n", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    Ok(())
}
