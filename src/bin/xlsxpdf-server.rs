//! xlsxpdf-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise tracing (JSON lines when `XLSXPDF_LOG_JSON` is set).
//! 3. Prepare the output directory and the upload handler.
//! 4. Start the HTTP server with graceful shutdown.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xlsxpdf::server::{self, AppState};
use xlsxpdf::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = ServerConfig::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: XLSXPDF_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "xlsxpdf-server starting");

    // ── 3. Output directory and handler ────────────────────────────────────────
    tokio::fs::create_dir_all(&cfg.output_dir)
        .await
        .with_context(|| format!("failed to create {}", cfg.output_dir.display()))?;

    let state = AppState::from_config(&cfg)?;
    info!(
        output_dir = %cfg.output_dir.display(),
        page_size = ?cfg.page_size,
        landscape = cfg.landscape,
        max_upload_mb = cfg.max_upload_mb,
        "upload handler ready"
    );

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let app = server::router(state);
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("xlsxpdf-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
