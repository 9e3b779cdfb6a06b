//! # Guestbook Binary
//!
//! The entry point that assembles the server from its plugins.

mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gb_api::AppState;
use gb_config::Overrides;
use gb_journal_csv::DailyCsvJournal;
use gb_sanitize_strict::StrictSanitizer;
use tokio::net::TcpListener;

/// Guestbook web server
#[derive(Parser, Debug)]
#[command(name = "guestbook", version)]
struct Cli {
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory for the daily visitor logs
    #[arg(long)]
    journal_path: Option<PathBuf>,

    /// Directory for the diagnostic log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Settings file (TOML). Defaults to ./guestbook.toml when present
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            journal_path: self.journal_path.clone(),
            log_dir: self.log_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = gb_config::load(cli.config.as_deref(), &cli.overrides())
        .context("loading settings")?;
    let _log_guard = telemetry::init(&settings.log)?;
    tracing::info!("guestbook starting");

    std::fs::create_dir_all(&settings.journal.path).with_context(|| {
        format!("creating journal directory {}", settings.journal.path.display())
    })?;

    // 1. Journal and sanitizer are built once and shared by every request
    let state = AppState {
        journal: Arc::new(DailyCsvJournal::new(
            settings.journal.path.clone(),
            settings.journal.include_source,
        )),
        sanitizer: Arc::new(StrictSanitizer::new()),
        include_source: settings.journal.include_source,
        images_dir: settings.assets.images_dir.clone(),
    };

    // 2. Routes + middleware
    let app = gb_api::router(state);

    let addr = settings.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        %addr,
        journal = %settings.journal.path.display(),
        "guestbook listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving")?;

    tracing::info!("guestbook stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
