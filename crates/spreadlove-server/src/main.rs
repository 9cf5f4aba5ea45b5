mod app;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use spreadlove_api::AppStateInner;

use crate::app::Drain;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spreadlove=debug,spreadlove_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("Admin routes enabled for user '{}'", config.admin.username());

    let db = spreadlove_db::Database::open(&config.db_path)?;
    let state = Arc::new(AppStateInner {
        db,
        admin: config.admin,
    });

    let app = app::app(spreadlove_api::router(state), config.request_timeout);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Spreadlove server listening on {}", addr);

    match app::serve(listener, app, shutdown_signal(), config.shutdown_grace).await? {
        Drain::Completed => info!("All requests drained, server exiting"),
        Drain::Aborted => warn!("Server exiting with requests cut short"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sig) => sig,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
