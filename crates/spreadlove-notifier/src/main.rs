mod config;
mod job;
mod mail;

use std::sync::Arc;

use tracing::{info, warn};

use spreadlove_db::Database;

use crate::config::Config;
use crate::mail::SmtpMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spreadlove_notifier=info,spreadlove_db=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let db = Arc::new(Database::open_read_only(&config.db_path)?);
    let mailer = Arc::new(SmtpMailer::from_config(&config)?);
    let admin_url: Arc<str> = config.admin_url.as_str().into();

    let Some(every) = config.interval else {
        run_once(db, mailer, admin_url).await?;
        return Ok(());
    };

    info!("Notifier running every {:?}", every);
    let mut interval = tokio::time::interval(every);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = run_once(db.clone(), mailer.clone(), admin_url.clone()).await {
                    warn!("Notification pass failed: {:#}", e);
                }
            }
            _ = &mut shutdown => {
                info!("Notifier exiting");
                return Ok(());
            }
        }
    }
}

async fn run_once(
    db: Arc<Database>,
    mailer: Arc<SmtpMailer>,
    admin_url: Arc<str>,
) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || job::notify_pending(&db, mailer.as_ref(), &admin_url))
        .await??;
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
                    info!("Received Ctrl+C");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C");
    }
}
