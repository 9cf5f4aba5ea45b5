use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub struct Config {
    pub db_path: PathBuf,
    pub sender: String,
    pub recipient: String,
    pub password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub admin_url: String,
    /// `None` means run once and exit (cron mode).
    pub interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = std::env::var("SPREADLOVE_DB_PATH").unwrap_or_else(|_| "love.db".into());
        let smtp_port: u16 = std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".into())
            .parse()
            .context("SMTP_PORT must be a port number")?;
        let admin_url = std::env::var("SPREADLOVE_ADMIN_URL")
            .unwrap_or_else(|_| "https://spreadlove.club/admin".into());
        let interval = match std::env::var("NOTIFY_INTERVAL_SECS") {
            Ok(v) => Some(Duration::from_secs(
                v.parse().context("NOTIFY_INTERVAL_SECS must be a whole number of seconds")?,
            )),
            Err(_) => None,
        };

        Ok(Self {
            db_path: db_path.into(),
            sender: required("EMAIL_SENDER")?,
            recipient: required("EMAIL_RECIPIENT")?,
            password: required("EMAIL_PASSWORD")?,
            smtp_host: required("SMTP_HOST")?,
            smtp_port,
            admin_url,
            interval,
        })
    }
}

fn required(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => anyhow::bail!("{} must be set", name),
    }
}
