use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use spreadlove_api::AdminCredentials;

pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
    pub admin: AdminCredentials,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = var("SPREADLOVE_DB_PATH").unwrap_or_else(|| "love.db".into());
        let host = var("SPREADLOVE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("SPREADLOVE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SPREADLOVE_PORT must be a port number")?;

        let request_timeout = secs_var(&var, "SPREADLOVE_REQUEST_TIMEOUT_SECS", 60)?;
        let shutdown_grace = secs_var(&var, "SPREADLOVE_SHUTDOWN_GRACE_SECS", 10)?;

        // Missing credentials are a startup failure, never a per-request one.
        let admin = AdminCredentials::new(
            var("ADMIN_USER").unwrap_or_default(),
            var("ADMIN_PASSWORD").unwrap_or_default(),
        )
        .context("ADMIN_USER and ADMIN_PASSWORD must be set")?;

        Ok(Self {
            db_path: db_path.into(),
            host,
            port,
            request_timeout,
            shutdown_grace,
            admin,
        })
    }
}

fn secs_var(var: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> Result<Duration> {
    let secs = match var(name) {
        Some(v) => v
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds", name))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name: &str| vars.get(name).map(|v| v.to_string())
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config =
            Config::from_lookup(lookup(&[("ADMIN_USER", "mod"), ("ADMIN_PASSWORD", "pw")]))
                .unwrap();

        assert_eq!(config.db_path, PathBuf::from("love.db"));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.shutdown_grace, Duration::from_secs(10));
        assert_eq!(config.admin.username(), "mod");
    }

    #[test]
    fn empty_admin_user_is_an_error() {
        let result = Config::from_lookup(lookup(&[("ADMIN_USER", ""), ("ADMIN_PASSWORD", "pw")]));
        assert!(result.is_err());
    }

    #[test]
    fn missing_admin_password_is_an_error() {
        assert!(Config::from_lookup(lookup(&[("ADMIN_USER", "mod")])).is_err());
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let creds = [("ADMIN_USER", "mod"), ("ADMIN_PASSWORD", "pw")];
        for bad in [
            ("SPREADLOVE_PORT", "http"),
            ("SPREADLOVE_PORT", "70000"),
            ("SPREADLOVE_REQUEST_TIMEOUT_SECS", "1.5"),
            ("SPREADLOVE_SHUTDOWN_GRACE_SECS", "-1"),
        ] {
            let vars = [creds[0], creds[1], bad];
            assert!(Config::from_lookup(lookup(&vars)).is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("ADMIN_USER", "mod"),
            ("ADMIN_PASSWORD", "pw"),
            ("SPREADLOVE_DB_PATH", "/var/lib/spreadlove/love.db"),
            ("SPREADLOVE_PORT", "8080"),
            ("SPREADLOVE_SHUTDOWN_GRACE_SECS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/spreadlove/love.db"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.shutdown_grace, Duration::from_secs(2));
    }
}
