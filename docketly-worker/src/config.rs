/// Worker configuration
///
/// Loaded through the `config` crate from the process environment. A `.env`
/// file is picked up in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `FIELD_ENCRYPTION_KEY`: 64 hex characters, needed to render invoice PDFs (required)
/// - `EMAIL_API_KEY`: Provider API key; emails are only logged when unset
/// - `EMAIL_API_URL`: Provider base URL (default: https://api.resend.com)
/// - `EMAIL_FROM`: Sender address
/// - `WORKER_POLL_INTERVAL_MS`: Idle poll interval (default: 1000)
/// - `WORKER_BATCH_SIZE`: Rows claimed per poll (default: 10)
/// - `WORKER_MAX_CONCURRENCY`: Emails in flight at once (default: 4)
/// - `WORKER_MAX_ATTEMPTS`: Deliveries before a row is FAILED (default: 5)
/// - `WORKER_RETRY_DELAY_SECS`: Wait per previous attempt before a retry (default: 30)
/// - `WORKER_STALE_AFTER_SECS`: SENDING rows older than this are reclaimed (default: 600)

use anyhow::Context;
use config::{Config, Environment};
use docketly_shared::crypto::KEY_LEN;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com";
pub const DEFAULT_EMAIL_FROM: &str = "Docketly <no-reply@docketly.app>";

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub field_encryption_key: String,
    pub email: EmailConfig,
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub max_attempts: i32,
    pub retry_delay: Duration,
    pub stale_after: Duration,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// `None` selects the logging mailer
    pub api_key: Option<String>,
    pub api_url: String,
    pub from: String,
}

impl WorkerConfig {
    /// Loads configuration from the process environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::default())
    }

    /// Loads configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        Self::from_environment(Environment::default().source(Some(vars)))
    }

    fn from_environment(environment: Environment) -> anyhow::Result<Self> {
        let settings = Config::builder()
            .set_default("database_max_connections", 5)?
            .set_default("email_api_url", DEFAULT_EMAIL_API_URL)?
            .set_default("email_from", DEFAULT_EMAIL_FROM)?
            .set_default("worker_poll_interval_ms", 1000)?
            .set_default("worker_batch_size", 10)?
            .set_default("worker_max_concurrency", 4)?
            .set_default("worker_max_attempts", 5)?
            .set_default("worker_retry_delay_secs", 30)?
            .set_default("worker_stale_after_secs", 600)?
            .add_source(environment)
            .build()?;

        let database_url = settings
            .get_string("database_url")
            .context("DATABASE_URL environment variable is required")?;
        let field_encryption_key = settings
            .get_string("field_encryption_key")
            .context("FIELD_ENCRYPTION_KEY environment variable is required")?;

        let api_key = settings
            .get_string("email_api_key")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let config = Self {
            database_url,
            database_max_connections: settings.get::<u32>("database_max_connections")?,
            field_encryption_key,
            email: EmailConfig {
                api_key,
                api_url: settings.get_string("email_api_url")?,
                from: settings.get_string("email_from")?,
            },
            poll_interval: Duration::from_millis(settings.get::<u64>("worker_poll_interval_ms")?),
            batch_size: settings.get::<usize>("worker_batch_size")?,
            max_concurrency: settings.get::<usize>("worker_max_concurrency")?,
            max_attempts: settings.get::<i32>("worker_max_attempts")?,
            retry_delay: Duration::from_secs(settings.get::<u64>("worker_retry_delay_secs")?),
            stale_after: Duration::from_secs(settings.get::<u64>("worker_stale_after_secs")?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let key_ok = hex::decode(&self.field_encryption_key)
            .map(|key| key.len() == KEY_LEN)
            .unwrap_or(false);
        if !key_ok {
            anyhow::bail!("FIELD_ENCRYPTION_KEY must be {} hex characters", KEY_LEN * 2);
        }
        if self.batch_size == 0 || self.max_concurrency == 0 {
            anyhow::bail!("WORKER_BATCH_SIZE and WORKER_MAX_CONCURRENCY must be positive");
        }
        if self.max_attempts < 1 {
            anyhow::bail!("WORKER_MAX_ATTEMPTS must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(extra: &[(&str, &str)]) -> HashMap<String, String> {
        let key = "ab".repeat(32);
        [
            ("DATABASE_URL", "postgresql://localhost/docketly"),
            ("FIELD_ENCRYPTION_KEY", key.as_str()),
        ]
        .iter()
        .chain(extra.iter())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::from_vars(vars(&[])).unwrap();

        assert_eq!(config.database_url, "postgresql://localhost/docketly");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.stale_after, Duration::from_secs(600));
        assert_eq!(config.email.api_key, None);
        assert_eq!(config.email.api_url, DEFAULT_EMAIL_API_URL);
    }

    #[test]
    fn test_overrides() {
        let config = WorkerConfig::from_vars(vars(&[
            ("WORKER_BATCH_SIZE", "25"),
            ("WORKER_MAX_ATTEMPTS", "3"),
            ("WORKER_POLL_INTERVAL_MS", "250"),
            ("EMAIL_API_KEY", "re_test_key"),
            ("EMAIL_FROM", "Payroll <pay@example.com>"),
        ]))
        .unwrap();

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.email.api_key.as_deref(), Some("re_test_key"));
        assert_eq!(config.email.from, "Payroll <pay@example.com>");
    }

    #[test]
    fn test_blank_api_key_means_no_provider() {
        let config = WorkerConfig::from_vars(vars(&[("EMAIL_API_KEY", "  ")])).unwrap();
        assert!(config.email.api_key.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let mut vars = vars(&[]);
        vars.remove("DATABASE_URL");
        let err = WorkerConfig::from_vars(vars).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_rejects_bad_key_and_zero_batch() {
        let mut bad_key = vars(&[]);
        bad_key.insert("FIELD_ENCRYPTION_KEY".to_string(), "not-hex".to_string());
        assert!(WorkerConfig::from_vars(bad_key).is_err());

        assert!(WorkerConfig::from_vars(vars(&[("WORKER_BATCH_SIZE", "0")])).is_err());
    }
}
