use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Canonical quiet period: 15 minutes without a qualifying save.
pub const DEFAULT_QUIET_PERIOD_SECS: u64 = 900;

/// Inputs of the notification core. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// How long an article must go without a qualifying save before it is announced
    pub quiet_period: Duration,

    /// Sender address on outgoing notifications
    pub from_address: String,

    /// Prepended to the article title in the subject line
    pub subject_prefix: String,

    /// Number of words kept from the excerpt or body
    pub excerpt_words: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_secs(DEFAULT_QUIET_PERIOD_SECS),
            from_address: "noreply@localhost".to_string(),
            subject_prefix: "New Post: ".to_string(),
            excerpt_words: 30,
        }
    }
}

/// Outbound SMTP settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// Relay host; `None` means a local unauthenticated relay on `localhost`
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
}

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// HTTP port for the API server (default: 3000)
    pub api_port: u16,

    /// Shared secret expected in `X-API-Key` on admin routes
    pub admin_api_key: String,

    pub notify: NotifyConfig,

    pub smtp: SmtpConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let defaults = NotifyConfig::default();
        let smtp_host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty());
        let default_smtp_port = if smtp_host.is_some() { 587 } else { 1025 };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 20)?,
            api_port: env_or("API_PORT", 3000)?,
            admin_api_key: required("ADMIN_API_KEY")?,
            notify: NotifyConfig {
                quiet_period: Duration::from_secs(env_or(
                    "QUIET_PERIOD_SECS",
                    DEFAULT_QUIET_PERIOD_SECS,
                )?),
                from_address: std::env::var("EMAIL_FROM").unwrap_or(defaults.from_address),
                subject_prefix: std::env::var("SUBJECT_PREFIX").unwrap_or(defaults.subject_prefix),
                excerpt_words: env_or("EXCERPT_WORDS", defaults.excerpt_words)?,
            },
            smtp: SmtpConfig {
                port: env_or("SMTP_PORT", default_smtp_port)?,
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                use_tls: std::env::var("SMTP_USE_TLS")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(smtp_host.is_some()),
                host: smtp_host,
            },
        })
    }
}

fn required(key: &str) -> Result<String, AppError> {
    std::env::var(key)
        .map_err(|_| AppError::Config(format!("{} environment variable is required", key)))
}

/// Read and parse an optional variable, falling back to `default` when unset.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::Config(format!(
                "{} must be a valid {}",
                key,
                std::any::type_name::<T>()
            ))
        }),
        Err(_) => Ok(default),
    }
}
