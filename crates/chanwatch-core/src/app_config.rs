use std::net::SocketAddr;
use std::time::Duration;

use crate::tuning::ProbeLimits;
use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Settings handed to the content source adapter at construction.
#[derive(Clone)]
pub struct SourceSettings {
    /// Read from `GIPHY_API_KEY`; only commands that call the source need it.
    pub api_key: Option<String>,
    pub base_url: String,
    pub user_agent: String,
    pub search_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    pub listing_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl SourceSettings {
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when no API key was configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("GIPHY_API_KEY".to_string()))
    }

    #[must_use]
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    #[must_use]
    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    #[must_use]
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    #[must_use]
    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }
}

impl std::fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSettings")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("detail_timeout_secs", &self.detail_timeout_secs)
            .field("listing_timeout_secs", &self.listing_timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub source: SourceSettings,
    pub probe: ProbeLimits,
    pub refresh_cron: String,
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("source", &self.source)
            .field("probe", &self.probe)
            .field("refresh_cron", &self.refresh_cron)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
