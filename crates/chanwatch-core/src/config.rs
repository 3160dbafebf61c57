use crate::app_config::{AppConfig, Environment, SourceSettings};
use crate::tuning::ProbeLimits;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = or_default("DATABASE_URL", "sqlite://chanwatch.db?mode=rwc");
    let env = parse_environment(&or_default("CHANWATCH_ENV", "development"))?;

    let bind_addr = or_default("CHANWATCH_BIND_ADDR", "0.0.0.0:3000")
        .parse()
        .map_err(|e: std::net::AddrParseError| invalid("CHANWATCH_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("CHANWATCH_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("CHANWATCH_DB_MAX_CONNECTIONS", "5")?;
    if db_max_connections == 0 {
        return Err(invalid(
            "CHANWATCH_DB_MAX_CONNECTIONS",
            "must be at least 1".to_string(),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("CHANWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let source = SourceSettings {
        api_key: optional("GIPHY_API_KEY"),
        base_url: or_default("CHANWATCH_API_BASE_URL", "https://api.giphy.com/v1")
            .trim_end_matches('/')
            .to_string(),
        user_agent: or_default("CHANWATCH_USER_AGENT", "chanwatch/0.1 (visibility-probe)"),
        search_timeout_secs: parse_u64("CHANWATCH_SEARCH_TIMEOUT_SECS", "10")?,
        detail_timeout_secs: parse_u64("CHANWATCH_DETAIL_TIMEOUT_SECS", "5")?,
        listing_timeout_secs: parse_u64("CHANWATCH_LISTING_TIMEOUT_SECS", "15")?,
        inter_request_delay_ms: parse_u64("CHANWATCH_INTER_REQUEST_DELAY_MS", "300")?,
        max_retries: parse_u32("CHANWATCH_MAX_RETRIES", "2")?,
        retry_backoff_base_ms: parse_u64("CHANWATCH_RETRY_BACKOFF_BASE_MS", "500")?,
    };

    let probe = ProbeLimits {
        workers: parse_usize("CHANWATCH_PROBE_WORKERS", "10")?,
        sample_size: parse_usize("CHANWATCH_PROBE_SAMPLE_SIZE", "12")?,
        ..ProbeLimits::default()
    }
    .clamped();

    let refresh_cron = or_default("CHANWATCH_REFRESH_CRON", "0 0 2 * * *");
    let api_keys = parse_api_keys(&or_default("CHANWATCH_API_KEYS", ""));

    if env == Environment::Production && api_keys.is_empty() {
        return Err(ConfigError::MissingEnvVar("CHANWATCH_API_KEYS".to_string()));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_acquire_timeout_secs,
        source,
        probe,
        refresh_cron,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CHANWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
