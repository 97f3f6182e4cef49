use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_CACHE_TTL_SECS: u64 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    /// Namespace for every cache key this service writes.
    pub redis_prefix: String,
    pub cache_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
    /// Problems that were recovered from with a default. Logged once tracing is up.
    pub warnings: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut warnings = Vec::new();
        let (cache_ttl, ttl_warning) =
            parse_cache_ttl(std::env::var("CACHE_TTL_SECONDS").ok().as_deref());
        warnings.extend(ttl_warning);

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            redis_prefix: env_or("REDIS_PREFIX", "explore"),
            cache_ttl,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            log_format: match std::env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            warnings,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// A bad TTL does not keep the service from starting; it falls back to the default.
fn parse_cache_ttl(raw: Option<&str>) -> (Duration, Option<String>) {
    let default = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);
    match raw {
        None | Some("") => (default, None),
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => (Duration::from_secs(secs), None),
            _ => (
                default,
                Some(format!(
                    "Invalid CACHE_TTL_SECONDS '{value}', using {DEFAULT_CACHE_TTL_SECS}s"
                )),
            ),
        },
    }
}
