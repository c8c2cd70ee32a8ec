//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Feed paging and embedding limits.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Media URL configuration.
    pub media: MediaConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Page size used when the caller does not pass one.
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    /// Upper bound for a caller-supplied page size.
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
    /// Number of reviews embedded in each entry.
    #[serde(default = "default_review_embed_limit")]
    pub review_embed_limit: u64,
    /// Search radius used when the caller does not pass one (meters).
    #[serde(default = "default_radius")]
    pub default_radius_m: u32,
    /// Smallest accepted search radius (meters).
    #[serde(default = "default_min_radius")]
    pub min_radius_m: u32,
    /// Largest accepted search radius (meters).
    #[serde(default = "default_max_radius")]
    pub max_radius_m: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            review_embed_limit: default_review_embed_limit(),
            default_radius_m: default_radius(),
            min_radius_m: default_min_radius(),
            max_radius_m: default_max_radius(),
        }
    }
}

impl FeedConfig {
    /// Clamp a caller-supplied page size into `[1, max_limit]`.
    #[must_use]
    pub fn clamp_limit(&self, limit: Option<u64>) -> u64 {
        limit.unwrap_or(self.default_limit).clamp(1, self.max_limit.max(1))
    }
}

/// Media URL configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Base URL media paths are resolved against.
    pub base_url: String,
    /// HMAC secret; when present, URLs carry an expiring signature.
    #[serde(default)]
    pub signing_secret: Option<String>,
    /// Lifetime of a signed URL in seconds.
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_limit() -> u64 {
    40
}

const fn default_max_limit() -> u64 {
    100
}

const fn default_review_embed_limit() -> u64 {
    6
}

const fn default_radius() -> u32 {
    1000
}

const fn default_min_radius() -> u32 {
    10
}

const fn default_max_radius() -> u32 {
    5000
}

const fn default_url_ttl() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `DISHFEED_ENV`)
    /// 4. Environment variables with `DISHFEED_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("DISHFEED_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DISHFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("DISHFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_defaults() {
        let feed = FeedConfig::default();
        assert_eq!(feed.default_limit, 40);
        assert_eq!(feed.review_embed_limit, 6);
        assert_eq!(feed.min_radius_m, 10);
        assert_eq!(feed.max_radius_m, 5000);
    }

    #[test]
    fn test_clamp_limit() {
        let feed = FeedConfig::default();
        assert_eq!(feed.clamp_limit(None), 40);
        assert_eq!(feed.clamp_limit(Some(0)), 1);
        assert_eq!(feed.clamp_limit(Some(20)), 20);
        assert_eq!(feed.clamp_limit(Some(10_000)), 100);
    }

    #[test]
    fn test_log_format_deserialize() {
        let cfg: LoggingConfig = serde_json::from_str(r#"{"format":"json"}"#).unwrap_or_default();
        assert_eq!(cfg.format, LogFormat::Json);
    }
}
