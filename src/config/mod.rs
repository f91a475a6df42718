//! Configuration management.
//!
//! Settings come from defaults, an optional TOML file, and
//! `SCHOLAR_GATEWAY_*` environment variables, in that order. The upstream
//! API key is read separately from `S2_API_KEY` (with `.env` support in the
//! binary) and is the one required secret.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream API settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Fallback feed settings
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the gateway listens on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Origins allowed by CORS; everything else is rejected
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://paperproj.github.io".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

/// Upstream API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Semantic Scholar API key (required; from S2_API_KEY)
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Minimum spacing between outbound upstream calls, in milliseconds
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

fn default_api_key() -> Option<String> {
    std::env::var("S2_API_KEY").ok()
}

fn default_throttle_ms() -> u64 {
    1000
}

/// Fallback feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Papers fetched per upstream page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upper bound on page fetches within a single feed step
    #[serde(default = "default_max_pages_per_call")]
    pub max_pages_per_call: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages_per_call: default_max_pages_per_call(),
        }
    }
}

fn default_page_size() -> usize {
    20
}

fn default_max_pages_per_call() -> usize {
    50
}

/// Load configuration from a file, layered under environment overrides
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("SCHOLAR_GATEWAY").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from environment overrides layered over defaults
pub fn get_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix("SCHOLAR_GATEWAY").separator("__"))
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.listen.port(), 8000);
        assert_eq!(config.server.allowed_origins.len(), 2);
        assert_eq!(config.upstream.throttle_ms, 1000);
        assert_eq!(config.fallback.page_size, 20);
        assert_eq!(config.fallback.max_pages_per_call, 50);
    }

    #[test]
    fn test_config_deserializes_partial_toml() {
        let config: Config = toml_from_str(
            r#"
            [fallback]
            page_size = 10
            "#,
        );
        assert_eq!(config.fallback.page_size, 10);
        assert_eq!(config.fallback.max_pages_per_call, 50);
        assert_eq!(config.server.listen.port(), 8000);
    }

    #[test]
    fn test_env_override_applies_without_config_file() {
        std::env::set_var("SCHOLAR_GATEWAY_FALLBACK__PAGE_SIZE", "10");
        let config = get_config().unwrap();
        std::env::remove_var("SCHOLAR_GATEWAY_FALLBACK__PAGE_SIZE");

        assert_eq!(config.fallback.page_size, 10);
        // Untouched settings keep their defaults
        assert_eq!(config.fallback.max_pages_per_call, 50);
        assert_eq!(config.server.listen.port(), 8000);
    }

    fn toml_from_str(s: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }
}
