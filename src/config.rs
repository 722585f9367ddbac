//! Configuration Module
//!
//! Loads server and provider configuration from environment variables once at
//! process start.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Default MarketCheck API base URL
pub const DEFAULT_MARKETCHECK_BASE_URL: &str = "https://mc-api.marketcheck.com";

/// Default Manheim API base URL
pub const DEFAULT_MANHEIM_BASE_URL: &str = "https://api.manheim.com";

/// Server configuration parameters.
///
/// Everything except provider credentials has a default. Credentials are
/// never defaulted; see [`Config::validate`].
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default TTL in seconds for cache entries stored without an explicit TTL
    pub default_ttl: u64,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Timeout in seconds applied to every outbound provider call
    pub provider_timeout: u64,
    /// Serve static fixtures instead of calling providers
    pub demo_mode: bool,
    /// Root directory of demo fixtures
    pub demo_data_dir: PathBuf,
    /// MarketCheck API base URL
    pub marketcheck_base_url: String,
    /// MarketCheck API key
    pub marketcheck_api_key: Option<String>,
    /// Manheim API base URL
    pub manheim_base_url: String,
    /// Manheim bearer token
    pub manheim_access_token: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - Default cache TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `PROVIDER_TIMEOUT` - Outbound call timeout in seconds (default: 15)
    /// - `DEMO_MODE` - `true`/`1`/`yes`/`on` enables demo mode (default: off)
    /// - `DEMO_DATA_DIR` - Fixture directory (default: `demo-data`)
    /// - `MARKETCHECK_BASE_URL`, `MARKETCHECK_API_KEY`
    /// - `MANHEIM_BASE_URL`, `MANHEIM_ACCESS_TOKEN`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            provider_timeout: parse_var("PROVIDER_TIMEOUT").unwrap_or(defaults.provider_timeout),
            demo_mode: env::var("DEMO_MODE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.demo_mode),
            demo_data_dir: non_empty_var("DEMO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.demo_data_dir),
            marketcheck_base_url: non_empty_var("MARKETCHECK_BASE_URL")
                .unwrap_or(defaults.marketcheck_base_url),
            marketcheck_api_key: non_empty_var("MARKETCHECK_API_KEY"),
            manheim_base_url: non_empty_var("MANHEIM_BASE_URL")
                .unwrap_or(defaults.manheim_base_url),
            manheim_access_token: non_empty_var("MANHEIM_ACCESS_TOKEN"),
        }
    }

    /// Checks that provider credentials are present unless demo mode is on.
    pub fn validate(&self) -> Result<()> {
        if self.demo_mode {
            return Ok(());
        }
        if self.marketcheck_api_key.is_none() {
            return Err(AppError::Config(
                "MARKETCHECK_API_KEY must be set when demo mode is disabled".to_string(),
            ));
        }
        if self.manheim_access_token.is_none() {
            return Err(AppError::Config(
                "MANHEIM_ACCESS_TOKEN must be set when demo mode is disabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: 300,
            cleanup_interval: 60,
            provider_timeout: 15,
            demo_mode: false,
            demo_data_dir: PathBuf::from("demo-data"),
            marketcheck_base_url: DEFAULT_MARKETCHECK_BASE_URL.to_string(),
            marketcheck_api_key: None,
            manheim_base_url: DEFAULT_MANHEIM_BASE_URL.to_string(),
            manheim_access_token: None,
        }
    }
}

// == Helpers ==
fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.cleanup_interval, 60);
        assert!(!config.demo_mode);
        assert!(config.marketcheck_api_key.is_none());
        assert!(config.manheim_access_token.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("SERVER_PORT");
        env::remove_var("DEFAULT_TTL");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("DEMO_MODE");
        env::remove_var("MARKETCHECK_API_KEY");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.cleanup_interval, 60);
        assert!(!config.demo_mode);
        assert!(config.marketcheck_api_key.is_none());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("enabled-ish"));
    }

    #[test]
    fn test_validate_requires_credentials_outside_demo_mode() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let config = Config {
            marketcheck_api_key: Some("mc".to_string()),
            manheim_access_token: Some("mh".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_skips_credentials_in_demo_mode() {
        let config = Config {
            demo_mode: true,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
