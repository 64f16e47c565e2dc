//! Runtime configuration for the feed
//!
//! Every tunable has a default matching the reference behaviour. Values are
//! supplied by the settings layer through environment variables.

use crate::error::{FlipperError, FlipperResult};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Base URL for the Hypixel public API
pub const HYPIXEL_API_BASE: &str = "https://api.hypixel.net";

#[derive(Debug, Clone)]
pub struct FlipperConfig {
    /// Root of the on-disk tree (cache, debug dumps, logs, credentials)
    pub data_dir: PathBuf,
    pub api_base_url: String,
    /// Single key from user settings, added to the pool on startup
    pub api_key: Option<String>,
    pub max_concurrent_requests: usize,
    pub request_cooldown: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub bazaar_interval: Duration,
    pub auction_interval: Duration,
    pub auction_page_delay: Duration,
    /// Reference datasets younger than this are served from cache
    pub reference_max_age: Duration,
    pub health_initial_delay: Duration,
    pub health_interval: Duration,
    pub server_port: u16,
}

impl Default for FlipperConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            api_base_url: HYPIXEL_API_BASE.to_string(),
            api_key: None,
            max_concurrent_requests: 4,
            request_cooldown: Duration::from_millis(250),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            bazaar_interval: Duration::from_secs(10),
            auction_interval: Duration::from_secs(5 * 60),
            auction_page_delay: Duration::from_millis(250),
            reference_max_age: Duration::from_secs(24 * 60 * 60),
            health_initial_delay: Duration::from_secs(15),
            health_interval: Duration::from_secs(60),
            server_port: 3001,
        }
    }
}

impl FlipperConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// Recognised variables:
    /// - `FLIPPER_DATA_DIR`, `HYPIXEL_API_BASE`, `HYPIXEL_API_KEY`
    /// - `FLIPPER_MAX_CONCURRENT_REQUESTS`, `FLIPPER_REQUEST_COOLDOWN_MS`
    /// - `FLIPPER_BAZAAR_INTERVAL_SECS`, `FLIPPER_AUCTION_INTERVAL_SECS`,
    ///   `FLIPPER_AUCTION_PAGE_DELAY_MS`
    /// - `FLIPPER_REFERENCE_MAX_AGE_HOURS`, `FLIPPER_HEALTH_INTERVAL_SECS`
    /// - `SERVER_PORT`
    pub fn from_env() -> FlipperResult<Self> {
        let mut config = Self::default();

        if let Ok(dir) = env::var("FLIPPER_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(base) = env::var("HYPIXEL_API_BASE") {
            config.api_base_url = base.trim_end_matches('/').to_string();
        }
        config.api_key = env::var("HYPIXEL_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        if let Some(n) = parse_var::<usize>("FLIPPER_MAX_CONCURRENT_REQUESTS")? {
            if n == 0 {
                return Err(FlipperError::config(
                    "FLIPPER_MAX_CONCURRENT_REQUESTS must be at least 1",
                ));
            }
            config.max_concurrent_requests = n;
        }
        if let Some(ms) = parse_var::<u64>("FLIPPER_REQUEST_COOLDOWN_MS")? {
            config.request_cooldown = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>("FLIPPER_BAZAAR_INTERVAL_SECS")? {
            config.bazaar_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = parse_var::<u64>("FLIPPER_AUCTION_INTERVAL_SECS")? {
            config.auction_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = parse_var::<u64>("FLIPPER_AUCTION_PAGE_DELAY_MS")? {
            config.auction_page_delay = Duration::from_millis(ms);
        }
        if let Some(hours) = parse_var::<u64>("FLIPPER_REFERENCE_MAX_AGE_HOURS")? {
            let secs = hours.checked_mul(60 * 60).ok_or_else(|| {
                FlipperError::config(format!(
                    "FLIPPER_REFERENCE_MAX_AGE_HOURS is too large: {}",
                    hours
                ))
            })?;
            config.reference_max_age = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("FLIPPER_HEALTH_INTERVAL_SECS")? {
            config.health_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(port) = parse_var::<u16>("SERVER_PORT")? {
            config.server_port = port;
        }

        Ok(config)
    }

    /// Directory holding the per-domain cache records
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Credential file with the rotating API keys
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("api_keys.json")
    }
}

fn parse_var<T>(name: &str) -> FlipperResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FlipperError::config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config = FlipperConfig::default();
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.request_cooldown, Duration::from_millis(250));
        assert_eq!(config.bazaar_interval, Duration::from_secs(10));
        assert_eq!(config.auction_interval, Duration::from_secs(300));
        assert_eq!(config.reference_max_age, Duration::from_secs(86_400));
    }

    #[test]
    fn test_derived_paths() {
        let config = FlipperConfig {
            data_dir: PathBuf::from("/tmp/flipper"),
            ..FlipperConfig::default()
        };
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/flipper/cache"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/flipper/logs"));
        assert_eq!(
            config.credentials_path(),
            PathBuf::from("/tmp/flipper/api_keys.json")
        );
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        // Unique name so parallel tests cannot interfere
        let name = "FLIPPER_TEST_PARSE_VAR_GARBAGE";
        env::set_var(name, "not-a-number");
        let result = parse_var::<u64>(name);
        env::remove_var(name);
        assert!(matches!(result, Err(FlipperError::Config(_))));
    }

    #[test]
    fn test_oversized_max_age_is_config_error() {
        let name = "FLIPPER_REFERENCE_MAX_AGE_HOURS";
        env::set_var(name, u64::MAX.to_string());
        let result = FlipperConfig::from_env();
        env::remove_var(name);
        assert!(matches!(result, Err(FlipperError::Config(_))));
    }
}
