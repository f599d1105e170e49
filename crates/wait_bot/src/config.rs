use std::str::FromStr;
use std::time::Duration;

use atl_site::FetchConfig;
use social_services::service::DEFAULT_API_BASE_URL;
use wait_times::{ATL_WAIT_TIMES_URL, SeverityThresholds, ThresholdError};

/// Default page used to check outbound connectivity at startup.
const DEFAULT_HEALTH_CHECK_URL: &str = "https://www.google.com";

/// Static process configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Page the wait times are scraped from
    pub target_url: String,

    /// Time between two checks (default: 30 minutes)
    pub scrape_interval: Duration,

    /// Timeout and retry policy for downloading the page
    pub fetch: FetchConfig,

    /// Bounds of the severity bands
    pub thresholds: SeverityThresholds,

    /// Page probed once at startup to verify network access
    pub health_check_url: String,

    /// Base URL of the X API
    pub twitter_api_base_url: String,
}

/// Errors raised while reading the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but holds an unusable value.
    #[error("Invalid value '{value}' for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// The severity thresholds are not strictly ascending.
    #[error(transparent)]
    Thresholds(#[from] ThresholdError),
}

impl BotConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`; unset variables take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = FetchConfig::default();
        let default_thresholds = SeverityThresholds::default().bounds();

        let interval_minutes: u64 = parse_var(&lookup, "SCRAPE_INTERVAL_MINUTES", 30)?;
        if interval_minutes == 0 {
            return Err(invalid(
                "SCRAPE_INTERVAL_MINUTES",
                "0",
                "must be greater than 0",
            ));
        }

        let timeout_seconds: u64 = parse_var(
            &lookup,
            "REQUEST_TIMEOUT_SECONDS",
            defaults.request_timeout.as_secs(),
        )?;
        if timeout_seconds == 0 {
            return Err(invalid(
                "REQUEST_TIMEOUT_SECONDS",
                "0",
                "must be greater than 0",
            ));
        }

        let max_retries: u32 = parse_var(&lookup, "MAX_RETRIES", defaults.max_retries)?;

        let backoff_factor: f64 =
            parse_var(&lookup, "RETRY_BACKOFF_FACTOR", defaults.backoff_factor)?;
        if !backoff_factor.is_finite() || backoff_factor < 0.0 {
            return Err(invalid(
                "RETRY_BACKOFF_FACTOR",
                &backoff_factor.to_string(),
                "must be a non-negative number",
            ));
        }

        let thresholds = SeverityThresholds::new(
            parse_var(&lookup, "WAIT_THRESHOLD_GREEN", default_thresholds.0)?,
            parse_var(&lookup, "WAIT_THRESHOLD_YELLOW", default_thresholds.1)?,
            parse_var(&lookup, "WAIT_THRESHOLD_ORANGE", default_thresholds.2)?,
            parse_var(&lookup, "WAIT_THRESHOLD_PURPLE", default_thresholds.3)?,
        )?;

        Ok(Self {
            target_url: lookup("ATL_WAIT_TIMES_URL")
                .unwrap_or_else(|| ATL_WAIT_TIMES_URL.to_string()),
            scrape_interval: Duration::from_secs(interval_minutes * 60),
            fetch: FetchConfig {
                request_timeout: Duration::from_secs(timeout_seconds),
                max_retries,
                backoff_factor,
                ..defaults
            },
            thresholds,
            health_check_url: lookup("HEALTH_CHECK_URL")
                .unwrap_or_else(|| DEFAULT_HEALTH_CHECK_URL.to_string()),
            twitter_api_base_url: lookup("TWITTER_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }

    /// Interval in whole minutes, for log messages
    pub fn interval_minutes(&self) -> u64 {
        self.scrape_interval.as_secs() / 60
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.target_url, "https://www.atl.com/times/");
        assert!(config.target_url.starts_with("https://"));
        assert_eq!(config.interval_minutes(), 30);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.backoff_factor, 2.0);
        assert_eq!(config.fetch.retry_statuses, vec![429, 500, 502, 503, 504]);
        assert_eq!(config.thresholds.bounds(), (15, 30, 45, 60));
        assert_eq!(config.twitter_api_base_url, "https://api.twitter.com");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ATL_WAIT_TIMES_URL", "http://localhost:8080/times/"),
            ("SCRAPE_INTERVAL_MINUTES", "5"),
            ("REQUEST_TIMEOUT_SECONDS", " 20 "),
            ("MAX_RETRIES", "0"),
            ("RETRY_BACKOFF_FACTOR", "0.5"),
            ("WAIT_THRESHOLD_GREEN", "10"),
            ("WAIT_THRESHOLD_YELLOW", "20"),
            ("WAIT_THRESHOLD_ORANGE", "30"),
            ("WAIT_THRESHOLD_PURPLE", "40"),
        ])
        .unwrap();

        assert_eq!(config.target_url, "http://localhost:8080/times/");
        assert_eq!(config.scrape_interval, Duration::from_secs(300));
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(20));
        assert_eq!(config.fetch.max_retries, 0);
        assert_eq!(config.fetch.backoff_factor, 0.5);
        assert_eq!(config.thresholds.bounds(), (10, 20, 30, 40));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = config_from(&[("SCRAPE_INTERVAL_MINUTES", "0")]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "SCRAPE_INTERVAL_MINUTES",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_unparsable_values() {
        assert!(config_from(&[("MAX_RETRIES", "lots")]).is_err());
        assert!(config_from(&[("REQUEST_TIMEOUT_SECONDS", "-1")]).is_err());
        assert!(config_from(&[("RETRY_BACKOFF_FACTOR", "-2")]).is_err());
        assert!(config_from(&[("RETRY_BACKOFF_FACTOR", "NaN")]).is_err());
    }

    #[test]
    fn test_large_backoff_factor_caps_delay() {
        let config = config_from(&[("RETRY_BACKOFF_FACTOR", "1e20")]).unwrap();
        assert_eq!(config.fetch.backoff_delay(1), atl_site::MAX_BACKOFF);
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let result = config_from(&[("WAIT_THRESHOLD_YELLOW", "80")]);
        assert!(matches!(result, Err(ConfigError::Thresholds(_))));
    }
}
