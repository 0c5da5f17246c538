//! REST client configuration.
//!
//! Configuration is read once at startup from environment variables (a `.env`
//! file is honoured through `dotenvy`). Every value has a default suitable for
//! talking to the local mock backend.

use std::time::Duration;

use reqwest::Url;

/// Default API base URL (the mock backend).
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration loading error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The name of the environment variable.
        key: String,
        /// Description of why the value is invalid.
        message: String,
    },
}

/// Settings of an [`HttpClient`](super::HttpClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint is appended to.
    pub api_url: Url,
    /// Timeout applied to each request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with the default timeout.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Returns a copy with the given request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `TASKBOARD_API_URL`: API base URL (optional, default: `http://localhost:3001`)
    /// - `TASKBOARD_TIMEOUT_SECS`: request timeout (optional, default: 30)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("TASKBOARD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&api_url).map_err(|error| ConfigError::InvalidValue {
            key: "TASKBOARD_API_URL".to_string(),
            message: error.to_string(),
        })?;

        let timeout = lookup("TASKBOARD_TIMEOUT_SECS").map_or(Ok(DEFAULT_TIMEOUT_SECS), |value| {
            value.parse::<u64>().map_err(|error| ConfigError::InvalidValue {
                key: "TASKBOARD_TIMEOUT_SECS".to_string(),
                message: error.to_string(),
            })
        })?;

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[rstest]
    fn defaults_point_at_the_mock_backend() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.api_url.as_str(), "http://localhost:3001/");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[rstest]
    fn values_are_read_from_the_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TASKBOARD_API_URL", "https://api.example.com/v1"),
            ("TASKBOARD_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.as_str(), "https://api.example.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[rstest]
    #[case("TASKBOARD_API_URL", "not a url")]
    #[case("TASKBOARD_TIMEOUT_SECS", "soon")]
    fn invalid_values_are_reported(#[case] key: &str, #[case] value: &str) {
        let error = ClientConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();

        assert!(matches!(error, ConfigError::InvalidValue { key: ref reported, .. } if reported == key));
    }

    #[rstest]
    fn config_error_display() {
        let error = ConfigError::InvalidValue {
            key: "TASKBOARD_TIMEOUT_SECS".to_string(),
            message: "must be a number".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid value for TASKBOARD_TIMEOUT_SECS: must be a number"
        );
    }
}
