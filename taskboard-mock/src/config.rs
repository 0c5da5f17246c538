//! Server configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskboard_mock::ServerConfig;
//!
//! let config = ServerConfig::from_env()?;
//! println!("listening on {}", config.bind_address());
//! ```

use std::path::PathBuf;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 3001;

/// Configuration error types.
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

/// Mock server configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// JSON file with `projects` and `users` arrays used instead of the
    /// built-in seed.
    pub db_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MOCK_HOST`: Server host (optional, default: "127.0.0.1")
    /// - `MOCK_PORT`: Server port (optional, default: 3001)
    /// - `MOCK_DB_PATH`: Seed file (optional)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `MOCK_PORT` is not a port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors if file doesn't exist)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `MOCK_PORT` is not a port number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("MOCK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("MOCK_PORT").map_or(Ok(DEFAULT_PORT), |value| {
            value.parse::<u16>().map_err(|error| ConfigError::InvalidValue {
                key: "MOCK_PORT".to_string(),
                message: error.to_string(),
            })
        })?;
        let db_path = lookup("MOCK_DB_PATH")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self { host, port, db_path })
    }

    /// `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
