//! REST client layer.
//!
//! A thin JSON client over `reqwest` that mirrors the contract the rest of
//! the crate relies on:
//!
//! ```text
//! request(endpoint, { method, data, token, headers }) -> Result<T, HttpError>
//! ```
//!
//! - `GET` appends `data` as a query string, other methods send it as JSON
//! - non-2xx answers become [`HttpError::Api`] carrying the parsed body
//! - 401 clears the token store (logout) and yields [`HttpError::Unauthorized`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskboard::auth::MemoryTokenStore;
//! use taskboard::http::{ClientConfig, HttpClient, RequestConfig};
//!
//! let client = HttpClient::new(ClientConfig::from_env()?, Arc::new(MemoryTokenStore::new()))?;
//! let projects: Vec<serde_json::Value> = client
//!     .authorized_request("projects", RequestConfig::default())
//!     .await?;
//! ```

mod client;
mod config;
mod error;

pub use client::{HttpClient, RequestConfig};
pub use config::{ClientConfig, ConfigError, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{HttpError, RELOGIN_MESSAGE};
pub use reqwest::Method;
