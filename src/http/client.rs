//! The REST client.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{ClientConfig, HttpError};
use crate::auth::TokenStore;
use crate::query::to_query_pairs;

/// Per-request options.
///
/// # Examples
///
/// ```rust
/// use reqwest::Method;
/// use serde_json::json;
/// use taskboard::http::RequestConfig;
///
/// let config = RequestConfig::new(Method::PATCH)
///     .with_data(&json!({ "pin": true }))
///     .unwrap()
///     .with_token("123");
/// assert_eq!(config.method, Method::PATCH);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// HTTP method (default `GET`).
    pub method: Method,
    /// Query parameters for `GET`, JSON body otherwise.
    pub data: Option<Value>,
    /// Bearer token sent in the `Authorization` header.
    pub token: Option<String>,
    /// Extra headers.
    pub headers: HeaderMap,
}

impl RequestConfig {
    /// A request with the given method and no data.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Attaches `data`, serialized to JSON.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Encode` if `data` cannot be represented as JSON.
    pub fn with_data<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self, HttpError> {
        self.data = Some(serde_json::to_value(data).map_err(|error| HttpError::Encode(error.to_string()))?);
        Ok(self)
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// JSON REST client bound to one API base URL.
///
/// `GET` requests carry their data as a query string; all other methods send
/// it as a JSON body (`{}` when absent). Non-2xx responses become
/// [`HttpError::Api`] with the parsed error body. A 401 response clears the
/// token store and yields [`HttpError::Unauthorized`].
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenStore>,
}

impl HttpClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Configuration` if the underlying HTTP client cannot
    /// be built.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| HttpError::Configuration(error.to_string()))?;
        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    /// The token store consulted by [`authorized_request`](Self::authorized_request).
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a request to `{api_url}/{endpoint}` and decodes the JSON answer.
    ///
    /// # Errors
    ///
    /// - `HttpError::Unauthorized` on 401 (after logging out)
    /// - `HttpError::Api` on any other non-2xx status
    /// - `HttpError::Transport` / `HttpError::Decode` / `HttpError::Encode`
    ///   for I/O and (de)serialization failures
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str, config: RequestConfig) -> Result<T, HttpError> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!(method = %config.method, %url, "sending request");

        let mut builder = self
            .client
            .request(config.method.clone(), url.as_str())
            .headers(config.headers);
        if let Some(token) = &config.token {
            builder = builder.bearer_auth(token);
        }
        if config.method == Method::GET {
            if let Some(data) = &config.data {
                let pairs = to_query_pairs(data).map_err(|error| HttpError::Encode(error.to_string()))?;
                builder = builder.query(&pairs);
            }
        } else {
            let empty = Value::Object(Map::new());
            builder = builder.json(config.data.as_ref().unwrap_or(&empty));
        }

        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%url, "unauthorized response, logging out");
            self.tokens.clear();
            return Err(HttpError::Unauthorized);
        }

        let bytes = response.bytes().await?;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|error| HttpError::Decode(error.to_string()))?
        };

        if status.is_success() {
            serde_json::from_value(body).map_err(|error| HttpError::Decode(error.to_string()))
        } else {
            tracing::debug!(status = status.as_u16(), %url, "request rejected");
            Err(HttpError::api(status.as_u16(), body))
        }
    }

    /// Like [`request`](Self::request), using the stored token unless the
    /// config already carries one.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request).
    pub async fn authorized_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut config: RequestConfig,
    ) -> Result<T, HttpError> {
        if config.token.is_none() {
            config.token = self.tokens.token();
        }
        self.request(endpoint, config).await
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpClient")
            .field("api_url", &self.config.api_url.as_str())
            .field("authenticated", &self.tokens.token().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use reqwest::Url;
    use rstest::rstest;
    use serde_json::json;

    fn client(base: &str) -> HttpClient {
        let config = ClientConfig::new(Url::parse(base).unwrap());
        HttpClient::new(config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[rstest]
    #[case("http://localhost:3001", "projects", "http://localhost:3001/projects")]
    #[case("http://localhost:3001/", "projects/1", "http://localhost:3001/projects/1")]
    #[case("http://localhost:3001/api/", "/users", "http://localhost:3001/api/users")]
    fn endpoints_are_appended_to_the_base(#[case] base: &str, #[case] endpoint: &str, #[case] expected: &str) {
        assert_eq!(client(base).endpoint_url(endpoint), expected);
    }

    #[rstest]
    fn request_config_defaults_to_get() {
        let config = RequestConfig::default();

        assert_eq!(config.method, Method::GET);
        assert!(config.data.is_none());
        assert!(config.token.is_none());
    }

    #[rstest]
    fn request_config_builders() {
        let config = RequestConfig::new(Method::POST)
            .with_data(&json!({ "name": "alpha" }))
            .unwrap()
            .with_token("123")
            .with_header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc"),
            );

        assert_eq!(config.data, Some(json!({ "name": "alpha" })));
        assert_eq!(config.token.as_deref(), Some("123"));
        assert_eq!(config.headers["x-request-id"], "abc");
    }

    #[rstest]
    fn debug_hides_the_token() {
        let client = client("http://localhost:3001");
        client.tokens().set_token("secret".to_string());

        let debug = format!("{client:?}");

        assert!(debug.contains("authenticated: true"));
        assert!(!debug.contains("secret"));
    }
}
