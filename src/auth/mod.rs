//! Authentication: token storage and the login flow.
//!
//! The token is opaque to the rest of the crate. [`HttpClient`] reads it for
//! authorized requests and clears it when the server answers 401.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::http::{HttpClient, HttpError, RequestConfig};

/// Storage for the session token.
pub trait TokenStore: Send + Sync {
    /// The current token, if logged in.
    fn token(&self) -> Option<String>;

    /// Stores a new token.
    fn set_token(&self, token: String);

    /// Forgets the token (logout).
    fn clear(&self);
}

/// In-process [`TokenStore`].
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// An empty store (logged out).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_token(&self, token: String) {
        *self.token.write() = Some(token);
    }

    fn clear(&self) {
        *self.token.write() = None;
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MemoryTokenStore")
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

/// Login form data.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// The user returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    /// User id, when the backend reports one.
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name, when the backend reports one.
    #[serde(default)]
    pub name: Option<String>,
    /// Session token.
    pub token: String,
}

#[derive(Deserialize)]
struct AuthResponse {
    user: AuthUser,
}

/// Login and logout against the REST backend.
#[derive(Debug, Clone)]
pub struct AuthProvider {
    client: HttpClient,
}

impl AuthProvider {
    /// Creates a provider sharing `client`'s token store.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Posts `credentials` to `login` and stores the returned token.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (for example `HttpError::Api` with
    /// status 400 for wrong credentials) or a transport error.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthUser, HttpError> {
        self.authenticate("login", credentials).await
    }

    /// Posts `credentials` to `register` and stores the returned token.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    pub async fn register(&self, credentials: &Credentials) -> Result<AuthUser, HttpError> {
        self.authenticate("register", credentials).await
    }

    async fn authenticate(&self, endpoint: &str, credentials: &Credentials) -> Result<AuthUser, HttpError> {
        let config = RequestConfig::new(Method::POST).with_data(credentials)?;
        let response: AuthResponse = self.client.request(endpoint, config).await?;
        self.client.tokens().set_token(response.user.token.clone());
        tracing::info!(username = %credentials.username, endpoint, "authenticated");
        Ok(response.user)
    }

    /// Forgets the stored token.
    pub fn logout(&self) {
        self.client.tokens().clear();
        tracing::info!("logged out");
    }

    /// The stored token, if logged in.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.client.tokens().token()
    }

    /// `true` while a token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// The token store shared with the client.
    #[must_use]
    pub fn tokens(&self) -> Arc<dyn TokenStore> {
        Arc::clone(self.client.tokens())
    }
}
