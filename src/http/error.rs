//! Errors produced by the REST client.

use std::sync::Arc;

use serde_json::Value;

/// Message carried by [`HttpError::Unauthorized`].
pub const RELOGIN_MESSAGE: &str = "please log in again";

/// Failure of a REST request.
///
/// The type is `Clone` so that it can be stored in an
/// [`AsyncState`](crate::async_state::AsyncState); transport errors are
/// shared through an `Arc` for that reason.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    /// The server answered 401; the stored token has been cleared.
    #[error("{}", RELOGIN_MESSAGE)]
    Unauthorized,

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message taken from the error body.
        message: String,
        /// The parsed error body (`null` when the body was empty).
        body: Value,
    },

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Transport(Arc<reqwest::Error>),

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The request data could not be encoded.
    #[error("invalid request data: {0}")]
    Encode(String),

    /// The client could not be constructed.
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

impl HttpError {
    /// Builds an [`HttpError::Api`] from a status and a parsed error body.
    ///
    /// The message is the body's `message` field when it is a string.
    #[must_use]
    pub fn api(status: u16, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| format!("request failed with status {status}"), str::to_string);
        Self::Api {
            status,
            message,
            body,
        }
    }

    /// The message a user interface should display.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The HTTP status associated with the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(Arc::new(error))
    }
}
