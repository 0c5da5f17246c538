//! Error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Failure of a mock request, rendered as `{ "message": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    /// Login with anything but the demo credentials.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// A bearer token the server never issued.
    #[error("invalid token")]
    Unauthorized,

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// The collection does not exist.
    #[error("unknown collection {0}")]
    UnknownCollection(String),

    /// No record with that id.
    #[error("{collection}/{id} not found")]
    NotFound {
        /// Collection name.
        collection: String,
        /// Requested id.
        id: u64,
    },

    /// The seed file could not be read.
    #[error("cannot load database: {0}")]
    Storage(String),
}

impl MockError {
    /// HTTP status of the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnknownCollection(_) | Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
