//! Route configuration for the mock API.
//!
//! # Routes
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | POST | /login | `login` | Exchange the demo credentials for a token |
//! | POST | /register | `register` | Create a user and log it in |
//! | GET | /{collection} | `list_records` | Filtered, sorted listing |
//! | POST | /{collection} | `create_record` | Insert a record |
//! | GET | /{collection}/{id} | `get_record` | One record |
//! | PUT | /{collection}/{id} | `replace_record` | Replace a record |
//! | PATCH | /{collection}/{id} | `update_record` | Merge into a record |
//! | DELETE | /{collection}/{id} | `delete_record` | Remove a record |
//!
//! Collection routes reject a bearer token the server never issued with 401.
//! Requests without an `Authorization` header are served.

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::MockError;
use crate::store::{Database, ListQuery, Record};

/// The only token the server hands out.
pub const ISSUED_TOKEN: &str = "123";

/// User name accepted by `/login`.
pub const DEMO_USERNAME: &str = "jack";

/// Password accepted by `/login`.
pub const DEMO_PASSWORD: &str = "123456";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    database: Arc<Database>,
}

impl AppState {
    /// Wraps `database`.
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database: Arc::new(database),
        }
    }

    /// The backing database.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }
}

/// Login and registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// POST /login - Exchange the demo credentials for a token.
///
/// # Errors
///
/// `MockError::InvalidCredentials` (400) for any other pair.
pub async fn login(Json(form): Json<CredentialsForm>) -> Result<Json<Value>, MockError> {
    if form.username == DEMO_USERNAME && form.password == DEMO_PASSWORD {
        tracing::info!(username = %form.username, "login accepted");
        Ok(Json(json!({ "user": { "token": ISSUED_TOKEN } })))
    } else {
        tracing::info!(username = %form.username, "login rejected");
        Err(MockError::InvalidCredentials)
    }
}

/// POST /register - Create a user and log it in.
///
/// # Errors
///
/// `MockError::BadRequest` (400) for an empty field or a taken name.
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<Value>, MockError> {
    if form.username.is_empty() || form.password.is_empty() {
        return Err(MockError::BadRequest("username and password are required".to_string()));
    }
    let existing = state.database().list(
        "users",
        &ListQuery::from_pairs([("name".to_string(), form.username.clone())]),
    )?;
    if !existing.is_empty() {
        return Err(MockError::BadRequest(format!("user {} already exists", form.username)));
    }

    let mut user = Record::new();
    user.insert("name".to_string(), Value::String(form.username));
    let mut user = state.database().insert("users", user)?;
    user.insert("token".to_string(), Value::String(ISSUED_TOKEN.to_string()));
    Ok(Json(json!({ "user": user })))
}

/// GET /{collection}
///
/// # Errors
///
/// `MockError::UnknownCollection` (404).
pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Record>>, MockError> {
    let query = ListQuery::from_pairs(pairs);
    state.database().list(&collection, &query).map(Json)
}

/// GET /{collection}/{id}
///
/// # Errors
///
/// `MockError::UnknownCollection` or `MockError::NotFound` (404).
pub async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
) -> Result<Json<Record>, MockError> {
    state.database().get(&collection, id).map(Json)
}

/// POST /{collection}
///
/// # Errors
///
/// `MockError::BadRequest` (400) unless the body is an object with a free id.
pub async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Record>), MockError> {
    let record = state.database().insert(&collection, into_record(body)?)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /{collection}/{id}
///
/// # Errors
///
/// `MockError::BadRequest` (400) or `MockError::NotFound` (404).
pub async fn replace_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
    Json(body): Json<Value>,
) -> Result<Json<Record>, MockError> {
    state
        .database()
        .replace(&collection, id, into_record(body)?)
        .map(Json)
}

/// PATCH /{collection}/{id}
///
/// # Errors
///
/// `MockError::BadRequest` (400) or `MockError::NotFound` (404).
pub async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
    Json(body): Json<Value>,
) -> Result<Json<Record>, MockError> {
    state
        .database()
        .update(&collection, id, into_record(body)?)
        .map(Json)
}

/// DELETE /{collection}/{id}
///
/// # Errors
///
/// `MockError::NotFound` (404).
pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
) -> Result<Json<Value>, MockError> {
    state.database().remove(&collection, id)?;
    Ok(Json(json!({})))
}

fn into_record(body: Value) -> Result<Record, MockError> {
    match body {
        Value::Object(record) => Ok(record),
        _ => Err(MockError::BadRequest("request body must be an object".to_string())),
    }
}

/// Rejects bearer tokens other than [`ISSUED_TOKEN`].
pub async fn require_issued_token(request: Request, next: Next) -> Response {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return next.run(request).await;
    };
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "));
    if token == Some(ISSUED_TOKEN) {
        next.run(request).await
    } else {
        MockError::Unauthorized.into_response()
    }
}

/// Creates the router with all mock routes.
///
/// # Example
///
/// ```rust,ignore
/// use taskboard_mock::{AppState, Database, create_router};
///
/// let router = create_router(AppState::new(Database::seeded()));
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
/// axum::serve(listener, router).await?;
/// ```
pub fn create_router(state: AppState) -> Router {
    let collections = Router::new()
        .route("/{collection}", get(list_records).post(create_record))
        .route(
            "/{collection}/{id}",
            get(get_record)
                .put(replace_record)
                .patch(update_record)
                .delete(delete_record),
        )
        .route_layer(middleware::from_fn(require_issued_token));

    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .merge(collections)
        .with_state(state)
}
