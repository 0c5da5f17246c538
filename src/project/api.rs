//! REST endpoints of the project domain.

use reqwest::Method;
use serde_json::Value;

use super::model::{Project, ProjectPatch, ProjectSearchParams, User};
use crate::http::{HttpClient, HttpError, RequestConfig};
use crate::query::clean_object;

/// Typed access to `projects` and `users`.
///
/// Every call is authorized with the client's stored token.
#[derive(Debug, Clone)]
pub struct ProjectApi {
    client: HttpClient,
}

impl ProjectApi {
    /// Wraps `client`.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &HttpClient {
        &self.client
    }

    /// `GET projects`, filtered by the non-empty fields of `params`.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn list(&self, params: &ProjectSearchParams) -> Result<Vec<Project>, HttpError> {
        let filter = Value::Object(clean_object(&params.to_query_object()));
        let config = RequestConfig {
            data: Some(filter),
            ..RequestConfig::default()
        };
        self.client.authorized_request("projects", config).await
    }

    /// `GET projects/{id}`.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`] (404 for unknown ids).
    pub async fn get(&self, id: u64) -> Result<Project, HttpError> {
        self.client
            .authorized_request(&format!("projects/{id}"), RequestConfig::default())
            .await
    }

    /// `POST projects`.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn add(&self, patch: &ProjectPatch) -> Result<Project, HttpError> {
        let config = RequestConfig::new(Method::POST).with_data(patch)?;
        self.client.authorized_request("projects", config).await
    }

    /// `PATCH projects/{id}`.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn edit(&self, id: u64, patch: &ProjectPatch) -> Result<Project, HttpError> {
        let config = RequestConfig::new(Method::PATCH).with_data(patch)?;
        self.client
            .authorized_request(&format!("projects/{id}"), config)
            .await
    }

    /// `DELETE projects/{id}`.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn delete(&self, id: u64) -> Result<(), HttpError> {
        let _: Value = self
            .client
            .authorized_request(&format!("projects/{id}"), RequestConfig::new(Method::DELETE))
            .await?;
        Ok(())
    }

    /// `GET users`.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn users(&self) -> Result<Vec<User>, HttpError> {
        self.client
            .authorized_request("users", RequestConfig::default())
            .await
    }
}
