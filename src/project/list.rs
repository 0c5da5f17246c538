//! The project list screen, minus the rendering.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Url;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::api::ProjectApi;
use super::model::{Project, ProjectPatch, ProjectSearchParams, ProjectSort, User, display_person, sort_projects};
use crate::async_state::{AsyncConfig, AsyncState, AsyncStateMachine, RetrySpec, RunOutput, Subscription};
use crate::debounce::Debounced;
use crate::http::HttpError;
use crate::query::{QueryError, UrlQueryParams};

/// Quiet period between the last search input and the list request.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Search, load and edit the project list.
///
/// The search form lives in the location's query string. Every change is
/// written there immediately and fed to a [`Debounced`] holder; requests are
/// made with the stabilized params only. Loading of projects and users is
/// tracked by two [`AsyncStateMachine`]s that are torn down with the list.
#[derive(Debug)]
pub struct ProjectList {
    api: ProjectApi,
    location: UrlQueryParams,
    search: Debounced<ProjectSearchParams>,
    projects: AsyncStateMachine<Vec<Project>, HttpError>,
    users: AsyncStateMachine<Vec<User>, HttpError>,
}

impl ProjectList {
    /// Opens the list at `location`, reading the initial search from its
    /// query string.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    #[must_use]
    pub fn new(api: ProjectApi, location: Url) -> Self {
        let location = UrlQueryParams::new(location);
        let initial = ProjectSearchParams::from_query(&location.get(&ProjectSearchParams::KEYS));
        Self {
            api,
            location,
            search: Debounced::new(initial),
            projects: AsyncStateMachine::new(AsyncConfig::default()),
            users: AsyncStateMachine::new(AsyncConfig::default()),
        }
    }

    /// The search params currently in the location.
    #[must_use]
    pub fn params(&self) -> ProjectSearchParams {
        ProjectSearchParams::from_query(&self.location.get(&ProjectSearchParams::KEYS))
    }

    /// Writes `params` to the location and restarts the search quiet period.
    ///
    /// Returns the stabilized params, which lag behind until
    /// [`SEARCH_DEBOUNCE`] has passed without another change.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the params cannot be written to the URL.
    pub fn set_params(&mut self, params: &ProjectSearchParams) -> Result<ProjectSearchParams, QueryError> {
        self.location.set(&params.to_query_object())?;
        let current = self.params();
        Ok(self.search.observe(current, SEARCH_DEBOUNCE))
    }

    /// The debounced search params.
    #[must_use]
    pub fn stabilized_params(&self) -> ProjectSearchParams {
        self.search.current()
    }

    /// Receiver woken whenever the debounced search params change.
    #[must_use]
    pub fn param_changes(&self) -> watch::Receiver<ProjectSearchParams> {
        self.search.subscribe()
    }

    /// The current location.
    #[must_use]
    pub const fn location(&self) -> &Url {
        self.location.url()
    }

    /// Loads the projects matching the debounced search.
    ///
    /// The state moves to `Loading` immediately. The request is replayable
    /// through [`retry`](Self::retry).
    pub fn refresh(&self) -> impl Future<Output = RunOutput<Vec<Project>, HttpError>> + Send + use<> {
        let params = self.stabilized_params();
        let retry_api = self.api.clone();
        let retry_params = params.clone();
        let spec = RetrySpec::new(move || {
            let api = retry_api.clone();
            let params = retry_params.clone();
            async move { api.list(&params).await }
        });

        let api = self.api.clone();
        self.projects.run(async move { api.list(&params).await }, Some(spec))
    }

    /// Replays the last [`refresh`](Self::refresh).
    #[must_use = "the retried operation only runs when the returned future is polled"]
    pub fn retry(&self) -> Option<BoxFuture<'static, RunOutput<Vec<Project>, HttpError>>> {
        self.projects.retry()
    }

    /// Replays the last [`refresh`](Self::refresh) in the background.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn spawn_retry(&self) -> Option<JoinHandle<RunOutput<Vec<Project>, HttpError>>> {
        self.projects.spawn_retry()
    }

    /// Loads the users the person filter and the table refer to.
    pub fn load_users(&self) -> impl Future<Output = RunOutput<Vec<User>, HttpError>> + Send + use<> {
        let api = self.api.clone();
        self.users.run(async move { api.users().await }, None)
    }

    /// Pins or unpins a project.
    ///
    /// The loaded list is updated right away and restored if the backend
    /// rejects the change; on success the list is reloaded.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`HttpError`].
    pub async fn pin(&self, id: u64, pin: bool) -> Result<Project, HttpError> {
        let patch = ProjectPatch::pin(pin);
        let previous = self.optimistic(|projects| {
            projects
                .iter_mut()
                .filter(|project| project.id == id)
                .for_each(|project| patch.apply_to(project));
        });

        match self.api.edit(id, &patch).await {
            Ok(project) => {
                self.refresh().await?;
                Ok(project)
            }
            Err(error) => {
                self.rollback(previous, id, &error);
                Err(error)
            }
        }
    }

    /// Deletes a project, removing it from the loaded list right away.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`HttpError`]; the list is restored in that case.
    pub async fn delete(&self, id: u64) -> Result<(), HttpError> {
        let previous = self.optimistic(|projects| projects.retain(|project| project.id != id));

        match self.api.delete(id).await {
            Ok(()) => {
                self.refresh().await?;
                Ok(())
            }
            Err(error) => {
                self.rollback(previous, id, &error);
                Err(error)
            }
        }
    }

    fn optimistic<F>(&self, update: F) -> Option<Vec<Project>>
    where
        F: FnOnce(&mut Vec<Project>),
    {
        let previous = self.projects.data()?;
        let mut updated = previous.clone();
        update(&mut updated);
        self.projects.set_data(updated);
        Some(previous)
    }

    fn rollback(&self, previous: Option<Vec<Project>>, id: u64, error: &HttpError) {
        tracing::debug!(id, %error, "rolling back optimistic update");
        if let Some(previous) = previous {
            self.projects.set_data(previous);
        }
    }

    /// The loaded projects in the requested order (empty until loaded).
    #[must_use]
    pub fn sorted(&self, sort: ProjectSort) -> Vec<Project> {
        let mut projects = self.projects.data().unwrap_or_default();
        sort_projects(&mut projects, sort);
        projects
    }

    /// Name of the person in charge, or `unknown`.
    #[must_use]
    pub fn person_name(&self, person_id: u64) -> String {
        let users = self.users.data().unwrap_or_default();
        display_person(&users, person_id).to_string()
    }

    /// Snapshot of the project loading state.
    #[must_use]
    pub fn state(&self) -> AsyncState<Vec<Project>, HttpError> {
        self.projects.state()
    }

    /// Snapshot of the user loading state.
    #[must_use]
    pub fn users_state(&self) -> AsyncState<Vec<User>, HttpError> {
        self.users.state()
    }

    /// Observes every applied project state.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&AsyncState<Vec<Project>, HttpError>) + Send + Sync + 'static,
    {
        self.projects.subscribe(observer)
    }

    /// Closes the screen; in-flight requests no longer touch its state.
    pub fn teardown(&self) {
        self.projects.teardown();
        self.users.teardown();
    }
}
