//! The project list domain: wire types, REST endpoints and the list screen
//! controller built on [`AsyncStateMachine`](crate::async_state::AsyncStateMachine)
//! and [`Debounced`](crate::debounce::Debounced).

mod api;
mod list;
mod model;

pub use api::ProjectApi;
pub use list::{ProjectList, SEARCH_DEBOUNCE};
pub use model::{
    Project, ProjectPatch, ProjectSearchParams, ProjectSort, UNKNOWN_PERSON, User, display_person, sort_projects,
};
