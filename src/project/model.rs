//! Wire types of the project domain.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name shown when a project's person cannot be resolved.
pub const UNKNOWN_PERSON: &str = "unknown";

/// A project as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    /// Identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Id of the responsible [`User`].
    pub person_id: u64,
    /// Whether the project is pinned (favourite).
    pub pin: bool,
    /// Owning organization.
    pub organization: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: u64,
}

/// A user that can be put in charge of projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Session token, only present on the logged-in user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Search form of the project list.
///
/// Serialized with explicit `null`s so that clearing a field also clears it
/// from the location's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSearchParams {
    /// Substring of the project name.
    pub name: Option<String>,
    /// Id of the responsible person.
    pub person_id: Option<u64>,
}

impl ProjectSearchParams {
    /// Query-string keys the search form owns.
    pub const KEYS: [&'static str; 2] = ["name", "personId"];

    /// Params filtering by name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            person_id: None,
        }
    }

    /// Returns a copy filtering by `person_id` as well.
    #[must_use]
    pub const fn with_person(mut self, person_id: u64) -> Self {
        self.person_id = Some(person_id);
        self
    }

    /// The params as a JSON object, with `null` for unset fields.
    #[must_use]
    pub fn to_query_object(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert(
            "name".to_string(),
            self.name.clone().map_or(Value::Null, Value::String),
        );
        object.insert(
            "personId".to_string(),
            self.person_id.map_or(Value::Null, Value::from),
        );
        object
    }

    /// Reads the params back from query-string values.
    ///
    /// Empty names and person ids that are not numbers read as unset.
    #[must_use]
    pub fn from_query(query: &BTreeMap<String, String>) -> Self {
        Self {
            name: query.get("name").filter(|name| !name.is_empty()).cloned(),
            person_id: query.get("personId").and_then(|id| id.parse().ok()),
        }
    }
}

/// Partial project sent on create (`POST`) and edit (`PATCH`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New responsible person.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<u64>,
    /// New pin flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<bool>,
    /// New organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl ProjectPatch {
    /// A patch changing only the pin flag.
    #[must_use]
    pub const fn pin(pin: bool) -> Self {
        Self {
            name: None,
            person_id: None,
            pin: Some(pin),
            organization: None,
        }
    }

    /// Applies the patch to `project` in place.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name.clone_from(name);
        }
        if let Some(person_id) = self.person_id {
            project.person_id = person_id;
        }
        if let Some(pin) = self.pin {
            project.pin = pin;
        }
        if let Some(organization) = &self.organization {
            project.organization.clone_from(organization);
        }
    }
}

/// Orderings offered by the project table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProjectSort {
    /// As returned by the backend.
    #[default]
    Unsorted,
    /// Alphabetically by name.
    Name,
    /// Oldest first.
    Created,
    /// Pinned projects before the others, each group in backend order.
    PinnedFirst,
}

/// Sorts `projects` in place. The sort is stable.
pub fn sort_projects(projects: &mut [Project], sort: ProjectSort) {
    match sort {
        ProjectSort::Unsorted => {}
        ProjectSort::Name => projects.sort_by(|left, right| left.name.cmp(&right.name)),
        ProjectSort::Created => projects.sort_by_key(|project| project.created),
        ProjectSort::PinnedFirst => projects.sort_by_key(|project| Reverse(project.pin)),
    }
}

/// Resolves the name of the person in charge, or [`UNKNOWN_PERSON`].
#[must_use]
pub fn display_person(users: &[User], person_id: u64) -> &str {
    users
        .iter()
        .find(|user| user.id == person_id)
        .map_or(UNKNOWN_PERSON, |user| user.name.as_str())
}
