//! In-memory collections of JSON records.
//!
//! Every collection is a list of JSON objects with a numeric `id`. Listing
//! supports the query conventions of the project list:
//!
//! | Parameter | Meaning |
//! |-----------|---------|
//! | `field=value` | keep records whose `field` renders as `value` (repeat for OR) |
//! | `field_like=text` | keep records whose `field` contains `text`, ignoring case |
//! | `_sort=field` | order by `field` |
//! | `_order=asc\|desc` | sort direction (default `asc`) |

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::MockError;

/// A stored record.
pub type Record = Map<String, Value>;

/// Sort direction of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Ascending,
    /// Descending.
    Descending,
}

/// Parsed listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    equals: BTreeMap<String, Vec<String>>,
    like: BTreeMap<String, Vec<String>>,
    sort: Option<String>,
    order: SortOrder,
}

impl ListQuery {
    /// Parses decoded query-string pairs. Unknown `_` parameters are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "_sort" => query.sort = Some(value),
                "_order" => {
                    query.order = if value.eq_ignore_ascii_case("desc") {
                        SortOrder::Descending
                    } else {
                        SortOrder::Ascending
                    };
                }
                other if other.starts_with('_') => {}
                other => match other.strip_suffix("_like") {
                    Some(field) => query.like.entry(field.to_string()).or_default().push(value),
                    None => query.equals.entry(other.to_string()).or_default().push(value),
                },
            }
        }
        query
    }

    fn matches(&self, record: &Record) -> bool {
        let equals = self.equals.iter().all(|(field, values)| {
            record
                .get(field)
                .and_then(render)
                .is_some_and(|rendered| values.contains(&rendered))
        });
        let like = self.like.iter().all(|(field, patterns)| {
            record.get(field).and_then(render).is_some_and(|rendered| {
                let rendered = rendered.to_lowercase();
                patterns
                    .iter()
                    .any(|pattern| rendered.contains(&pattern.to_lowercase()))
            })
        });
        equals && like
    }

    fn compare(&self, left: &Record, right: &Record) -> Ordering {
        let Some(field) = &self.sort else {
            return Ordering::Equal;
        };
        let ordering = compare_values(left.get(field), right.get(field));
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (left, right) => left
            .and_then(render)
            .cmp(&right.and_then(render)),
    }
}

fn record_id(record: &Record) -> Option<u64> {
    record.get("id").and_then(Value::as_u64)
}

/// The mock database.
#[derive(Debug, Default)]
pub struct Database {
    collections: RwLock<BTreeMap<String, Vec<Record>>>,
}

impl Database {
    /// Empty `projects` and `users` collections.
    #[must_use]
    pub fn new() -> Self {
        let collections = ["projects", "users"]
            .into_iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        Self {
            collections: RwLock::new(collections),
        }
    }

    /// A small set of users and projects for local development.
    #[must_use]
    pub fn seeded() -> Self {
        let users = [(1, "jack"), (2, "rose"), (3, "tom")]
            .into_iter()
            .map(|(id, name)| {
                Record::from_iter([
                    ("id".to_string(), Value::from(id)),
                    ("name".to_string(), Value::from(name)),
                ])
            })
            .collect();
        let projects = [
            (1, "skeleton", 1, "platform", 1_604_989_757_139_u64, false),
            (2, "payments", 2, "finance", 1_604_989_757_139, true),
            (3, "mobile app", 3, "product", 1_546_300_800_000, false),
            (4, "admin console", 1, "platform", 1_609_459_200_000, false),
        ]
        .into_iter()
        .map(|(id, name, person_id, organization, created, pin)| {
            Record::from_iter([
                ("id".to_string(), Value::from(id)),
                ("name".to_string(), Value::from(name)),
                ("personId".to_string(), Value::from(person_id)),
                ("organization".to_string(), Value::from(organization)),
                ("created".to_string(), Value::from(created)),
                ("pin".to_string(), Value::from(pin)),
            ])
        })
        .collect();

        let database = Self::new();
        {
            let mut collections = database.collections.write();
            collections.insert("users".to_string(), users);
            collections.insert("projects".to_string(), projects);
        }
        database
    }

    /// Builds a database from an object of record arrays.
    ///
    /// # Errors
    ///
    /// Returns `MockError::Storage` unless `value` is an object whose values
    /// are arrays of objects.
    pub fn from_json(value: Value) -> Result<Self, MockError> {
        let Value::Object(object) = value else {
            return Err(MockError::Storage("expected an object of collections".to_string()));
        };

        let mut collections = BTreeMap::new();
        for (name, records) in object {
            let Value::Array(records) = records else {
                return Err(MockError::Storage(format!("collection {name} is not an array")));
            };
            let records = records
                .into_iter()
                .map(|record| match record {
                    Value::Object(record) => Ok(record),
                    _ => Err(MockError::Storage(format!("collection {name} holds a non-object"))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            collections.insert(name, records);
        }
        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    /// Reads a database from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `MockError::Storage` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, MockError> {
        let text = std::fs::read_to_string(path)
            .map_err(|error| MockError::Storage(format!("{}: {error}", path.display())))?;
        let value = serde_json::from_str(&text).map_err(|error| MockError::Storage(error.to_string()))?;
        Self::from_json(value)
    }

    /// Lists the records of `collection` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `MockError::UnknownCollection` for a missing collection.
    pub fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Record>, MockError> {
        let collections = self.collections.read();
        let records = collections
            .get(collection)
            .ok_or_else(|| MockError::UnknownCollection(collection.to_string()))?;

        let mut matching: Vec<Record> = records
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|left, right| query.compare(left, right));
        Ok(matching)
    }

    /// Returns one record.
    ///
    /// # Errors
    ///
    /// Returns `MockError::UnknownCollection` or `MockError::NotFound`.
    pub fn get(&self, collection: &str, id: u64) -> Result<Record, MockError> {
        let collections = self.collections.read();
        let records = collections
            .get(collection)
            .ok_or_else(|| MockError::UnknownCollection(collection.to_string()))?;
        records
            .iter()
            .find(|record| record_id(record) == Some(id))
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    /// Inserts `record`, assigning the next free id when it has none.
    ///
    /// # Errors
    ///
    /// Returns `MockError::UnknownCollection`, or `MockError::BadRequest` if
    /// the id is already taken.
    pub fn insert(&self, collection: &str, mut record: Record) -> Result<Record, MockError> {
        let mut collections = self.collections.write();
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| MockError::UnknownCollection(collection.to_string()))?;

        let id = match record_id(&record) {
            Some(id) if records.iter().any(|existing| record_id(existing) == Some(id)) => {
                return Err(MockError::BadRequest(format!("{collection}/{id} already exists")));
            }
            Some(id) => id,
            None => records.iter().filter_map(record_id).max().unwrap_or(0) + 1,
        };
        record.insert("id".to_string(), Value::from(id));
        records.push(record.clone());
        tracing::debug!(collection, id, "record inserted");
        Ok(record)
    }

    /// Replaces a record, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns `MockError::UnknownCollection` or `MockError::NotFound`.
    pub fn replace(&self, collection: &str, id: u64, mut record: Record) -> Result<Record, MockError> {
        record.insert("id".to_string(), Value::from(id));
        self.modify(collection, id, |existing| *existing = record)
    }

    /// Merges `patch` into a record, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns `MockError::UnknownCollection` or `MockError::NotFound`.
    pub fn update(&self, collection: &str, id: u64, patch: Record) -> Result<Record, MockError> {
        self.modify(collection, id, |existing| {
            for (key, value) in patch {
                if key != "id" {
                    existing.insert(key, value);
                }
            }
        })
    }

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns `MockError::UnknownCollection` or `MockError::NotFound`.
    pub fn remove(&self, collection: &str, id: u64) -> Result<(), MockError> {
        let mut collections = self.collections.write();
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| MockError::UnknownCollection(collection.to_string()))?;
        let position = records
            .iter()
            .position(|record| record_id(record) == Some(id))
            .ok_or_else(|| not_found(collection, id))?;
        records.remove(position);
        tracing::debug!(collection, id, "record removed");
        Ok(())
    }

    fn modify<F>(&self, collection: &str, id: u64, change: F) -> Result<Record, MockError>
    where
        F: FnOnce(&mut Record),
    {
        let mut collections = self.collections.write();
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| MockError::UnknownCollection(collection.to_string()))?;
        let record = records
            .iter_mut()
            .find(|record| record_id(record) == Some(id))
            .ok_or_else(|| not_found(collection, id))?;
        change(record);
        tracing::debug!(collection, id, "record modified");
        Ok(record.clone())
    }
}

fn not_found(collection: &str, id: u64) -> MockError {
    MockError::NotFound {
        collection: collection.to_string(),
        id,
    }
}
