//! Query-string helpers.
//!
//! Values are handled as `serde_json` objects so that any serializable search
//! form can be written to, and read back from, a URL.
//!
//! # Falsy values
//!
//! `null`, `false` and the empty string are falsy. Numbers are never falsy,
//! so `0` survives [`clean_object`].
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use taskboard::query::clean_object;
//!
//! let cleaned = clean_object(json!({ "name": "", "personId": 0, "pin": null }).as_object().unwrap());
//! assert_eq!(serde_json::Value::Object(cleaned), json!({ "personId": 0 }));
//! ```

use std::collections::BTreeMap;

use reqwest::Url;
use serde_json::{Map, Value};

/// Error converting a value into query pairs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The value is neither an object nor `null`.
    #[error("query parameters must be an object, found {0}")]
    NotAnObject(&'static str),

    /// A field holds an object, which has no query-string form.
    #[error("query parameter {0} cannot be a nested object")]
    Nested(String),
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns `true` for `null`, `false` and `""`.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(_) | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Returns a copy of `object` without its falsy fields.
#[must_use]
pub fn clean_object(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .filter(|(_, value)| !is_falsy(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Returns the fields of `object` whose names appear in `keys`.
#[must_use]
pub fn subset(object: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| object.get(*key).map(|value| ((*key).to_string(), value.clone())))
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Flattens a JSON object into `(key, value)` pairs for a query string.
///
/// `null` fields are skipped and arrays become repeated keys. A top-level
/// `null` yields no pairs.
///
/// # Errors
///
/// - `QueryError::NotAnObject` if `value` is not an object or `null`
/// - `QueryError::Nested` if a field (or an array element) is an object
pub fn to_query_pairs(value: &Value) -> Result<Vec<(String, String)>, QueryError> {
    let object = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(object) => object,
        other => return Err(QueryError::NotAnObject(kind(other))),
    };

    let mut pairs = Vec::with_capacity(object.len());
    for (key, field) in object {
        match field {
            Value::Object(_) => return Err(QueryError::Nested(key.clone())),
            Value::Array(items) => {
                for item in items {
                    if item.is_object() {
                        return Err(QueryError::Nested(key.clone()));
                    }
                    pairs.extend(scalar_to_string(item).map(|text| (key.clone(), text)));
                }
            }
            scalar => pairs.extend(scalar_to_string(scalar).map(|text| (key.clone(), text))),
        }
    }
    Ok(pairs)
}

/// Typed view over the query string of a location.
///
/// Reads return only the requested keys; writes merge over what is already
/// there, drop falsy values and replace the location's query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlQueryParams {
    url: Url,
}

impl UrlQueryParams {
    /// Wraps `url`.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self { url }
    }

    /// The current location.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Reads `keys` from the query string. Missing keys are absent from the
    /// result; a repeated key keeps its last value.
    #[must_use]
    pub fn get(&self, keys: &[&str]) -> BTreeMap<String, String> {
        self.url
            .query_pairs()
            .filter(|(key, _)| keys.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Merges `params` over the current query and writes the cleaned result
    /// back to the location.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Nested` if a value of `params` is an object.
    pub fn set(&mut self, params: &Map<String, Value>) -> Result<(), QueryError> {
        let mut merged: Map<String, Value> = self
            .url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect();
        for (key, value) in params {
            merged.insert(key.clone(), value.clone());
        }

        let pairs = to_query_pairs(&Value::Object(clean_object(&merged)))?;
        if pairs.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        tracing::trace!(url = %self.url, "location query updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    // =========================================================================
    // is_falsy / clean_object / subset
    // =========================================================================

    #[rstest]
    #[case(json!(null), true)]
    #[case(json!(false), true)]
    #[case(json!(""), true)]
    #[case(json!(0), false)]
    #[case(json!(true), false)]
    #[case(json!("a"), false)]
    #[case(json!([]), false)]
    #[case(json!({}), false)]
    fn falsy_values(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_falsy(&value), expected);
    }

    #[rstest]
    fn clean_object_keeps_zero() {
        let object = json!({ "name": "", "personId": 0, "pin": false, "org": "acme" });
        let cleaned = clean_object(object.as_object().unwrap());

        assert_eq!(Value::Object(cleaned), json!({ "personId": 0, "org": "acme" }));
    }

    #[rstest]
    fn subset_picks_only_present_keys() {
        let object = json!({ "name": "a", "personId": 1, "other": true });
        let picked = subset(object.as_object().unwrap(), &["name", "missing"]);

        assert_eq!(Value::Object(picked), json!({ "name": "a" }));
    }

    // =========================================================================
    // to_query_pairs
    // =========================================================================

    #[rstest]
    fn scalars_become_strings() {
        let pairs = to_query_pairs(&json!({ "name": "a b", "personId": 2, "pin": true, "skip": null })).unwrap();

        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "a b".to_string()),
                ("personId".to_string(), "2".to_string()),
                ("pin".to_string(), "true".to_string()),
            ]
        );
    }

    #[rstest]
    fn arrays_repeat_the_key() {
        let pairs = to_query_pairs(&json!({ "id": [1, 2] })).unwrap();

        assert_eq!(
            pairs,
            vec![("id".to_string(), "1".to_string()), ("id".to_string(), "2".to_string())]
        );
    }

    #[rstest]
    fn null_yields_nothing() {
        assert!(to_query_pairs(&Value::Null).unwrap().is_empty());
    }

    #[rstest]
    #[case(json!(1), QueryError::NotAnObject("number"))]
    #[case(json!("a"), QueryError::NotAnObject("string"))]
    #[case(json!({ "filter": { "a": 1 } }), QueryError::Nested("filter".to_string()))]
    #[case(json!({ "filter": [{ "a": 1 }] }), QueryError::Nested("filter".to_string()))]
    fn unsupported_shapes_are_rejected(#[case] value: Value, #[case] expected: QueryError) {
        assert_eq!(to_query_pairs(&value).unwrap_err(), expected);
    }

    // =========================================================================
    // UrlQueryParams
    // =========================================================================

    fn location(url: &str) -> UrlQueryParams {
        UrlQueryParams::new(Url::parse(url).unwrap())
    }

    #[rstest]
    fn get_reads_requested_keys() {
        let params = location("http://app/projects?name=alpha&personId=2&tab=x");
        let read = params.get(&["name", "personId", "missing"]);

        assert_eq!(read.len(), 2);
        assert_eq!(read["name"], "alpha");
        assert_eq!(read["personId"], "2");
    }

    #[rstest]
    fn get_keeps_the_last_repeated_value() {
        let params = location("http://app/projects?name=a&name=b");
        assert_eq!(params.get(&["name"])["name"], "b");
    }

    #[rstest]
    fn set_merges_over_existing_query() {
        let mut params = location("http://app/projects?tab=x&name=old");
        params.set(json!({ "name": "new", "personId": 3 }).as_object().unwrap()).unwrap();

        let read = params.get(&["tab", "name", "personId"]);
        assert_eq!(read["tab"], "x");
        assert_eq!(read["name"], "new");
        assert_eq!(read["personId"], "3");
    }

    #[rstest]
    fn set_removes_cleared_values() {
        let mut params = location("http://app/projects?name=old");
        params.set(json!({ "name": "", "personId": null }).as_object().unwrap()).unwrap();

        assert_eq!(params.url().query(), None);
    }

    proptest! {
        #[test]
        fn cleaned_objects_have_no_falsy_values(
            entries in proptest::collection::btree_map(
                "[a-z]{1,4}",
                prop_oneof![
                    Just(Value::Null),
                    any::<bool>().prop_map(Value::Bool),
                    any::<i32>().prop_map(Value::from),
                    "[a-z]{0,3}".prop_map(Value::String),
                ],
                0..8,
            )
        ) {
            let object: Map<String, Value> = entries.into_iter().collect();
            let cleaned = clean_object(&object);

            prop_assert!(cleaned.values().all(|value| !is_falsy(value)));
            prop_assert_eq!(
                cleaned.len(),
                object.values().filter(|value| !is_falsy(value)).count()
            );
        }

        #[test]
        fn set_then_get_round_trips_non_empty_strings(
            name in "[a-zA-Z0-9 ]{1,12}",
        ) {
            let mut params = location("http://app/projects");
            let mut update = Map::new();
            update.insert("name".to_string(), Value::String(name.clone()));
            params.set(&update).unwrap();

            let got = params.get(&["name"]);
            prop_assert_eq!(got.get("name"), Some(&name));
        }
    }
}
