//! Entity records and collection snapshots
//!
//! A [`Record`] is the remote API object for an account, repository or
//! document, kept as an untyped JSON object so that the cache holds exactly
//! what the remote returned. The engine only relies on a handful of fields
//! (see [`fields`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DomainError;
use super::newtypes::Slug;
use super::timestamp::parse_timestamp;

/// Well-known field names of remote records
pub mod fields {
    /// Identifier of repositories and documents within their parent
    pub const ID: &str = "slug";
    /// Last-modified timestamp
    pub const UPDATED_AT: &str = "updated_at";
    /// Account login, used to list the account's repositories
    pub const LOGIN: &str = "login";
    /// Repository table of contents (YAML text)
    pub const TOC: &str = "toc_yml";
    /// Document title
    pub const TITLE: &str = "title";
    /// Repository display name
    pub const NAME: &str = "name";
}

/// A single entity record: a JSON object with an id and a timestamp field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an existing JSON object
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a record from any JSON value
    ///
    /// # Errors
    /// Returns [`DomainError::NotAnObject`] if the value is not an object
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    /// Get a raw field value
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a string field value
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Set a field value, returning the previous one
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// The identifier stored in `field`
    ///
    /// # Errors
    /// Returns [`DomainError::MissingField`] if absent or not a string
    pub fn id(&self, field: &str) -> Result<&str, DomainError> {
        self.get_str(field).ok_or_else(|| DomainError::MissingField {
            field: field.to_string(),
        })
    }

    /// The identifier stored in `field`, validated as a [`Slug`]
    ///
    /// # Errors
    /// Returns error if the field is absent or not a valid slug
    pub fn slug(&self, field: &str) -> Result<Slug, DomainError> {
        Slug::new(self.id(field)?)
    }

    /// The parsed timestamp stored in `field`
    ///
    /// # Errors
    /// Returns [`DomainError::MalformedTimestamp`] if absent or unparseable
    pub fn timestamp(&self, field: &str) -> Result<DateTime<Utc>, DomainError> {
        match self.get_str(field) {
            Some(raw) => parse_timestamp(raw).ok_or_else(|| DomainError::MalformedTimestamp {
                field: field.to_string(),
                value: raw.to_string(),
            }),
            None => Err(DomainError::MalformedTimestamp {
                field: field.to_string(),
                value: match self.get(field) {
                    Some(other) => other.to_string(),
                    None => "<absent>".to_string(),
                },
            }),
        }
    }

    /// A short human label for logs: `title`, then `name`, then the slug
    #[must_use]
    pub fn label(&self) -> &str {
        self.get_str(fields::TITLE)
            .or_else(|| self.get_str(fields::NAME))
            .or_else(|| self.get_str(fields::ID))
            .unwrap_or("<unnamed>")
    }

    /// Access the underlying JSON object
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the record into a JSON value
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// All children of one parent as of one point in time, in remote order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<Record>);

impl Snapshot {
    /// Create a snapshot from records in listing order
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self(records)
    }

    /// Build a snapshot from a JSON array of objects
    ///
    /// # Errors
    /// Returns [`DomainError::NotAnObject`] if the value is not an array of
    /// objects
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(Record::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            other => Err(DomainError::NotAnObject(format!(
                "{} (expected an array)",
                json_kind(&other)
            ))),
        }
    }

    /// The records, in order
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    /// Iterate over the records in order
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the first record whose `id_field` equals `id` exactly
    #[must_use]
    pub fn find(&self, id_field: &str, id: &str) -> Option<&Record> {
        self.0.iter().find(|r| r.get_str(id_field) == Some(id))
    }

    /// Identifiers of all records carrying `id_field`, in order
    pub fn ids<'a>(&'a self, id_field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter_map(move |r| r.get_str(id_field))
    }

    /// Consume the snapshot into its records
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.0
    }
}

impl FromIterator<Record> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
