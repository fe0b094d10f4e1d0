//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! missing or malformed record fields, invalid identifiers and invalid
//! manifest paths.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field is absent from a record (or is not a string)
    #[error("Missing field '{field}'")]
    MissingField {
        /// Name of the absent field
        field: String,
    },

    /// A timestamp field is absent or could not be parsed
    #[error("Malformed timestamp in field '{field}': {value}")]
    MalformedTimestamp {
        /// Name of the timestamp field
        field: String,
        /// The raw value found (or `<absent>`)
        value: String,
    },

    /// Invalid slug (identifier segment)
    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    /// Invalid manifest path
    #[error("Invalid manifest path: {0}")]
    InvalidPath(String),

    /// A JSON value was expected to be an object
    #[error("Expected a JSON object, found {0}")]
    NotAnObject(String),
}
