//! Error types for docdb-utils
//!
//! A single error enum is shared by every helper so that callers can
//! propagate connection, readonly and validation failures with `?`.

use thiserror::Error;

/// Result type for database helper operations
pub type DbResult<T> = Result<T, DbError>;

/// Errors surfaced by the connector, hooks, validators and store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    /// The driver could not open a connection
    #[error("connection error: {0}")]
    Connection(String),

    /// The connection string could not be parsed
    #[error("invalid connection string '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// An update tried to change a readonly field
    #[error("field {field} is read-only")]
    ReadOnly { field: String },

    /// A document failed schema or field validation
    #[error("validation failed at '{path}': {message}")]
    Validation { path: String, message: String },

    /// Document or collection not found
    #[error("not found: {0}")]
    NotFound(String),

    /// No schema registered under this model name
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Backend failure (lock poisoning, duplicate key, ...)
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DbError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an invalid connection string error
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create a readonly violation error
    pub fn read_only(field: impl Into<String>) -> Self {
        Self::ReadOnly {
            field: field.into(),
        }
    }

    /// Create a validation error
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable error code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "DB_CONNECTION_FAILED",
            Self::InvalidUri { .. } => "DB_INVALID_URI",
            Self::ReadOnly { .. } => "DB_READONLY_FIELD",
            Self::Validation { .. } => "DB_VALIDATION_FAILED",
            Self::NotFound(_) => "DB_NOT_FOUND",
            Self::UnknownModel(_) => "DB_UNKNOWN_MODEL",
            Self::Storage(_) => "DB_STORAGE_ERROR",
            Self::Serialization(_) => "DB_SERIALIZATION_ERROR",
        }
    }

    /// Whether the caller sent something the helpers refused
    ///
    /// Client errors should not be retried unchanged.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUri { .. }
                | Self::ReadOnly { .. }
                | Self::Validation { .. }
                | Self::NotFound(_)
                | Self::UnknownModel(_)
        )
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_message_names_field() {
        let err = DbError::read_only("owner");
        assert_eq!(err.to_string(), "field owner is read-only");
        assert_eq!(err.code(), "DB_READONLY_FIELD");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(DbError::validation("tags", "too many").is_client_error());
        assert!(DbError::read_only("sn").is_client_error());
        assert!(!DbError::connection("refused").is_client_error());
        assert!(!DbError::storage("poisoned").is_client_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DbError = parse_err.into();
        assert!(matches!(err, DbError::Serialization(_)));
    }
}
