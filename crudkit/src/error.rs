//! Error types for crudkit

use thiserror::Error;

/// The main error type for crudkit operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or execution error, passed through from the driver
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid query configuration (empty projection, empty SET clause, ...)
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// An identifier that cannot be quoted safely
    #[error("Invalid identifier: {message}")]
    InvalidIdentifier { message: String },

    /// A fetch-one read produced no row
    #[error("Empty result: {context}")]
    EmptyResult { context: String },

    /// Column label not present in a result frame
    #[error("Column '{column}' not found in result")]
    ColumnNotFound { column: String },

    /// Row width does not match the number of labels
    #[error("Row has {found} values but {expected} columns are labeled")]
    ColumnCountMismatch { expected: usize, found: usize },

    /// Database type with no `Value` mapping
    #[error("Column '{column}' has unsupported type {type_name}")]
    UnsupportedType { column: String, type_name: String },

    /// Failed to decode a cell
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for crudkit operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new invalid identifier error
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            message: message.into(),
        }
    }

    /// Create a new empty result error
    pub fn empty_result(context: impl Into<String>) -> Self {
        Self::EmptyResult {
            context: context.into(),
        }
    }

    /// Create a new column not found error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Create a new unsupported type error
    pub fn unsupported_type(column: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the error came from the database driver
    pub fn is_database(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}
