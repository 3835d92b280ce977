//! Error types for pgfluent

use thiserror::Error;

/// Result type alias for pgfluent operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Missing or unusable connection parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection error (handshake, charset setup)
    #[error("Connection error: {0}")]
    Connection(String),

    /// A composite value (array/object) was passed where a scalar is expected
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Unknown join type, order direction, query option, operator or interval unit
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The statement failed to prepare (syntax error, unknown relation, ...)
    #[error("Unable to prepare statement, check your syntax ({sql}): {message}")]
    Prepare { sql: String, message: String },

    /// The statement was prepared but failed to execute
    #[error("Database execution failed: {0}")]
    Execution(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an unsupported type error
    pub fn unsupported_type(message: impl Into<String>) -> Self {
        Self::UnsupportedType(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a prepare error for the given SQL
    pub fn prepare(sql: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Prepare {
            sql: sql.into(),
            message: message.to_string(),
        }
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is an unsupported type error
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, Self::UnsupportedType(_))
    }

    /// Check if this is a prepare error
    pub fn is_prepare(&self) -> bool {
        matches!(self, Self::Prepare { .. })
    }

    /// Parse a tokio_postgres error into an execution error carrying the server message
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let code = db_err.code().code();
            let message = match db_err.constraint() {
                Some(constraint) => format!("{} ({}: {})", db_err.message(), code, constraint),
                None => format!("{} ({})", db_err.message(), code),
            };
            return Self::Execution(message);
        }
        Self::Query(err)
    }
}
