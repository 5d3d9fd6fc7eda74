//! Application-level errors

use thiserror::Error;

/// Application errors add use-case context to failures below the domain.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Why a single catalog line was rejected.
///
/// Line errors never abort a load; they are reported and the line skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("expected 4 fields separated by ';', found {found}")]
    MissingFields { found: usize },

    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}
