//! Database error types.

use std::path::PathBuf;

use novabridge_core::ErrorKind;
use thiserror::Error;

/// Database error type.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sonar database not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unexpected value in column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
}

impl DbError {
    /// Classify this error. Every database failure is a config store error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sqlite(_) | Self::NotFound(_) | Self::InvalidValue { .. } => {
                ErrorKind::ConfigStore
            }
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
