//! Sonar error types.

use std::path::PathBuf;

use novabridge_core::ErrorKind;
use novabridge_db::DbError;
use thiserror::Error;

/// Sonar error type.
#[derive(Debug, Error)]
pub enum SonarError {
    #[error("Cannot read {}: {source}", .path.display())]
    CorePropsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid core props file {}: {source}", .path.display())]
    CorePropsInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("coreProps.json does not include '{0}'")]
    MissingAddress(&'static str),

    #[error("Sonar unavailable: {0}")]
    Unavailable(String),

    #[error("Request to {url} failed{}: {message}", status_suffix(*.status))]
    Request { url: String, status: Option<u16>, message: String },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Core(#[from] novabridge_core::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl SonarError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CorePropsUnreadable { .. }
            | Self::CorePropsInvalid { .. }
            | Self::MissingAddress(_)
            | Self::Unavailable(_) => ErrorKind::Discovery,
            Self::Request { .. } | Self::InvalidResponse { .. } => ErrorKind::Request,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Core(err) => err.kind(),
            Self::Database(err) => err.kind(),
        }
    }

    /// HTTP status of a failed request, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_suffix(status: Option<u16>) -> String {
    status.map(|code| format!(" with status {code}")).unwrap_or_default()
}

/// Result type for Sonar operations.
pub type SonarResult<T> = Result<T, SonarError>;
