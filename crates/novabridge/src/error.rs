//! Facade error type.

use std::path::PathBuf;

use novabridge_core::ErrorKind;
use novabridge_db::DbError;
use novabridge_hid::HidError;
use novabridge_sonar::SonarError;
use thiserror::Error;

/// Any error raised through [`NovaBridge`](crate::NovaBridge).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Hid(#[from] HidError),

    #[error(transparent)]
    Sonar(#[from] SonarError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Core(#[from] novabridge_core::Error),

    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    /// Taxonomy bucket of the underlying error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Hid(e) => e.kind(),
            Self::Sonar(e) => e.kind(),
            Self::Database(e) => e.kind(),
            Self::Core(e) => e.kind(),
            Self::ConfigRead { .. } | Self::ConfigParse { .. } => ErrorKind::InvalidArgument,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
