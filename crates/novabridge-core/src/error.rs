//! Error types for NovaBridge core.

use serde::Serialize;
use thiserror::Error;

/// Coarse classification shared by every NovaBridge error type.
///
/// Each crate keeps its own error enum; `kind()` on those enums maps a
/// concrete failure onto one of these buckets so callers can branch on the
/// category without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A device or local service could not be found or is not ready.
    Discovery,
    /// An HTTP request failed at the transport or status level.
    Request,
    /// The embedded preset database could not be read.
    ConfigStore,
    /// A caller-supplied value was out of contract, or nothing matched.
    InvalidArgument,
    /// The operation needs a command profile entry that was not supplied.
    UnsupportedFeature,
    /// The base station session is not connected.
    NotConnected,
    /// Low-level I/O failure on an already opened device.
    Transport,
}

/// Core error type for NovaBridge operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid channel name: {0}")]
    InvalidChannelName(String),

    #[error("Invalid volume value: {0} (must be 0.0-1.0)")]
    InvalidVolume(f64),

    #[error("Invalid chat mix balance: {0} (must be -1.0-1.0)")]
    InvalidBalance(f64),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidChannelName(_)
            | Self::InvalidVolume(_)
            | Self::InvalidBalance(_)
            | Self::InvalidMode(_)
            | Self::SerializationError(_) => ErrorKind::InvalidArgument,
        }
    }
}

/// Result type alias for NovaBridge core operations.
pub type Result<T> = std::result::Result<T, Error>;
