//! HID error types.

use novabridge_core::ErrorKind;
use thiserror::Error;

/// HID error type.
#[derive(Debug, Error)]
pub enum HidError {
    #[error("No supported base station found (vendor {vendor_id:#06x}, interface {interface})")]
    DeviceNotFound { vendor_id: u16, interface: i32 },

    #[error("Base station not connected - call connect() first")]
    NotConnected,

    #[error("Base station session is closed")]
    SessionClosed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl HidError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DeviceNotFound { .. } => ErrorKind::Discovery,
            Self::NotConnected | Self::SessionClosed => ErrorKind::NotConnected,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Unsupported(_) => ErrorKind::UnsupportedFeature,
            Self::Hid(_) | Self::Transport(_) => ErrorKind::Transport,
        }
    }
}

/// Result type for HID operations.
pub type HidResult<T> = Result<T, HidError>;
