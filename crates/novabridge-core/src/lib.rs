//! NovaBridge Core - Shared domain model for the base station and Sonar clients.
//!
//! This crate contains the channel and preset identifiers, the Sonar mixing
//! modes, and the heuristic routing extractor that is shared between the
//! HTTP client and the facade.

pub mod channel;
pub mod error;
pub mod mixer;
pub mod profile;
pub mod routing;

pub use channel::{PresetChannel, SonarChannel};
pub use error::{Error, ErrorKind, Result};
pub use mixer::{
    ChannelVolume, SonarMode, StreamerSlider, VolumeState, normalize_volume, validate_balance,
    validate_volume,
};
pub use profile::SonarPreset;
pub use routing::{RoutedApps, extract_routed_apps};
