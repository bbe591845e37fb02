//! Sonar mixer modes and volume values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::channel::SonarChannel;
use crate::error::{Error, Result};

/// Mixing topology Sonar is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SonarMode {
    /// One slider per channel
    #[default]
    Classic,
    /// Streamer mode - separate streaming and monitoring sliders
    Stream,
}

impl SonarMode {
    /// Key used for this mode in URLs and mode-keyed payloads.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Stream => "stream",
        }
    }

    /// Mode for a streamer-mode flag.
    #[must_use]
    pub fn from_streamer(enabled: bool) -> Self {
        if enabled { Self::Stream } else { Self::Classic }
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream)
    }
}

impl fmt::Display for SonarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SonarMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "stream" | "streamer" => Ok(Self::Stream),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// Which slider of a channel to address in streamer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamerSlider {
    /// Mix sent to the stream
    #[default]
    Streaming,
    /// Mix sent to the local headset
    Monitoring,
}

impl StreamerSlider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Monitoring => "monitoring",
        }
    }
}

impl FromStr for StreamerSlider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streaming" | "stream" => Ok(Self::Streaming),
            "monitoring" | "monitor" => Ok(Self::Monitoring),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// Volume and mute of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelVolume {
    /// Volume level (0.0 - 1.0)
    pub volume: f64,
    /// Muted flag
    pub muted: bool,
}

/// Volume state of every channel that could be read.
pub type VolumeState = BTreeMap<SonarChannel, ChannelVolume>;

/// Normalize a volume reported either as a fraction or as a percentage.
///
/// Values in `(1, 100]` are percentages and are divided by 100; everything
/// else (including exactly `1.0`) is already a fraction.
#[must_use]
pub fn normalize_volume(value: f64) -> f64 {
    if value > 1.0 && value <= 100.0 { value / 100.0 } else { value }
}

/// Check that a volume is within 0.0 - 1.0.
///
/// # Errors
/// Returns [`Error::InvalidVolume`] when the value is out of range or NaN.
pub fn validate_volume(volume: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&volume) { Ok(volume) } else { Err(Error::InvalidVolume(volume)) }
}

/// Check that a chat mix balance is within -1.0 - 1.0.
///
/// # Errors
/// Returns [`Error::InvalidBalance`] when the value is out of range or NaN.
pub fn validate_balance(balance: f64) -> Result<f64> {
    if (-1.0..=1.0).contains(&balance) { Ok(balance) } else { Err(Error::InvalidBalance(balance)) }
}
