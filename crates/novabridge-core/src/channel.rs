//! Audio channel identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the six logical Sonar audio buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SonarChannel {
    /// Master output
    #[serde(rename = "master")]
    Master,
    /// Game audio
    #[serde(rename = "game")]
    Game,
    /// Chat playback (what you hear from voice chat)
    #[serde(rename = "chatRender")]
    ChatRender,
    /// Music and video
    #[serde(rename = "media")]
    Media,
    /// Auxiliary bus
    #[serde(rename = "aux")]
    Aux,
    /// Chat capture (microphone)
    #[serde(rename = "chatCapture")]
    ChatCapture,
}

impl SonarChannel {
    /// All channels, in the order Sonar lists them.
    pub const ALL: [Self; 6] =
        [Self::Master, Self::Game, Self::ChatRender, Self::Media, Self::Aux, Self::ChatCapture];

    /// Identifier used by the Sonar HTTP API.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Game => "game",
            Self::ChatRender => "chatRender",
            Self::Media => "media",
            Self::Aux => "aux",
            Self::ChatCapture => "chatCapture",
        }
    }

    /// Lower-case tokens that identify this channel inside loosely shaped
    /// volume payloads (`{"role": "game", ...}`, `{"name": "master", ...}`).
    #[must_use]
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Master => &["master", "main"],
            Self::Game => &["game", "gaming"],
            Self::ChatRender => &["chatrender", "chat_render", "chat"],
            Self::Media => &["media", "music"],
            Self::Aux => &["aux", "auxiliary"],
            Self::ChatCapture => &["chatcapture", "chat_capture", "mic", "microphone", "capture"],
        }
    }
}

impl fmt::Display for SonarChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SonarChannel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "master" => Ok(Self::Master),
            "game" => Ok(Self::Game),
            "chatrender" | "chat" => Ok(Self::ChatRender),
            "media" => Ok(Self::Media),
            "aux" => Ok(Self::Aux),
            "chatcapture" | "mic" => Ok(Self::ChatCapture),
            _ => Err(Error::InvalidChannelName(s.to_string())),
        }
    }
}

/// Channel identifiers used by the preset database (`vad` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetChannel {
    Gaming = 1,
    Chat = 2,
    Mic = 3,
    Media = 4,
    Aux = 5,
    Master = 6,
}

impl PresetChannel {
    /// All preset channels, in database id order.
    pub const ALL: [Self; 6] =
        [Self::Gaming, Self::Chat, Self::Mic, Self::Media, Self::Aux, Self::Master];

    /// Value stored in the database `vad` column.
    #[must_use]
    pub fn vad(self) -> i64 {
        self as i64
    }

    /// Look up a preset channel from its database value.
    #[must_use]
    pub fn from_vad(vad: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.vad() == vad)
    }

    /// The Sonar mixer channel this preset channel applies to.
    #[must_use]
    pub fn sonar_channel(self) -> SonarChannel {
        match self {
            Self::Gaming => SonarChannel::Game,
            Self::Chat => SonarChannel::ChatRender,
            Self::Mic => SonarChannel::ChatCapture,
            Self::Media => SonarChannel::Media,
            Self::Aux => SonarChannel::Aux,
            Self::Master => SonarChannel::Master,
        }
    }

    /// Human readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gaming => "Gaming",
            Self::Chat => "Chat",
            Self::Mic => "Mic",
            Self::Media => "Media",
            Self::Aux => "Aux",
            Self::Master => "Master",
        }
    }
}

impl fmt::Display for PresetChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PresetChannel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaming" | "game" => Ok(Self::Gaming),
            "chat" => Ok(Self::Chat),
            "mic" | "microphone" => Ok(Self::Mic),
            "media" => Ok(Self::Media),
            "aux" => Ok(Self::Aux),
            "master" => Ok(Self::Master),
            _ => Err(Error::InvalidChannelName(s.to_string())),
        }
    }
}
