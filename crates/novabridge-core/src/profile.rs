//! Sonar EQ presets as stored in the vendor database.

use serde::{Deserialize, Serialize};

use crate::channel::PresetChannel;

/// A saved Sonar preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonarPreset {
    /// Preset id (opaque string, used for selection)
    pub id: String,
    /// Display name
    pub name: String,
    /// Channel the preset belongs to
    pub channel: PresetChannel,
}

impl SonarPreset {
    /// Case-insensitive name comparison, ignoring surrounding whitespace.
    #[must_use]
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_case_insensitive() {
        let preset = SonarPreset {
            id: "id_2".into(),
            name: "Footsteps".into(),
            channel: PresetChannel::Gaming,
        };

        assert!(preset.name_matches("footsteps"));
        assert!(preset.name_matches("  FOOTSTEPS "));
        assert!(!preset.name_matches("footstep"));
    }
}
