//! Firmware-dependent command tables.
//!
//! Only the volume knob, battery, and connection reports are fixed across
//! firmware versions. Everything else (sidetone, ANC, mic reports and all
//! write commands beyond brightness/bitmap) is described by a
//! [`CommandProfile`] supplied when the session is created.
//!
//! The profile is plain data so it can be loaded from a config file:
//!
//! ```toml
//! battery_query = [0x06, 0xB0]
//!
//! [anc]
//! event_command = 0xBD
//! set_commands = [{ mode = "anc", bytes = [0x06, 0xBD, 0x02] }]
//! ```

use serde::{Deserialize, Serialize};

use crate::event::{AncMode, UsbInput};

/// Which profile-defined report a command byte identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfiledReport {
    Sidetone,
    Anc,
    Mic,
}

/// Command byte and value offset of a profile-defined input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSlot {
    pub report: ProfiledReport,
    pub value_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidetoneCommand {
    pub level: u8,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidetoneLabel {
    pub label: String,
    pub level: u8,
}

/// Sidetone report and commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidetoneProfile {
    /// Command byte of the sidetone status report
    pub event_command: Option<u8>,
    /// Byte offset of the level in that report
    pub value_index: usize,
    /// Command that asks the base station to report sidetone
    pub query_command: Option<Vec<u8>>,
    /// Command per settable level
    pub set_commands: Vec<SidetoneCommand>,
    /// Human readable names for levels
    pub labels: Vec<SidetoneLabel>,
}

impl Default for SidetoneProfile {
    fn default() -> Self {
        let labels = [("off", 0), ("low", 1), ("med", 2), ("high", 3)]
            .into_iter()
            .map(|(label, level)| SidetoneLabel { label: label.to_string(), level })
            .collect();
        Self {
            event_command: Some(0x39),
            value_index: 2,
            query_command: None,
            set_commands: Vec::new(),
            labels,
        }
    }
}

impl SidetoneProfile {
    /// Command bytes that set `level`, if configured.
    #[must_use]
    pub fn set_command(&self, level: u8) -> Option<&[u8]> {
        self.set_commands.iter().find(|cmd| cmd.level == level).map(|cmd| cmd.bytes.as_slice())
    }

    /// Label for a level, if one is configured.
    #[must_use]
    pub fn label_for(&self, level: u8) -> Option<&str> {
        self.labels.iter().find(|entry| entry.level == level).map(|entry| entry.label.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncValue {
    pub value: u8,
    pub mode: AncMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncCommand {
    pub mode: AncMode,
    pub bytes: Vec<u8>,
}

/// ANC report and commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AncProfile {
    pub event_command: Option<u8>,
    pub value_index: usize,
    /// Report value -> mode. Empty means the stock 0/1/2 mapping.
    pub values: Vec<AncValue>,
    /// Command that makes the base station answer with its ANC state
    pub status_command: Option<Vec<u8>>,
    pub set_commands: Vec<AncCommand>,
}

const DEFAULT_ANC_VALUES: [AncValue; 3] = [
    AncValue { value: 0, mode: AncMode::Off },
    AncValue { value: 1, mode: AncMode::Transparency },
    AncValue { value: 2, mode: AncMode::Anc },
];

impl Default for AncProfile {
    fn default() -> Self {
        Self {
            event_command: Some(0xBD),
            value_index: 2,
            values: DEFAULT_ANC_VALUES.to_vec(),
            status_command: None,
            set_commands: Vec::new(),
        }
    }
}

impl AncProfile {
    /// Mode reported by a raw value.
    #[must_use]
    pub fn mode_for(&self, value: u8) -> Option<AncMode> {
        let values: &[AncValue] =
            if self.values.is_empty() { &DEFAULT_ANC_VALUES } else { &self.values };
        values.iter().find(|entry| entry.value == value).map(|entry| entry.mode)
    }

    #[must_use]
    pub fn set_command(&self, mode: AncMode) -> Option<&[u8]> {
        self.set_commands.iter().find(|cmd| cmd.mode == mode).map(|cmd| cmd.bytes.as_slice())
    }
}

/// Mic report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicProfile {
    pub event_command: Option<u8>,
    pub value_index: usize,
    /// Report values meaning "mic enabled". Empty means `[1]`.
    pub enabled_values: Vec<u8>,
}

impl Default for MicProfile {
    fn default() -> Self {
        Self { event_command: Some(0xBB), value_index: 2, enabled_values: vec![1] }
    }
}

impl MicProfile {
    #[must_use]
    pub fn is_enabled(&self, value: u8) -> bool {
        if self.enabled_values.is_empty() {
            value == 1
        } else {
            self.enabled_values.contains(&value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbInputCommand {
    pub input: UsbInput,
    pub bytes: Vec<u8>,
}

/// Firmware-dependent report and command map, fixed for a session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CommandProfile {
    /// Command that makes the base station send a battery report
    pub battery_query: Option<Vec<u8>>,
    pub sidetone: SidetoneProfile,
    pub anc: AncProfile,
    pub mic: MicProfile,
    pub usb_input: Vec<UsbInputCommand>,
}

impl CommandProfile {
    /// A profile that recognizes only the fixed reports and has no commands.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            battery_query: None,
            sidetone: SidetoneProfile {
                event_command: None,
                labels: Vec::new(),
                ..SidetoneProfile::default()
            },
            anc: AncProfile { event_command: None, ..AncProfile::default() },
            mic: MicProfile { event_command: None, ..MicProfile::default() },
            usb_input: Vec::new(),
        }
    }

    /// Look up which profile-defined report `command` identifies.
    #[must_use]
    pub fn report_slot(&self, command: u8) -> Option<ReportSlot> {
        [
            (self.sidetone.event_command, ProfiledReport::Sidetone, self.sidetone.value_index),
            (self.anc.event_command, ProfiledReport::Anc, self.anc.value_index),
            (self.mic.event_command, ProfiledReport::Mic, self.mic.value_index),
        ]
        .into_iter()
        .find(|(id, _, _)| *id == Some(command))
        .map(|(_, report, value_index)| ReportSlot { report, value_index })
    }

    #[must_use]
    pub fn usb_input_command(&self, input: UsbInput) -> Option<&[u8]> {
        self.usb_input.iter().find(|cmd| cmd.input == input).map(|cmd| cmd.bytes.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_report_slots() {
        let profile = CommandProfile::default();

        assert_eq!(
            profile.report_slot(0x39),
            Some(ReportSlot { report: ProfiledReport::Sidetone, value_index: 2 })
        );
        assert_eq!(profile.report_slot(0xBD).map(|slot| slot.report), Some(ProfiledReport::Anc));
        assert_eq!(profile.report_slot(0xBB).map(|slot| slot.report), Some(ProfiledReport::Mic));
        assert_eq!(profile.report_slot(0xB7), None);
    }

    #[test]
    fn test_empty_profile_has_no_slots() {
        let profile = CommandProfile::empty();

        assert_eq!(profile.report_slot(0x39), None);
        assert_eq!(profile.report_slot(0xBD), None);
        assert_eq!(profile.report_slot(0xBB), None);
        assert!(profile.battery_query.is_none());
    }

    #[test]
    fn test_anc_value_map_falls_back_to_stock_mapping() {
        let anc = AncProfile { values: Vec::new(), ..AncProfile::default() };

        assert_eq!(anc.mode_for(0), Some(AncMode::Off));
        assert_eq!(anc.mode_for(2), Some(AncMode::Anc));
        assert_eq!(anc.mode_for(9), None);
    }

    #[test]
    fn test_mic_enabled_values() {
        let mic = MicProfile { enabled_values: vec![0], ..MicProfile::default() };

        assert!(mic.is_enabled(0));
        assert!(!mic.is_enabled(1));
    }

    #[test]
    fn test_sidetone_labels() {
        let sidetone = SidetoneProfile::default();

        assert_eq!(sidetone.label_for(3), Some("high"));
        assert_eq!(sidetone.label_for(7), None);
    }
}
