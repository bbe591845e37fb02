//! Telemetry decoded from base station reports.

use serde::{Deserialize, Serialize};

/// Active noise cancellation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AncMode {
    Off,
    Transparency,
    Anc,
}

/// USB input the base station forwards audio from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsbInput {
    Usb1,
    Usb2,
}

/// Battery levels reported by the base station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Headset battery level
    pub headset: u8,
    /// Spare battery in the charging slot
    pub charging: u8,
}

/// How the headset is currently linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub wireless: bool,
    pub bluetooth: bool,
    pub bluetooth_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidetoneStatus {
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncStatus {
    pub mode: AncMode,
}

/// Microphone state. `enabled == false` means the mic is muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicStatus {
    pub enabled: bool,
}

impl MicStatus {
    #[must_use]
    pub fn muted(&self) -> bool {
        !self.enabled
    }
}

/// A telemetry event decoded from one input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum DeviceEvent {
    /// Headset volume knob moved
    VolumeKnob { level: u8 },
    Battery(BatteryStatus),
    Connection(ConnectionStatus),
    Sidetone(SidetoneStatus),
    Anc(AncStatus),
    Mic(MicStatus),
}
