//! NovaBridge HID - Arctis Nova Pro base station integration.
//!
//! This crate talks to the USB base station over raw HID reports: it decodes
//! telemetry (battery, connection, volume knob, and the firmware-dependent
//! sidetone/ANC/mic reports described by a [`CommandProfile`]), encodes
//! control reports, and keeps a cache of the last observed status in a
//! [`BaseStationSession`].

pub mod codec;
pub mod error;
pub mod event;
pub mod profile;
pub mod session;
pub mod transport;

pub use codec::{Decoded, decode, encode};
pub use error::{HidError, HidResult};
pub use event::{
    AncMode, AncStatus, BatteryStatus, ConnectionStatus, DeviceEvent, MicStatus, SidetoneStatus,
    UsbInput,
};
pub use profile::CommandProfile;
pub use session::{BaseStationSession, StatusCache};
pub use transport::{DeviceMatch, HidApiBackend, HidBackend, HidHandle, HidTransport};
