//! Base station report encoding and decoding.
//!
//! Input reports are 64-byte frames: byte 0 is the report id (`0x06` or
//! `0x07`), byte 1 the command, and the rest a fixed-offset payload.

use tracing::trace;

use crate::error::{HidError, HidResult};
use crate::event::{
    AncStatus, BatteryStatus, ConnectionStatus, DeviceEvent, MicStatus, SidetoneStatus,
};
use crate::profile::{CommandProfile, ProfiledReport};

/// Size of an output report frame.
pub const REPORT_LEN: usize = 64;
/// Size of the feature report used for bitmap transfer.
pub const FEATURE_REPORT_LEN: usize = 1024;
/// Bytes before the bitmap payload in a feature report.
pub const FEATURE_HEADER_LEN: usize = 6;
/// Largest bitmap payload a single feature report can carry.
pub const MAX_FEATURE_PAYLOAD: usize = FEATURE_REPORT_LEN - FEATURE_HEADER_LEN;
/// Report ids the base station uses.
pub const REPORT_IDS: [u8; 2] = [0x06, 0x07];
/// Shortest buffer that can carry a fixed report.
const MIN_REPORT_LEN: usize = 5;

/// Fixed command bytes.
pub mod cmd {
    pub const VOLUME_KNOB: u8 = 0x25;
    pub const CONNECTION: u8 = 0xB5;
    pub const BATTERY: u8 = 0xB7;
    pub const BRIGHTNESS: u8 = 0x85;
    pub const RETURN_TO_UI: u8 = 0x95;
    pub const BITMAP: u8 = 0x93;
}

/// Volume knob reports count down from this value.
const VOLUME_KNOB_BASE: u8 = 0x38;

/// Brightness levels accepted by the display.
pub const BRIGHTNESS_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Outcome of decoding one input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A recognized telemetry event
    Event(DeviceEvent),
    /// A well-formed report with an unknown command byte
    Unrecognized(u8),
    /// Too short or not a base station report
    Ignored,
}

impl Decoded {
    #[must_use]
    pub fn event(self) -> Option<DeviceEvent> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Decode an input report.
///
/// Never fails: short buffers and foreign report ids yield
/// [`Decoded::Ignored`], unknown commands [`Decoded::Unrecognized`].
#[must_use]
pub fn decode(buf: &[u8], profile: &CommandProfile) -> Decoded {
    if buf.len() < MIN_REPORT_LEN {
        return Decoded::Ignored;
    }
    let [report_id, command, b2, b3, b4, ..] = *buf else {
        return Decoded::Ignored;
    };
    if !REPORT_IDS.contains(&report_id) {
        return Decoded::Ignored;
    }

    let event = match command {
        cmd::VOLUME_KNOB => DeviceEvent::VolumeKnob { level: VOLUME_KNOB_BASE.saturating_sub(b2) },
        cmd::CONNECTION => DeviceEvent::Connection(ConnectionStatus {
            wireless: b4 == 8,
            bluetooth: b3 == 1,
            bluetooth_on: b2 == 4,
        }),
        cmd::BATTERY => DeviceEvent::Battery(BatteryStatus { headset: b2, charging: b3 }),
        other => return decode_profiled(buf, other, profile),
    };
    Decoded::Event(event)
}

fn decode_profiled(buf: &[u8], command: u8, profile: &CommandProfile) -> Decoded {
    let Some(slot) = profile.report_slot(command) else {
        return Decoded::Unrecognized(command);
    };
    let Some(&value) = buf.get(slot.value_index) else {
        trace!(command, index = slot.value_index, "Report too short for profile offset");
        return Decoded::Unrecognized(command);
    };

    let event = match slot.report {
        ProfiledReport::Sidetone => DeviceEvent::Sidetone(SidetoneStatus { level: value }),
        ProfiledReport::Anc => match profile.anc.mode_for(value) {
            Some(mode) => DeviceEvent::Anc(AncStatus { mode }),
            None => return Decoded::Unrecognized(command),
        },
        ProfiledReport::Mic => {
            DeviceEvent::Mic(MicStatus { enabled: profile.mic.is_enabled(value) })
        }
    };
    Decoded::Event(event)
}

/// Pad a command to a 64-byte output report.
///
/// # Errors
/// Returns [`HidError::InvalidArgument`] if the command is longer than 64 bytes.
pub fn encode(command: &[u8]) -> HidResult<[u8; REPORT_LEN]> {
    if command.len() > REPORT_LEN {
        return Err(HidError::InvalidArgument(format!(
            "command is {} bytes, maximum is {REPORT_LEN}",
            command.len()
        )));
    }
    let mut frame = [0u8; REPORT_LEN];
    frame[..command.len()].copy_from_slice(command);
    Ok(frame)
}

/// Build a 1024-byte feature report with `payload` at the fixed header offset.
///
/// # Errors
/// Returns [`HidError::InvalidArgument`] if the payload exceeds 1018 bytes.
pub fn encode_feature_report(
    header: [u8; FEATURE_HEADER_LEN],
    payload: &[u8],
) -> HidResult<Vec<u8>> {
    if payload.len() > MAX_FEATURE_PAYLOAD {
        return Err(HidError::InvalidArgument(format!(
            "bitmap payload is {} bytes, maximum is {MAX_FEATURE_PAYLOAD}",
            payload.len()
        )));
    }
    let mut frame = vec![0u8; FEATURE_REPORT_LEN];
    frame[..FEATURE_HEADER_LEN].copy_from_slice(&header);
    frame[FEATURE_HEADER_LEN..FEATURE_HEADER_LEN + payload.len()].copy_from_slice(payload);
    Ok(frame)
}

/// Display brightness report.
///
/// # Errors
/// Returns [`HidError::InvalidArgument`] if `level` is outside 1-10.
pub fn brightness_report(level: u8) -> HidResult<[u8; REPORT_LEN]> {
    if !BRIGHTNESS_RANGE.contains(&level) {
        return Err(HidError::InvalidArgument(format!("brightness {level} is outside 1-10")));
    }
    encode(&[REPORT_IDS[0], cmd::BRIGHTNESS, level])
}

/// Report that returns the display to the stock UI.
#[must_use]
pub fn return_to_ui_report() -> [u8; REPORT_LEN] {
    let mut frame = [0u8; REPORT_LEN];
    frame[0] = REPORT_IDS[0];
    frame[1] = cmd::RETURN_TO_UI;
    frame
}

/// One bitmap chunk drawn at (`x`, `y`) with the given size.
///
/// # Errors
/// Returns [`HidError::InvalidArgument`] if the payload is too large.
pub fn bitmap_chunk_report(
    x: u8,
    y: u8,
    width: u8,
    height: u8,
    payload: &[u8],
) -> HidResult<Vec<u8>> {
    encode_feature_report([REPORT_IDS[0], cmd::BITMAP, x, y, width, height], payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AncMode;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn frame(bytes: &[u8]) -> Vec<u8> {
        let mut buf = bytes.to_vec();
        buf.resize(REPORT_LEN, 0);
        buf
    }

    #[test]
    fn test_decode_battery_reports() {
        let profile = CommandProfile::default();

        assert_eq!(
            decode(&frame(&[0x07, 0xB7, 80, 30, 0]), &profile),
            Decoded::Event(DeviceEvent::Battery(BatteryStatus { headset: 80, charging: 30 }))
        );
        assert_eq!(
            decode(&frame(&[0x06, 0xB7, 2, 8, 0]), &profile),
            Decoded::Event(DeviceEvent::Battery(BatteryStatus { headset: 2, charging: 8 }))
        );
    }

    #[test]
    fn test_decode_connection_flags() {
        let decoded = decode(&frame(&[0x06, 0xB5, 4, 1, 8]), &CommandProfile::default());

        assert_eq!(
            decoded,
            Decoded::Event(DeviceEvent::Connection(ConnectionStatus {
                wireless: true,
                bluetooth: true,
                bluetooth_on: true,
            }))
        );
    }

    #[test]
    fn test_decode_short_or_foreign_is_ignored() {
        let profile = CommandProfile::default();

        assert_eq!(decode(&[], &profile), Decoded::Ignored);
        assert_eq!(decode(&[0x06, 0xB7, 1, 2], &profile), Decoded::Ignored);
        assert_eq!(decode(&frame(&[0x01, 0xB7, 1, 2, 3]), &profile), Decoded::Ignored);
    }

    #[test]
    fn test_decode_profiled_reports() {
        let profile = CommandProfile::default();

        assert_eq!(
            decode(&frame(&[0x07, 0xBD, 1]), &profile).event(),
            Some(DeviceEvent::Anc(AncStatus { mode: AncMode::Transparency }))
        );
        assert_eq!(
            decode(&frame(&[0x07, 0xBB, 0]), &profile).event(),
            Some(DeviceEvent::Mic(MicStatus { enabled: false }))
        );
        assert_eq!(
            decode(&frame(&[0x07, 0x39, 3]), &profile).event(),
            Some(DeviceEvent::Sidetone(SidetoneStatus { level: 3 }))
        );
        // Unmapped ANC value
        assert_eq!(decode(&frame(&[0x07, 0xBD, 9]), &profile), Decoded::Unrecognized(0xBD));
    }

    #[test]
    fn test_decode_profiled_reports_need_profile() {
        let profile = CommandProfile::empty();

        assert_eq!(decode(&frame(&[0x07, 0x39, 3]), &profile), Decoded::Unrecognized(0x39));
        assert_eq!(decode(&frame(&[0x07, 0xBD, 1]), &profile), Decoded::Unrecognized(0xBD));
    }

    #[test]
    fn test_decode_profile_offset_past_end() {
        let mut profile = CommandProfile::default();
        profile.sidetone.event_command = Some(0xC1);
        profile.sidetone.value_index = 10;

        assert_eq!(decode(&[0x07, 0xC1, 0, 7, 0], &profile), Decoded::Unrecognized(0xC1));
    }

    #[test]
    fn test_encode_pads_to_frame() {
        let frame = encode(&[0x06, 0x85, 5]).unwrap();

        assert_eq!(frame.len(), REPORT_LEN);
        assert_eq!(&frame[..3], &[0x06, 0x85, 5]);
        assert!(frame[3..].iter().all(|b| *b == 0));
        assert_matches!(encode(&[0u8; 65]), Err(HidError::InvalidArgument(_)));
    }

    #[test]
    fn test_bitmap_chunk_layout() {
        let report = bitmap_chunk_report(1, 2, 3, 4, &[0xAA, 0xBB]).unwrap();

        assert_eq!(report.len(), FEATURE_REPORT_LEN);
        assert_eq!(&report[..8], &[0x06, 0x93, 1, 2, 3, 4, 0xAA, 0xBB]);
        assert!(bitmap_chunk_report(0, 0, 0, 0, &[0u8; MAX_FEATURE_PAYLOAD]).is_ok());
        assert_matches!(
            bitmap_chunk_report(0, 0, 0, 0, &[0u8; MAX_FEATURE_PAYLOAD + 1]),
            Err(HidError::InvalidArgument(_))
        );
    }

    #[test]
    fn test_brightness_range() {
        assert_eq!(&brightness_report(10).unwrap()[..3], &[0x06, 0x85, 10]);
        assert_matches!(brightness_report(0), Err(HidError::InvalidArgument(_)));
        assert_matches!(brightness_report(11), Err(HidError::InvalidArgument(_)));
    }

    proptest! {
        #[test]
        fn prop_decode_is_total(buf in proptest::collection::vec(any::<u8>(), 0..128)) {
            let _ = decode(&buf, &CommandProfile::default());
        }

        #[test]
        fn prop_volume_knob_level(
            report_id in prop::sample::select(REPORT_IDS.to_vec()),
            raw in any::<u8>(),
            rest in proptest::collection::vec(any::<u8>(), 61),
        ) {
            let mut buf = vec![report_id, cmd::VOLUME_KNOB, raw];
            buf.extend(rest);

            let expected = i32::from(VOLUME_KNOB_BASE) - i32::from(raw);
            let level = match decode(&buf, &CommandProfile::default()) {
                Decoded::Event(DeviceEvent::VolumeKnob { level }) => i32::from(level),
                other => return Err(TestCaseError::fail(format!("unexpected {other:?}"))),
            };
            prop_assert_eq!(level, expected.max(0));
        }
    }
}
