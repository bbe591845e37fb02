//! Base station session with a cache of the last observed status.
//!
//! All calls are blocking. Getters take a refresh window: with a zero window
//! they return the cached value, otherwise they poll the device until a
//! matching report arrives or the window elapses.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace};

use crate::codec::{
    self, Decoded, REPORT_LEN, bitmap_chunk_report, brightness_report, decode, return_to_ui_report,
};
use crate::error::{HidError, HidResult};
use crate::event::{
    AncMode, AncStatus, BatteryStatus, ConnectionStatus, DeviceEvent, MicStatus, SidetoneStatus,
    UsbInput,
};
use crate::profile::CommandProfile;
use crate::transport::{DeviceMatch, HandleRole, HidApiBackend, HidBackend, HidTransport};

/// Per-read timeout while waiting for fresh data.
const POLL_TIMEOUT_MS: u64 = 20;
/// Per-read timeout while draining queued reports.
const DRAIN_TIMEOUT_MS: i32 = 1;
/// Most reports taken from one handle in a single drain.
const DRAIN_CAP: usize = 64;
/// Timeout for the raw ANC status answer.
const RAW_STATUS_TIMEOUT_MS: i32 = 100;

/// Last observed status values. Each stays `None` until its first report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCache {
    pub battery: Option<BatteryStatus>,
    pub connection: Option<ConnectionStatus>,
    pub sidetone: Option<SidetoneStatus>,
    pub anc: Option<AncStatus>,
    pub mic: Option<MicStatus>,
}

impl StatusCache {
    fn apply(&mut self, event: &DeviceEvent) {
        match *event {
            DeviceEvent::Battery(status) => self.battery = Some(status),
            DeviceEvent::Connection(status) => self.connection = Some(status),
            DeviceEvent::Sidetone(status) => self.sidetone = Some(status),
            DeviceEvent::Anc(status) => self.anc = Some(status),
            DeviceEvent::Mic(status) => self.mic = Some(status),
            DeviceEvent::VolumeKnob { .. } => {}
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Disconnected,
    Connected(HidTransport),
    Closed,
}

/// A connection to one base station.
///
/// Not internally synchronized; wrap it in a mutex to share between threads.
pub struct BaseStationSession {
    backend: Box<dyn HidBackend>,
    matcher: DeviceMatch,
    profile: CommandProfile,
    state: SessionState,
    cache: StatusCache,
}

impl BaseStationSession {
    /// Create a disconnected session.
    #[must_use]
    pub fn new(backend: Box<dyn HidBackend>, matcher: DeviceMatch, profile: CommandProfile) -> Self {
        Self {
            backend,
            matcher,
            profile,
            state: SessionState::Disconnected,
            cache: StatusCache::default(),
        }
    }

    /// Create a disconnected session using the system hidapi library.
    ///
    /// # Errors
    /// Returns an error if hidapi cannot be initialized.
    pub fn with_hidapi(matcher: DeviceMatch, profile: CommandProfile) -> HidResult<Self> {
        Ok(Self::new(Box::new(HidApiBackend::new()?), matcher, profile))
    }

    /// Open the base station handles. A no-op when already connected.
    ///
    /// # Errors
    /// Returns [`HidError::DeviceNotFound`] if no base station is attached,
    /// [`HidError::SessionClosed`] after [`close`](Self::close).
    pub fn connect(&mut self) -> HidResult<()> {
        match self.state {
            SessionState::Connected(_) => Ok(()),
            SessionState::Closed => Err(HidError::SessionClosed),
            SessionState::Disconnected => {
                let transport = HidTransport::open(self.backend.as_mut(), &self.matcher)?;
                self.state = SessionState::Connected(transport);
                Ok(())
            }
        }
    }

    /// Release the device handles. The session cannot be reconnected.
    pub fn close(&mut self) {
        if let SessionState::Connected(transport) = &mut self.state {
            transport.close();
        }
        if !matches!(self.state, SessionState::Closed) {
            debug!("Base station session closed");
        }
        self.state = SessionState::Closed;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    #[must_use]
    pub fn profile(&self) -> &CommandProfile {
        &self.profile
    }

    /// Snapshot of the cache, without touching the device.
    #[must_use]
    pub fn cached(&self) -> StatusCache {
        self.cache
    }

    fn transport(&self) -> HidResult<&HidTransport> {
        match &self.state {
            SessionState::Connected(transport) => Ok(transport),
            SessionState::Disconnected => Err(HidError::NotConnected),
            SessionState::Closed => Err(HidError::SessionClosed),
        }
    }

    /// Read every queued report once, updating the cache.
    ///
    /// Each handle is read with a 1 ms timeout until it is empty (or 64
    /// reports were taken). Unrecognized reports are not returned.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn drain_pending_events(&mut self) -> HidResult<Vec<DeviceEvent>> {
        let transport = match &self.state {
            SessionState::Connected(transport) => transport,
            SessionState::Disconnected => return Err(HidError::NotConnected),
            SessionState::Closed => return Err(HidError::SessionClosed),
        };

        let mut events = Vec::new();
        for role in transport.poll_order() {
            for _ in 0..DRAIN_CAP {
                let report = transport.read(role, REPORT_LEN, DRAIN_TIMEOUT_MS)?;
                if report.is_empty() {
                    break;
                }
                match decode(&report, &self.profile) {
                    Decoded::Event(event) => {
                        self.cache.apply(&event);
                        events.push(event);
                    }
                    Decoded::Unrecognized(command) => {
                        trace!(command, "Unrecognized report");
                    }
                    Decoded::Ignored => {}
                }
            }
        }
        Ok(events)
    }

    /// Wait up to `refresh` for an event `select` accepts.
    ///
    /// Returns the first accepted event, or the cached value once the window
    /// has elapsed.
    fn wait_for<T>(
        &mut self,
        refresh: Duration,
        select: impl Fn(&DeviceEvent) -> Option<T>,
        cached: impl Fn(&StatusCache) -> Option<T>,
    ) -> HidResult<Option<T>> {
        let transport = match &self.state {
            SessionState::Connected(transport) => transport,
            SessionState::Disconnected => return Err(HidError::NotConnected),
            SessionState::Closed => return Err(HidError::SessionClosed),
        };
        if refresh.is_zero() {
            return Ok(cached(&self.cache));
        }

        let deadline = Instant::now() + refresh;
        let roles = transport.poll_order();
        'poll: loop {
            for role in &roles {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break 'poll;
                }
                let timeout = remaining.as_millis().clamp(1, u128::from(POLL_TIMEOUT_MS));
                let timeout_ms = i32::try_from(timeout).unwrap_or(1);

                let report = transport.read(*role, REPORT_LEN, timeout_ms)?;
                if report.is_empty() {
                    continue;
                }
                if let Decoded::Event(event) = decode(&report, &self.profile) {
                    self.cache.apply(&event);
                    if let Some(value) = select(&event) {
                        return Ok(Some(value));
                    }
                }
            }
        }
        Ok(cached(&self.cache))
    }

    /// Battery levels.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn battery_status(&mut self, refresh: Duration) -> HidResult<Option<BatteryStatus>> {
        self.wait_for(
            refresh,
            |event| match event {
                DeviceEvent::Battery(status) => Some(*status),
                _ => None,
            },
            |cache| cache.battery,
        )
    }

    /// Sidetone level.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn sidetone_status(&mut self, refresh: Duration) -> HidResult<Option<SidetoneStatus>> {
        self.wait_for(
            refresh,
            |event| match event {
                DeviceEvent::Sidetone(status) => Some(*status),
                _ => None,
            },
            |cache| cache.sidetone,
        )
    }

    /// ANC mode.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn anc_status(&mut self, refresh: Duration) -> HidResult<Option<AncStatus>> {
        self.wait_for(
            refresh,
            |event| match event {
                DeviceEvent::Anc(status) => Some(*status),
                _ => None,
            },
            |cache| cache.anc,
        )
    }

    /// Mic state.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn mic_status(&mut self, refresh: Duration) -> HidResult<Option<MicStatus>> {
        self.wait_for(
            refresh,
            |event| match event {
                DeviceEvent::Mic(status) => Some(*status),
                _ => None,
            },
            |cache| cache.mic,
        )
    }

    /// Headset battery level.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn headset_battery(&mut self, refresh: Duration) -> HidResult<Option<u8>> {
        Ok(self.battery_status(refresh)?.map(|status| status.headset))
    }

    /// Level of the spare battery in the charging slot.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn charging_station_battery(&mut self, refresh: Duration) -> HidResult<Option<u8>> {
        Ok(self.battery_status(refresh)?.map(|status| status.charging))
    }

    /// Label of the cached sidetone level, or the level itself when the
    /// profile has no label for it.
    ///
    /// # Errors
    /// Returns an error if the session is not connected.
    pub fn sidetone_label(&self) -> HidResult<Option<String>> {
        self.transport()?;
        Ok(self.cache.sidetone.map(|status| {
            self.profile
                .sidetone
                .label_for(status.level)
                .map_or_else(|| status.level.to_string(), str::to_string)
        }))
    }

    /// Ask the base station for its battery levels and wait for the answer.
    ///
    /// # Errors
    /// Returns [`HidError::Unsupported`] without a battery query command.
    pub fn request_battery_status(&mut self, refresh: Duration) -> HidResult<Option<BatteryStatus>> {
        self.transport()?;
        let command = self
            .profile
            .battery_query
            .clone()
            .ok_or_else(|| HidError::Unsupported("no battery query command configured".into()))?;
        self.transport()?.write(HandleRole::Info, &codec::encode(&command)?)?;
        self.battery_status(refresh)
    }

    /// Ask the base station for its sidetone level and wait for the answer.
    ///
    /// # Errors
    /// Returns [`HidError::Unsupported`] without a sidetone query command.
    pub fn request_sidetone_status(
        &mut self,
        refresh: Duration,
    ) -> HidResult<Option<SidetoneStatus>> {
        self.transport()?;
        let command =
            self.profile.sidetone.query_command.clone().ok_or_else(|| {
                HidError::Unsupported("no sidetone query command configured".into())
            })?;
        self.transport()?.write(HandleRole::Info, &codec::encode(&command)?)?;
        self.sidetone_status(refresh)
    }

    /// Send the ANC status command and return the raw answer.
    ///
    /// # Errors
    /// Returns [`HidError::Unsupported`] without an ANC status command.
    pub fn anc_status_raw(&self) -> HidResult<Vec<u8>> {
        let transport = self.transport()?;
        let command = self
            .profile
            .anc
            .status_command
            .as_deref()
            .ok_or_else(|| HidError::Unsupported("no ANC status command configured".into()))?;
        transport.write(HandleRole::Info, &codec::encode(command)?)?;
        transport.read(HandleRole::Info, REPORT_LEN, RAW_STATUS_TIMEOUT_MS)
    }

    /// Set display brightness (1-10).
    ///
    /// # Errors
    /// Returns [`HidError::InvalidArgument`] for an out of range level.
    pub fn set_brightness(&self, level: u8) -> HidResult<()> {
        let report = brightness_report(level)?;
        self.transport()?.write(HandleRole::Display, &report)
    }

    /// Hand the display back to the stock UI.
    ///
    /// # Errors
    /// Returns an error if the session is not connected or the write fails.
    pub fn return_to_default_ui(&self) -> HidResult<()> {
        self.transport()?.write(HandleRole::Display, &return_to_ui_report())
    }

    /// Draw one bitmap chunk on the display.
    ///
    /// # Errors
    /// Returns [`HidError::InvalidArgument`] for a payload over 1018 bytes.
    pub fn draw_bitmap_chunk(
        &self,
        x: u8,
        y: u8,
        width: u8,
        height: u8,
        payload: &[u8],
    ) -> HidResult<()> {
        let report = bitmap_chunk_report(x, y, width, height, payload)?;
        self.transport()?.write_feature_report(&report)
    }

    /// Set the sidetone level.
    ///
    /// # Errors
    /// Returns [`HidError::Unsupported`] if the profile has no command for
    /// `level`.
    pub fn set_sidetone_level(&self, level: u8) -> HidResult<()> {
        self.transport()?;
        let command = self.profile.sidetone.set_command(level).ok_or_else(|| {
            HidError::Unsupported(format!("no sidetone command configured for level {level}"))
        })?;
        self.write_display(command)
    }

    /// Set the ANC mode.
    ///
    /// # Errors
    /// Returns [`HidError::Unsupported`] if the profile has no command for
    /// `mode`.
    pub fn set_anc_mode(&self, mode: AncMode) -> HidResult<()> {
        self.transport()?;
        let command = self.profile.anc.set_command(mode).ok_or_else(|| {
            HidError::Unsupported(format!("no ANC command configured for {mode:?}"))
        })?;
        self.write_display(command)
    }

    /// Switch the USB input.
    ///
    /// # Errors
    /// Returns [`HidError::Unsupported`] if the profile has no command for
    /// `input`.
    pub fn set_usb_input(&self, input: UsbInput) -> HidResult<()> {
        self.transport()?;
        let command = self.profile.usb_input_command(input).ok_or_else(|| {
            HidError::Unsupported(format!("no USB input command configured for {input:?}"))
        })?;
        self.write_display(command)
    }

    fn write_display(&self, command: &[u8]) -> HidResult<()> {
        let report = codec::encode(command)?;
        self.transport()?.write(HandleRole::Display, &report)
    }
}

impl Drop for BaseStationSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;
    use crate::profile::{AncCommand, SidetoneCommand};
    use crate::transport::testing::{FakeBackend, FakeDevice};

    /// Session over `dev-a` (display) and `dev-b` (info).
    fn session_with(profile: CommandProfile) -> (BaseStationSession, Arc<FakeDevice>, Arc<FakeDevice>) {
        let backend = FakeBackend::new(&["dev-a", "dev-b"]);
        let display = backend.device(0);
        let info = backend.device(1);
        let mut session = BaseStationSession::new(Box::new(backend), DeviceMatch::default(), profile);
        session.connect().unwrap();
        (session, info, display)
    }

    #[test]
    fn test_battery_status_cached_and_refreshed() {
        let (mut session, info, _) = session_with(CommandProfile::default());

        assert_eq!(session.battery_status(Duration::ZERO).unwrap(), None);

        info.queue(&[0x07, 0xB7, 80, 30, 0]);
        let status = session.battery_status(Duration::from_millis(50)).unwrap();
        assert_eq!(status, Some(BatteryStatus { headset: 80, charging: 30 }));

        // Cache updated, zero refresh does not read
        assert_eq!(session.battery_status(Duration::ZERO).unwrap(), status);
        assert_eq!(session.headset_battery(Duration::ZERO).unwrap(), Some(80));
        assert_eq!(session.charging_station_battery(Duration::ZERO).unwrap(), Some(30));
    }

    #[test]
    fn test_refresh_times_out_with_cached_value() {
        let (mut session, _, _) = session_with(CommandProfile::default());

        let started = Instant::now();
        let status = session.anc_status(Duration::from_millis(30)).unwrap();

        assert_eq!(status, None);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_refresh_skips_other_events_and_caches_them() {
        let (mut session, info, display) = session_with(CommandProfile::default());
        display.queue(&[0x06, 0xBB, 0, 0, 0]);
        info.queue(&[0x06, 0xB5, 4, 0, 8]);
        info.queue(&[0x06, 0xBD, 2, 0, 0]);

        let anc = session.anc_status(Duration::from_millis(200)).unwrap();

        assert_eq!(anc, Some(AncStatus { mode: AncMode::Anc }));
        let cache = session.cached();
        assert_eq!(cache.mic, Some(MicStatus { enabled: false }));
        assert_eq!(
            cache.connection,
            Some(ConnectionStatus { wireless: true, bluetooth: false, bluetooth_on: true })
        );
    }

    #[test]
    fn test_drain_reads_info_then_display() {
        let (mut session, info, display) = session_with(CommandProfile::default());
        info.queue(&[0x07, 0xB7, 80, 30, 0]);
        info.queue(&[0x07, 0xEE, 0, 0, 0]);
        display.queue(&[0x06, 0x25, 0x30, 0, 0]);

        let events = session.drain_pending_events().unwrap();

        assert_eq!(
            events,
            vec![
                DeviceEvent::Battery(BatteryStatus { headset: 80, charging: 30 }),
                DeviceEvent::VolumeKnob { level: 8 },
            ]
        );
        assert!(session.drain_pending_events().unwrap().is_empty());
    }

    #[test]
    fn test_drain_is_capped_per_handle() {
        let (mut session, info, _) = session_with(CommandProfile::default());
        for _ in 0..(DRAIN_CAP + 10) {
            info.queue(&[0x07, 0x25, 0x10, 0, 0]);
        }

        assert_eq!(session.drain_pending_events().unwrap().len(), DRAIN_CAP);
        assert_eq!(session.drain_pending_events().unwrap().len(), 10);
    }

    #[test]
    fn test_active_queries_write_to_info_handle() {
        let mut profile = CommandProfile::default();
        profile.battery_query = Some(vec![0x06, 0xA1]);
        profile.sidetone.query_command = Some(vec![0x06, 0xA2]);
        profile.sidetone.event_command = Some(0xC1);
        profile.sidetone.value_index = 3;
        let (mut session, info, display) = session_with(profile);
        info.queue(&[0x06, 0xB7, 2, 8, 0, 0]);
        info.queue(&[0x07, 0xC1, 0, 7, 0, 0]);

        let battery = session.request_battery_status(Duration::from_millis(100)).unwrap();
        let sidetone = session.request_sidetone_status(Duration::from_millis(100)).unwrap();

        assert_eq!(battery, Some(BatteryStatus { headset: 2, charging: 8 }));
        assert_eq!(sidetone, Some(SidetoneStatus { level: 7 }));
        let writes = info.writes.lock();
        assert_eq!(writes.len(), 2);
        assert_eq!(&writes[0][..2], &[0x06, 0xA1]);
        assert_eq!(writes[0].len(), REPORT_LEN);
        assert_eq!(&writes[1][..2], &[0x06, 0xA2]);
        assert!(display.writes.lock().is_empty());
        // No label for level 7
        assert_eq!(session.sidetone_label().unwrap().as_deref(), Some("7"));
    }

    #[test]
    fn test_profile_commands_go_to_display_handle() {
        let mut profile = CommandProfile::default();
        profile.sidetone.set_commands =
            vec![SidetoneCommand { level: 5, bytes: vec![0x06, 0xA3, 0x05] }];
        profile.anc.set_commands =
            vec![AncCommand { mode: AncMode::Transparency, bytes: vec![0x06, 0xBD, 0x01] }];
        let (session, info, display) = session_with(profile);

        session.set_sidetone_level(5).unwrap();
        session.set_anc_mode(AncMode::Transparency).unwrap();
        session.set_brightness(7).unwrap();
        session.return_to_default_ui().unwrap();

        let writes = display.writes.lock();
        assert_eq!(&writes[0][..3], &[0x06, 0xA3, 0x05]);
        assert_eq!(&writes[1][..3], &[0x06, 0xBD, 0x01]);
        assert_eq!(&writes[2][..3], &[0x06, 0x85, 7]);
        assert_eq!(&writes[3][..2], &[0x06, 0x95]);
        assert!(info.writes.lock().is_empty());
    }

    #[test]
    fn test_missing_profile_commands_are_unsupported() {
        let (mut session, _, _) = session_with(CommandProfile::default());

        assert_matches!(session.set_sidetone_level(1), Err(HidError::Unsupported(_)));
        assert_matches!(session.set_anc_mode(AncMode::Off), Err(HidError::Unsupported(_)));
        assert_matches!(session.set_usb_input(UsbInput::Usb2), Err(HidError::Unsupported(_)));
        assert_matches!(
            session.request_battery_status(Duration::ZERO),
            Err(HidError::Unsupported(_))
        );
        assert_matches!(
            session.request_sidetone_status(Duration::ZERO),
            Err(HidError::Unsupported(_))
        );
        assert_matches!(session.anc_status_raw(), Err(HidError::Unsupported(_)));
    }

    #[test]
    fn test_write_arguments_validated() {
        let (session, _, display) = session_with(CommandProfile::default());

        assert_matches!(session.set_brightness(0), Err(HidError::InvalidArgument(_)));
        assert_matches!(session.set_brightness(11), Err(HidError::InvalidArgument(_)));
        assert_matches!(
            session.draw_bitmap_chunk(0, 0, 8, 8, &[0u8; 1019]),
            Err(HidError::InvalidArgument(_))
        );
        session.draw_bitmap_chunk(0, 0, 8, 8, &[0xFF; 8]).unwrap();

        assert!(display.writes.lock().is_empty());
        let reports = display.feature_reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(&reports[0][..6], &[0x06, 0x93, 0, 0, 8, 8]);
    }

    #[test]
    fn test_anc_status_raw_reads_info_answer() {
        let mut profile = CommandProfile::default();
        profile.anc.status_command = Some(vec![0x06, 0xBD]);
        let (session, info, _) = session_with(profile);
        info.queue(&[0x06, 0xBD, 0x02]);

        let raw = session.anc_status_raw().unwrap();

        assert_eq!(raw, vec![0x06, 0xBD, 0x02]);
        assert_eq!(&info.writes.lock()[0][..2], &[0x06, 0xBD]);
    }

    #[test]
    fn test_state_machine() {
        let backend = FakeBackend::new(&["dev-a"]);
        let mut session =
            BaseStationSession::new(Box::new(backend), DeviceMatch::default(), CommandProfile::default());

        assert_matches!(session.battery_status(Duration::ZERO), Err(HidError::NotConnected));
        assert_matches!(session.drain_pending_events(), Err(HidError::NotConnected));

        session.connect().unwrap();
        assert!(session.is_connected());
        session.connect().unwrap();

        session.close();
        session.close();
        assert!(!session.is_connected());
        assert_matches!(session.battery_status(Duration::ZERO), Err(HidError::SessionClosed));
        assert_matches!(session.connect(), Err(HidError::SessionClosed));
    }

    #[test]
    fn test_connect_without_device_stays_disconnected() {
        let mut session = BaseStationSession::new(
            Box::new(FakeBackend::new(&[])),
            DeviceMatch::default(),
            CommandProfile::default(),
        );

        assert_matches!(session.connect(), Err(HidError::DeviceNotFound { .. }));
        assert!(!session.is_connected());
        assert_matches!(session.set_brightness(5), Err(HidError::NotConnected));
    }

    #[test]
    fn test_profile_writes_need_connection_before_profile() {
        let mut session = BaseStationSession::new(
            Box::new(FakeBackend::new(&[])),
            DeviceMatch::default(),
            CommandProfile::empty(),
        );

        assert_matches!(session.set_sidetone_level(1), Err(HidError::NotConnected));
        assert_matches!(session.set_anc_mode(AncMode::Anc), Err(HidError::NotConnected));
        assert_matches!(session.set_usb_input(UsbInput::Usb2), Err(HidError::NotConnected));
        assert_matches!(session.anc_status_raw(), Err(HidError::NotConnected));
        assert_matches!(
            session.request_battery_status(Duration::ZERO),
            Err(HidError::NotConnected)
        );
        assert_matches!(
            session.request_sidetone_status(Duration::ZERO),
            Err(HidError::NotConnected)
        );
    }
}
