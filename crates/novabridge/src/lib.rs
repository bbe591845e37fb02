//! NovaBridge - one entry point for the Arctis Nova Pro base station and Sonar.
//!
//! [`NovaBridge`] owns a [`BaseStationSession`] behind a mutex, a
//! [`SonarClient`] and a [`PresetStore`], and forwards each call to whichever
//! of them serves it. Base station calls and Sonar calls are independent: a
//! missing base station does not affect the mixer operations and vice versa.

pub mod config;
pub mod error;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

pub use config::{Config, load_config};
pub use error::{Error, Result};

pub use novabridge_core::{
    ErrorKind, PresetChannel, RoutedApps, SonarChannel, SonarMode, SonarPreset, StreamerSlider,
    VolumeState,
};
pub use novabridge_db::PresetDatabase;
pub use novabridge_hid::{
    AncMode, AncStatus, BaseStationSession, BatteryStatus, CommandProfile, DeviceEvent,
    DeviceMatch, MicStatus, SidetoneStatus, StatusCache, UsbInput,
};
pub use novabridge_sonar::{PresetStore, ServiceDiscovery, ServiceEndpoints, SonarClient};

/// Facade over the base station session, the Sonar client and the preset store.
pub struct NovaBridge {
    session: Mutex<BaseStationSession>,
    sonar: Arc<SonarClient>,
    presets: PresetStore,
}

impl NovaBridge {
    #[must_use]
    pub fn new(session: BaseStationSession, sonar: Arc<SonarClient>, db: PresetDatabase) -> Self {
        let presets = PresetStore::new(db, Arc::clone(&sonar));
        Self { session: Mutex::new(session), sonar, presets }
    }

    /// Build every component from a configuration. Nothing is connected yet.
    ///
    /// # Errors
    /// Returns an error if hidapi or the HTTP client cannot be initialized.
    pub fn from_config(config: &Config) -> Result<Self> {
        let session =
            BaseStationSession::with_hidapi(config.device.clone(), config.profile.clone())?;
        let discovery = config
            .sonar
            .core_props_path
            .clone()
            .map_or_else(ServiceDiscovery::default, ServiceDiscovery::new);
        let sonar = SonarClient::with_reqwest(
            discovery,
            config.sonar.request_timeout(),
            config.sonar.accept_invalid_certs,
        )?;
        let db = config
            .database
            .path
            .clone()
            .map_or_else(PresetDatabase::at_default_path, PresetDatabase::new);
        Ok(Self::new(session, Arc::new(sonar), db))
    }

    #[must_use]
    pub fn sonar(&self) -> &SonarClient {
        &self.sonar
    }

    #[must_use]
    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    /// Run `f` with exclusive access to the session.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut BaseStationSession) -> T) -> T {
        f(&mut self.session.lock())
    }

    // --- Base station ---

    /// # Errors
    /// Returns a discovery error if no base station is attached.
    pub fn connect(&self) -> Result<()> {
        Ok(self.session.lock().connect()?)
    }

    pub fn close(&self) {
        self.session.lock().close();
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.lock().is_connected()
    }

    #[must_use]
    pub fn cached_status(&self) -> StatusCache {
        self.session.lock().cached()
    }

    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn drain_pending_events(&self) -> Result<Vec<DeviceEvent>> {
        Ok(self.session.lock().drain_pending_events()?)
    }

    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn battery_status(&self, refresh: Duration) -> Result<Option<BatteryStatus>> {
        Ok(self.session.lock().battery_status(refresh)?)
    }

    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn headset_battery(&self, refresh: Duration) -> Result<Option<u8>> {
        Ok(self.session.lock().headset_battery(refresh)?)
    }

    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn charging_station_battery(&self, refresh: Duration) -> Result<Option<u8>> {
        Ok(self.session.lock().charging_station_battery(refresh)?)
    }

    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn sidetone_status(&self, refresh: Duration) -> Result<Option<SidetoneStatus>> {
        Ok(self.session.lock().sidetone_status(refresh)?)
    }

    /// # Errors
    /// Returns an error if the session is not connected.
    pub fn sidetone_label(&self) -> Result<Option<String>> {
        Ok(self.session.lock().sidetone_label()?)
    }

    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn anc_status(&self, refresh: Duration) -> Result<Option<AncStatus>> {
        Ok(self.session.lock().anc_status(refresh)?)
    }

    /// # Errors
    /// Returns an error if the session is not connected or a read fails.
    pub fn mic_status(&self, refresh: Duration) -> Result<Option<MicStatus>> {
        Ok(self.session.lock().mic_status(refresh)?)
    }

    /// # Errors
    /// Returns an unsupported-feature error without a battery query command.
    pub fn request_battery_status(&self, refresh: Duration) -> Result<Option<BatteryStatus>> {
        Ok(self.session.lock().request_battery_status(refresh)?)
    }

    /// # Errors
    /// Returns an unsupported-feature error without a sidetone query command.
    pub fn request_sidetone_status(&self, refresh: Duration) -> Result<Option<SidetoneStatus>> {
        Ok(self.session.lock().request_sidetone_status(refresh)?)
    }

    /// # Errors
    /// Returns an unsupported-feature error without an ANC status command.
    pub fn anc_status_raw(&self) -> Result<Vec<u8>> {
        Ok(self.session.lock().anc_status_raw()?)
    }

    /// # Errors
    /// Returns an invalid-argument error outside 1-10.
    pub fn set_brightness(&self, level: u8) -> Result<()> {
        Ok(self.session.lock().set_brightness(level)?)
    }

    /// # Errors
    /// Returns an error if the session is not connected or the write fails.
    pub fn return_to_default_ui(&self) -> Result<()> {
        Ok(self.session.lock().return_to_default_ui()?)
    }

    /// # Errors
    /// Returns an invalid-argument error if the payload is too large.
    pub fn draw_bitmap_chunk(&self, x: u8, y: u8, width: u8, height: u8, payload: &[u8]) -> Result<()> {
        Ok(self.session.lock().draw_bitmap_chunk(x, y, width, height, payload)?)
    }

    /// # Errors
    /// Returns an unsupported-feature error if the profile has no command for `level`.
    pub fn set_sidetone_level(&self, level: u8) -> Result<()> {
        Ok(self.session.lock().set_sidetone_level(level)?)
    }

    /// # Errors
    /// Returns an unsupported-feature error if the profile has no command for `mode`.
    pub fn set_anc_mode(&self, mode: AncMode) -> Result<()> {
        Ok(self.session.lock().set_anc_mode(mode)?)
    }

    /// # Errors
    /// Returns an unsupported-feature error if the profile has no command for `input`.
    pub fn set_usb_input(&self, input: UsbInput) -> Result<()> {
        Ok(self.session.lock().set_usb_input(input)?)
    }

    // --- Sonar ---

    /// # Errors
    /// Returns a discovery error if Sonar cannot be found.
    pub fn refresh_discovery(&self) -> Result<Arc<ServiceEndpoints>> {
        Ok(self.sonar.refresh_discovery()?)
    }

    /// # Errors
    /// Returns an error if Sonar cannot be reached.
    pub fn mode(&self) -> Result<SonarMode> {
        Ok(self.sonar.mode()?)
    }

    /// # Errors
    /// Returns an error if Sonar cannot be reached.
    pub fn streamer_mode(&self) -> Result<bool> {
        Ok(self.sonar.streamer_mode()?)
    }

    /// # Errors
    /// Returns an error if Sonar cannot be reached.
    pub fn set_streamer_mode(&self, enabled: bool) -> Result<bool> {
        Ok(self.sonar.set_streamer_mode(enabled)?)
    }

    /// # Errors
    /// Returns an error if Sonar cannot be reached or reports no volume for `channel`.
    pub fn channel_volume(
        &self,
        channel: SonarChannel,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> Result<f64> {
        Ok(self.sonar.channel_volume(channel, slider, mode)?)
    }

    /// # Errors
    /// Returns an error if Sonar cannot be reached or reports no mute state for `channel`.
    pub fn channel_mute(
        &self,
        channel: SonarChannel,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> Result<bool> {
        Ok(self.sonar.channel_mute(channel, slider, mode)?)
    }

    /// # Errors
    /// Returns an error for a volume outside 0.0 - 1.0 or if no endpoint accepts the write.
    pub fn set_channel_volume(
        &self,
        channel: SonarChannel,
        volume: f64,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> Result<Value> {
        Ok(self.sonar.set_channel_volume(channel, volume, slider, mode)?)
    }

    /// # Errors
    /// Returns an error if no endpoint accepts the write.
    pub fn set_channel_mute(
        &self,
        channel: SonarChannel,
        muted: bool,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> Result<Value> {
        Ok(self.sonar.set_channel_mute(channel, muted, slider, mode)?)
    }

    /// # Errors
    /// Returns an error if Sonar cannot be reached.
    pub fn volume_state(&self, slider: StreamerSlider, mode: Option<SonarMode>) -> Result<VolumeState> {
        Ok(self.sonar.volume_state(slider, mode)?)
    }

    /// # Errors
    /// Returns an error if Sonar cannot be reached.
    pub fn chat_mix(&self) -> Result<Value> {
        Ok(self.sonar.chat_mix()?)
    }

    /// # Errors
    /// Returns an error for a balance outside -1.0 - 1.0 or a failed request.
    pub fn set_chat_mix(&self, balance: f64) -> Result<Value> {
        Ok(self.sonar.set_chat_mix(balance)?)
    }

    /// # Errors
    /// Returns an error if no routing endpoint answers.
    pub fn routing_data(&self) -> Result<Value> {
        Ok(self.sonar.routing_data()?)
    }

    /// # Errors
    /// Returns an error if no routing endpoint answers.
    pub fn routed_apps_by_channel(&self) -> Result<RoutedApps> {
        Ok(self.sonar.routed_apps_by_channel()?)
    }

    // --- Presets ---

    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn list_presets(&self, channel: PresetChannel) -> Result<Vec<SonarPreset>> {
        Ok(self.presets.list_presets(channel)?)
    }

    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn list_favorite_presets(&self, channel: PresetChannel) -> Result<Vec<SonarPreset>> {
        Ok(self.presets.list_favorite_presets(channel)?)
    }

    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn favorite_presets_by_channel(&self) -> Result<BTreeMap<PresetChannel, Vec<SonarPreset>>> {
        Ok(self.presets.favorite_presets_by_channel()?)
    }

    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn selected_preset(&self, channel: PresetChannel) -> Result<Option<SonarPreset>> {
        Ok(self.presets.selected_preset(channel)?)
    }

    /// # Errors
    /// Returns an error if Sonar rejects the selection.
    pub fn select_preset(&self, preset_id: &str) -> Result<()> {
        Ok(self.presets.select_preset(preset_id)?)
    }

    /// # Errors
    /// Returns an invalid-argument error if the channel has no preset named `name`.
    pub fn select_preset_by_name(&self, channel: PresetChannel, name: &str) -> Result<SonarPreset> {
        Ok(self.presets.select_preset_by_name(channel, name)?)
    }
}
