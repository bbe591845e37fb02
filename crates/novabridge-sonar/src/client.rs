//! Adaptive Sonar client.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use novabridge_core::{
    ChannelVolume, RoutedApps, SonarChannel, SonarMode, StreamerSlider, VolumeState,
    extract_routed_apps, validate_balance, validate_volume,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::discovery::{ServiceDiscovery, ServiceEndpoints};
use crate::error::{SonarError, SonarResult};
use crate::http::{HttpResponse, HttpTransport, Method, ReqwestTransport};
use crate::probe::{Verdict, try_candidates_in_order};
use crate::volume::{
    extract_channel_mute, extract_channel_volume, looks_like_volume_payload, payload_keys,
};

/// Paths the routing table has been served from, in probe order.
const ROUTING_PATHS: &[&str] = &[
    "/AudioDeviceRouting",
    "/audioDeviceRouting",
    "/Applications",
    "/routing",
    "/routingSettings",
    "/appRouting",
    "/audioRouting",
    "/applications",
    "/sessions",
    "/audioSessions",
];

/// What a volume setting write changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolumeKey {
    Volume,
    Muted,
}

impl VolumeKey {
    fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Muted => "muted",
        }
    }

    fn capitalized(self) -> &'static str {
        match self {
            Self::Volume => "Volume",
            Self::Muted => "Muted",
        }
    }
}

/// Candidate GET paths for the volume document.
fn volume_get_paths(mode: Option<SonarMode>) -> Vec<&'static str> {
    match mode {
        None => vec![
            "/volumeSettings",
            "/VolumeSettings",
            "/volumeSettings/classic",
            "/VolumeSettings/classic",
            "/volumeSettings/streamer",
            "/VolumeSettings/streamer",
        ],
        Some(SonarMode::Stream) => vec![
            "/volumeSettings/streamer",
            "/VolumeSettings/streamer",
            "/volumeSettings",
            "/VolumeSettings",
        ],
        Some(SonarMode::Classic) => vec![
            "/volumeSettings/classic",
            "/VolumeSettings/classic",
            "/volumeSettings",
            "/VolumeSettings",
        ],
    }
}

/// Candidate PUT paths for one volume or mute write, newest API first.
fn volume_set_paths(
    channel: SonarChannel,
    mode: SonarMode,
    key: VolumeKey,
    value: &str,
    slider: StreamerSlider,
) -> Vec<String> {
    let section = match channel {
        SonarChannel::Master => "masters".to_string(),
        _ => format!("devices/{channel}"),
    };
    let mut paths = Vec::new();
    for prefix in ["/volumeSettings", "/VolumeSettings"] {
        for key_name in [key.as_str(), key.capitalized()] {
            paths.push(format!("{prefix}/{section}/{mode}/{key_name}/{value}"));
        }
    }

    let slider = slider.as_str();
    match (mode, key) {
        (SonarMode::Stream, VolumeKey::Volume) => {
            for prefix in ["/volumeSettings", "/VolumeSettings"] {
                paths.push(format!("{prefix}/streamer/{slider}/{channel}/Volume/{value}"));
            }
        }
        (SonarMode::Stream, VolumeKey::Muted) => {
            for prefix in ["/volumeSettings", "/VolumeSettings"] {
                paths.push(format!("{prefix}/streamer/{slider}/{channel}/isMuted/{value}"));
            }
        }
        (SonarMode::Classic, VolumeKey::Volume) => {
            for prefix in ["/volumeSettings", "/VolumeSettings"] {
                paths.push(format!("{prefix}/classic/{channel}/Volume/{value}"));
            }
        }
        (SonarMode::Classic, VolumeKey::Muted) => {
            for prefix in ["/volumeSettings", "/VolumeSettings"] {
                paths.push(format!("{prefix}/classic/{channel}/Mute/{value}"));
                paths.push(format!("{prefix}/classic/{channel}/muted/{value}"));
            }
        }
    }
    paths
}

/// Format a number the way Sonar expects in paths (`0.5`, `1.0`).
fn format_number(value: f64) -> String {
    format!("{value:?}")
}

/// Body of a PUT answer. Empty bodies count as success.
fn put_payload(response: &HttpResponse) -> SonarResult<Value> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    response.json()
}

fn judge_put(payload: &Value) -> Verdict {
    match payload {
        Value::Object(map) if map.is_empty() => Verdict::Fallback,
        _ => Verdict::Accept,
    }
}

fn judge_volume(payload: &Value) -> Verdict {
    if looks_like_volume_payload(payload) { Verdict::Accept } else { Verdict::Fallback }
}

fn judge_routing(payload: &Value) -> Verdict {
    match payload {
        Value::Object(map) if !map.is_empty() => Verdict::Accept,
        Value::Array(items) if !items.is_empty() => Verdict::Accept,
        Value::Object(_) | Value::Array(_) => Verdict::Fallback,
        _ => Verdict::Reject,
    }
}

/// Client for the Sonar HTTP API.
///
/// Discovery runs on first use and its result is cached; call
/// [`refresh_discovery`](Self::refresh_discovery) after Sonar restarts.
pub struct SonarClient {
    http: Arc<dyn HttpTransport>,
    discovery: ServiceDiscovery,
    endpoints: ArcSwapOption<ServiceEndpoints>,
}

impl SonarClient {
    #[must_use]
    pub fn new(http: Arc<dyn HttpTransport>, discovery: ServiceDiscovery) -> Self {
        Self { http, discovery, endpoints: ArcSwapOption::empty() }
    }

    /// Client over reqwest.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_reqwest(
        discovery: ServiceDiscovery,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> SonarResult<Self> {
        let http = ReqwestTransport::new(timeout, accept_invalid_certs)?;
        Ok(Self::new(Arc::new(http), discovery))
    }

    /// Client with already known endpoints. Discovery only runs on
    /// [`refresh_discovery`](Self::refresh_discovery).
    #[must_use]
    pub fn with_endpoints(
        http: Arc<dyn HttpTransport>,
        discovery: ServiceDiscovery,
        endpoints: ServiceEndpoints,
    ) -> Self {
        Self { http, discovery, endpoints: ArcSwapOption::from_pointee(endpoints) }
    }

    /// Run discovery again and cache the result.
    ///
    /// # Errors
    /// Returns an error if discovery fails; the previous endpoints are kept.
    pub fn refresh_discovery(&self) -> SonarResult<Arc<ServiceEndpoints>> {
        let endpoints = Arc::new(self.discovery.discover(self.http.as_ref())?);
        self.endpoints.store(Some(Arc::clone(&endpoints)));
        Ok(endpoints)
    }

    /// Current endpoints, discovering them on first use.
    ///
    /// # Errors
    /// Returns an error if discovery is needed and fails.
    pub fn endpoints(&self) -> SonarResult<Arc<ServiceEndpoints>> {
        match self.endpoints.load_full() {
            Some(endpoints) => Ok(endpoints),
            None => self.refresh_discovery(),
        }
    }

    fn url(&self, path: &str) -> SonarResult<String> {
        Ok(format!("{}{path}", self.endpoints()?.sonar_url))
    }

    fn get_json(&self, path: &str) -> SonarResult<Value> {
        self.http.request(Method::Get, &self.url(path)?)?.json()
    }

    fn put_json(&self, path: &str) -> SonarResult<Value> {
        put_payload(&self.http.request(Method::Put, &self.url(path)?)?)
    }

    /// Mixing mode Sonar is currently in. Anything but `"stream"` is classic.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub fn mode(&self) -> SonarResult<SonarMode> {
        Ok(SonarMode::from_streamer(self.streamer_mode()?))
    }

    /// Whether stream mode is active.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub fn streamer_mode(&self) -> SonarResult<bool> {
        Ok(self.get_json("/mode/")?.as_str() == Some("stream"))
    }

    /// Switch between classic and stream mode. Returns whether stream mode is
    /// active afterwards.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub fn set_streamer_mode(&self, enabled: bool) -> SonarResult<bool> {
        let target = SonarMode::from_streamer(enabled);
        let value = self.put_json(&format!("/mode/{target}"))?;
        Ok(value.as_str() == Some("stream"))
    }

    fn resolve_mode(&self, mode: Option<SonarMode>) -> SonarResult<SonarMode> {
        match mode {
            Some(mode) => Ok(mode),
            None => self.mode(),
        }
    }

    /// Raw volume document, probing the known endpoints.
    ///
    /// # Errors
    /// Returns the last request error if no endpoint answered.
    pub fn volume_data(&self, mode: Option<SonarMode>) -> SonarResult<Value> {
        let base = self.endpoints()?.sonar_url.clone();
        try_candidates_in_order(
            volume_get_paths(mode),
            "volume endpoint",
            |path| {
                debug!(path, "Probing volume endpoint");
                self.http.request(Method::Get, &format!("{base}{path}"))?.json()
            },
            judge_volume,
        )
    }

    /// Volume of a channel (0.0 - 1.0).
    ///
    /// `mode` defaults to the current Sonar mode; `slider` only matters in
    /// stream mode.
    ///
    /// # Errors
    /// Returns [`SonarError::InvalidArgument`] if no known payload shape holds
    /// the channel's volume.
    pub fn channel_volume(
        &self,
        channel: SonarChannel,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> SonarResult<f64> {
        let resolved = self.resolve_mode(mode)?;
        let payload = self.volume_data(mode)?;
        extract_channel_volume(&payload, channel, resolved, slider).ok_or_else(|| {
            SonarError::InvalidArgument(format!(
                "could not read volume for channel '{channel}', response keys: {:?}",
                payload_keys(&payload)
            ))
        })
    }

    /// Mute flag of a channel.
    ///
    /// # Errors
    /// Returns [`SonarError::InvalidArgument`] if no known payload shape holds
    /// the channel's mute state.
    pub fn channel_mute(
        &self,
        channel: SonarChannel,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> SonarResult<bool> {
        let resolved = self.resolve_mode(mode)?;
        let payload = self.volume_data(mode)?;
        extract_channel_mute(&payload, channel, resolved, slider).ok_or_else(|| {
            SonarError::InvalidArgument(format!(
                "could not read mute state for channel '{channel}', response keys: {:?}",
                payload_keys(&payload)
            ))
        })
    }

    /// Volume and mute of every channel that can be read from one document.
    ///
    /// # Errors
    /// Returns an error if the volume document cannot be fetched.
    pub fn volume_state(
        &self,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> SonarResult<VolumeState> {
        let resolved = self.resolve_mode(mode)?;
        let payload = self.volume_data(mode)?;
        Ok(SonarChannel::ALL
            .into_iter()
            .filter_map(|channel| {
                let volume = extract_channel_volume(&payload, channel, resolved, slider)?;
                let muted =
                    extract_channel_mute(&payload, channel, resolved, slider).unwrap_or(false);
                Some((channel, ChannelVolume { volume, muted }))
            })
            .collect())
    }

    fn put_first_success(&self, paths: Vec<String>) -> SonarResult<Value> {
        let base = self.endpoints()?.sonar_url.clone();
        try_candidates_in_order(
            paths,
            "volume endpoint",
            |path| {
                debug!(path, "Trying volume write");
                put_payload(&self.http.request(Method::Put, &format!("{base}{path}"))?)
            },
            judge_put,
        )
    }

    /// Set a channel's volume (0.0 - 1.0). Returns Sonar's answer.
    ///
    /// # Errors
    /// Returns an error for an out of range volume, or the last request error
    /// if no endpoint accepted the write.
    pub fn set_channel_volume(
        &self,
        channel: SonarChannel,
        volume: f64,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> SonarResult<Value> {
        let volume = validate_volume(volume)?;
        let mode = self.resolve_mode(mode)?;
        let paths =
            volume_set_paths(channel, mode, VolumeKey::Volume, &format_number(volume), slider);
        self.put_first_success(paths)
    }

    /// Mute or unmute a channel. Returns Sonar's answer.
    ///
    /// # Errors
    /// Returns the last request error if no endpoint accepted the write.
    pub fn set_channel_mute(
        &self,
        channel: SonarChannel,
        muted: bool,
        slider: StreamerSlider,
        mode: Option<SonarMode>,
    ) -> SonarResult<Value> {
        let mode = self.resolve_mode(mode)?;
        let paths = volume_set_paths(channel, mode, VolumeKey::Muted, &muted.to_string(), slider);
        self.put_first_success(paths)
    }

    /// Chat mix document.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub fn chat_mix(&self) -> SonarResult<Value> {
        self.get_json("/chatMix")
    }

    /// Set the game/chat balance (-1.0 - 1.0).
    ///
    /// # Errors
    /// Returns an error for an out of range balance or a failed request.
    pub fn set_chat_mix(&self, balance: f64) -> SonarResult<Value> {
        let balance = validate_balance(balance)?;
        self.put_json(&format!("/chatMix?balance={}", format_number(balance)))
    }

    /// Raw routing document, probing the known endpoints.
    ///
    /// # Errors
    /// Returns the last request error if no endpoint answered.
    pub fn routing_data(&self) -> SonarResult<Value> {
        let base = self.endpoints()?.sonar_url.clone();
        let paths = ROUTING_PATHS.iter().flat_map(|path| [(*path).to_string(), format!("{path}/")]);
        try_candidates_in_order(
            paths,
            "routing endpoint",
            |path| {
                let response = self.http.request(Method::Get, &format!("{base}{path}"))?;
                // Some candidates answer with HTML; treat those as no answer.
                Ok(response.json().unwrap_or(Value::Null))
            },
            judge_routing,
        )
    }

    /// Applications routed to each channel.
    ///
    /// # Errors
    /// Returns an error if no routing endpoint answered.
    pub fn routed_apps_by_channel(&self) -> SonarResult<RoutedApps> {
        Ok(extract_routed_apps(&self.routing_data()?))
    }

    /// Select a preset by id.
    ///
    /// # Errors
    /// Returns an error if the Sonar URL has no port or the request fails.
    pub fn select_preset(&self, preset_id: &str) -> SonarResult<()> {
        let local = self.endpoints()?.local_url()?;
        let url = format!("{local}/configs/{preset_id}/select");
        self.http.request(Method::Put, &url).inspect_err(|err| {
            warn!(preset_id, error = %err, "Preset selection failed");
        })?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording HTTP fake.

    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;

    pub const SONAR_URL: &str = "http://127.0.0.1:54321";

    /// Answers from a fixed route table; everything else is a 404.
    #[derive(Default)]
    pub struct FakeHttp {
        routes: Mutex<HashMap<(Method, String), (u16, String)>>,
        pub log: Mutex<Vec<(Method, String)>>,
    }

    impl FakeHttp {
        pub fn route(&self, method: Method, path: &str, status: u16, body: &str) {
            self.routes
                .lock()
                .insert((method, format!("{SONAR_URL}{path}")), (status, body.to_string()));
        }

        pub fn paths(&self) -> Vec<String> {
            self.log
                .lock()
                .iter()
                .map(|(_, url)| url.trim_start_matches(SONAR_URL).to_string())
                .collect()
        }
    }

    impl HttpTransport for FakeHttp {
        fn request(&self, method: Method, url: &str) -> SonarResult<HttpResponse> {
            self.log.lock().push((method, url.to_string()));
            let (status, body) =
                self.routes.lock().get(&(method, url.to_string())).cloned().unwrap_or((404, String::new()));
            if status >= 400 {
                return Err(SonarError::Request {
                    url: url.to_string(),
                    status: Some(status),
                    message: "Not Found".into(),
                });
            }
            Ok(HttpResponse::new(url, status, body))
        }
    }

    pub fn client(http: &Arc<FakeHttp>) -> SonarClient {
        SonarClient::with_endpoints(
            Arc::clone(http) as Arc<dyn HttpTransport>,
            ServiceDiscovery::new("unused"),
            ServiceEndpoints::with_sonar_url(SONAR_URL),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeHttp, client};
    use super::*;
    use assert_matches::assert_matches;

    const STREAMING: StreamerSlider = StreamerSlider::Streaming;

    #[test]
    fn test_volume_from_devices_array() {
        let http = Arc::new(FakeHttp::default());
        http.route(
            Method::Get,
            "/volumeSettings/classic",
            200,
            r#"{"masters": [{"name": "master", "volume": 76}],
                "devices": [{"role": "game", "volume": 65}, {"role": "media", "volume": 20}]}"#,
        );
        let sonar = client(&http);

        let game = sonar.channel_volume(SonarChannel::Game, STREAMING, Some(SonarMode::Classic));

        assert!((game.unwrap() - 0.65).abs() < 1e-9);
        assert_eq!(http.paths(), ["/volumeSettings/classic"]);
    }

    #[test]
    fn test_volume_mode_resolved_from_service() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/mode/", 200, r#""classic""#);
        http.route(
            Method::Get,
            "/volumeSettings",
            200,
            r#"{"devices": {"game": {"classic": {"volume": 0.72}, "stream": {"volume": 0.1}}}}"#,
        );
        let sonar = client(&http);

        let game = sonar.channel_volume(SonarChannel::Game, STREAMING, None).unwrap();

        assert!((game - 0.72).abs() < 1e-9);
        assert_eq!(http.paths(), ["/mode/", "/volumeSettings"]);
    }

    #[test]
    fn test_volume_data_keeps_empty_fallback() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/volumeSettings/streamer", 200, "{}");
        let sonar = client(&http);

        let payload = sonar.volume_data(Some(SonarMode::Stream)).unwrap();

        assert_eq!(payload, serde_json::json!({}));
        assert_eq!(http.paths().len(), 4);
    }

    #[test]
    fn test_volume_data_all_failed_returns_last_error() {
        let http = Arc::new(FakeHttp::default());
        let sonar = client(&http);

        let err = sonar.volume_data(Some(SonarMode::Classic)).unwrap_err();

        assert_matches!(err, SonarError::Request { ref url, status: Some(404), .. } if url.ends_with("/VolumeSettings"));
    }

    #[test]
    fn test_missing_channel_is_invalid_argument() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/volumeSettings/classic", 200, r#"{"devices": []}"#);
        let sonar = client(&http);

        let err = sonar.channel_mute(SonarChannel::Aux, STREAMING, Some(SonarMode::Classic));

        assert_matches!(err, Err(SonarError::InvalidArgument(msg)) if msg.contains("aux"));
    }

    #[test]
    fn test_set_volume_falls_back_to_legacy_path() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Put, "/volumeSettings/classic/game/Volume/0.5", 200, r#"{"ok": true}"#);
        let sonar = client(&http);

        let answer = sonar
            .set_channel_volume(SonarChannel::Game, 0.5, STREAMING, Some(SonarMode::Classic))
            .unwrap();

        assert_eq!(answer, serde_json::json!({"ok": true}));
        let paths = http.paths();
        assert_eq!(paths.first().map(String::as_str), Some("/volumeSettings/devices/game/classic/volume/0.5"));
        assert_eq!(paths.last().map(String::as_str), Some("/volumeSettings/classic/game/Volume/0.5"));
        assert_eq!(paths.len(), 5);
    }

    #[test]
    fn test_set_volume_validates_before_requests() {
        let http = Arc::new(FakeHttp::default());
        let sonar = client(&http);

        let err = sonar.set_channel_volume(SonarChannel::Game, 1.5, STREAMING, Some(SonarMode::Classic));

        assert_matches!(err, Err(SonarError::Core(novabridge_core::Error::InvalidVolume(_))));
        assert!(http.paths().is_empty());
    }

    #[test]
    fn test_set_mute_stream_paths() {
        let http = Arc::new(FakeHttp::default());
        http.route(
            Method::Put,
            "/VolumeSettings/streamer/monitoring/chatRender/isMuted/true",
            200,
            "",
        );
        let sonar = client(&http);

        sonar
            .set_channel_mute(
                SonarChannel::ChatRender,
                true,
                StreamerSlider::Monitoring,
                Some(SonarMode::Stream),
            )
            .unwrap();

        assert_eq!(
            http.paths(),
            [
                "/volumeSettings/devices/chatRender/stream/muted/true",
                "/volumeSettings/devices/chatRender/stream/Muted/true",
                "/VolumeSettings/devices/chatRender/stream/muted/true",
                "/VolumeSettings/devices/chatRender/stream/Muted/true",
                "/volumeSettings/streamer/monitoring/chatRender/isMuted/true",
                "/VolumeSettings/streamer/monitoring/chatRender/isMuted/true",
            ]
        );
    }

    #[test]
    fn test_master_write_uses_masters_section() {
        let paths = volume_set_paths(
            SonarChannel::Master,
            SonarMode::Classic,
            VolumeKey::Muted,
            "false",
            STREAMING,
        );

        assert_eq!(paths[0], "/volumeSettings/masters/classic/muted/false");
        assert_eq!(paths.len(), 8);
        assert_eq!(paths[4], "/volumeSettings/classic/master/Mute/false");
        assert_eq!(paths[5], "/volumeSettings/classic/master/muted/false");
    }

    #[test]
    fn test_mode_and_streamer_mode() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/mode/", 200, r#""stream""#);
        http.route(Method::Put, "/mode/classic", 200, r#""classic""#);
        let sonar = client(&http);

        assert_eq!(sonar.mode().unwrap(), SonarMode::Stream);
        assert!(sonar.streamer_mode().unwrap());
        assert!(!sonar.set_streamer_mode(false).unwrap());
    }

    #[test]
    fn test_unrecognized_mode_answer_reads_classic() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/mode/", 200, r#"{"mode": "classic"}"#);
        http.route(
            Method::Get,
            "/volumeSettings",
            200,
            r#"{"devices": [{"role": "game", "volume": 65, "muted": false}]}"#,
        );
        let sonar = client(&http);

        assert!(!sonar.streamer_mode().unwrap());
        assert_eq!(sonar.mode().unwrap(), SonarMode::Classic);
        let game = sonar.channel_volume(SonarChannel::Game, STREAMING, None).unwrap();
        assert!((game - 0.65).abs() < 1e-9);
        assert!(!sonar.channel_mute(SonarChannel::Game, STREAMING, None).unwrap());
    }

    #[test]
    fn test_chat_mix() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/chatMix", 200, r#"{"balance": 0.0}"#);
        http.route(Method::Put, "/chatMix?balance=-0.25", 200, r#"{"balance": -0.25}"#);
        let sonar = client(&http);

        assert_eq!(sonar.chat_mix().unwrap()["balance"], 0.0);
        assert_eq!(sonar.set_chat_mix(-0.25).unwrap()["balance"], -0.25);
        assert_matches!(sonar.set_chat_mix(1.5), Err(SonarError::Core(_)));
    }

    #[test]
    fn test_routing_probe_skips_html_and_empty() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/AudioDeviceRouting", 200, "<html>nope</html>");
        http.route(Method::Get, "/routing", 200, "[]");
        http.route(
            Method::Get,
            "/applications/",
            200,
            r#"{"applications": [{"name": "Discord", "channel": "chatRender"}]}"#,
        );
        let sonar = client(&http);

        let routed = sonar.routed_apps_by_channel().unwrap();

        assert_eq!(routed[&SonarChannel::ChatRender], ["Discord"]);
        assert_eq!(http.paths().last().map(String::as_str), Some("/applications/"));
    }

    #[test]
    fn test_routing_empty_fallback() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Get, "/sessions", 200, "{}");
        let sonar = client(&http);

        assert_eq!(sonar.routing_data().unwrap(), serde_json::json!({}));
        assert_eq!(http.paths().len(), 20);
    }

    #[test]
    fn test_volume_state_reads_all_channels() {
        let http = Arc::new(FakeHttp::default());
        http.route(
            Method::Get,
            "/volumeSettings/classic",
            200,
            r#"{"master": {"Volume": 0.8, "Mute": false}, "game": {"Volume": 0.5, "Mute": true}}"#,
        );
        let sonar = client(&http);

        let state = sonar.volume_state(STREAMING, Some(SonarMode::Classic)).unwrap();

        assert_eq!(state.len(), 2);
        assert_eq!(state[&SonarChannel::Game], ChannelVolume { volume: 0.5, muted: true });
    }

    #[test]
    fn test_select_preset_uses_local_url() {
        let http = Arc::new(FakeHttp::default());
        http.route(Method::Put, "/configs/id_1/select", 200, "");
        let sonar = client(&http);

        sonar.select_preset("id_1").unwrap();

        assert_eq!(http.paths(), ["/configs/id_1/select"]);
    }
}
