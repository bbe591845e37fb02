//! Application routing extraction.
//!
//! Sonar reports which application plays into which channel, but the
//! document shape has changed between GG releases. Known shapes include:
//!
//! - `{"applications": [{"name": "Discord", "channel": "chatRender"}]}`
//! - `{"game": ["cs2.exe"], "media": [{"processName": "Spotify.exe"}]}`
//! - `[{"role": "game", "audioSessions": [{"processName": "cs2.exe", "state": "active"}]}]`
//!
//! [`extract_routed_apps`] walks an arbitrary JSON document and collects
//! whatever routing information it can find.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};
use tracing::trace;

use crate::channel::SonarChannel;

/// Application names routed to each channel. Always contains all six channels.
pub type RoutedApps = BTreeMap<SonarChannel, Vec<String>>;

/// Keys whose array values hold routing entries.
const CONTAINER_KEYS: &[&str] = &["applications", "apps", "sessions", "processes", "items", "routes"];

/// Keys that may carry an application name, in priority order.
const APP_NAME_KEYS: &[&str] = &[
    "name",
    "appName",
    "processName",
    "displayName",
    "title",
    "application",
    "exe",
    "executable",
];

/// Keys that may carry the channel an entry is routed to, in priority order.
const CHANNEL_KEYS: &[&str] = &[
    "role",
    "channel",
    "deviceRole",
    "output",
    "route",
    "routedTo",
    "dest",
    "destination",
    "assignedTo",
];

/// Keys checked when the channel key holds an object instead of a string.
const NESTED_CHANNEL_KEYS: &[&str] = &["role", "channel", "name", "id", "value"];

/// Session states that count as currently playing.
const ACTIVE_SESSION_STATES: &[&str] = &["active", "running"];

/// Substrings that identify a channel in routing labels.
fn routing_aliases(channel: SonarChannel) -> &'static [&'static str] {
    match channel {
        SonarChannel::Master => &["master", "main"],
        SonarChannel::Game => &["game", "gaming"],
        SonarChannel::ChatRender => &["chatrender", "chat_render", "chat render", "render"],
        SonarChannel::Media => &["media", "music"],
        SonarChannel::Aux => &["aux", "auxiliary"],
        SonarChannel::ChatCapture => &["chatcapture", "chat_capture", "mic", "microphone", "capture"],
    }
}

/// Resolve a free-form label such as `"chat-render"` or `"Game"` to a channel.
fn channel_from_label(label: &str) -> Option<SonarChannel> {
    let normalized = label.to_lowercase().replace('-', "_");
    let compact = normalized.replace('_', "");
    SonarChannel::ALL.into_iter().find(|channel| {
        routing_aliases(*channel)
            .iter()
            .any(|alias| normalized.contains(alias) || compact.contains(alias))
    })
}

fn app_name_from(item: &Map<String, Value>) -> Option<String> {
    for key in APP_NAME_KEYS {
        match item.get(*key) {
            Some(Value::String(value)) => {
                let cleaned = value.trim();
                if !cleaned.is_empty() {
                    return Some(cleaned.to_string());
                }
            }
            Some(Value::Object(nested)) => {
                if let Some(name) = nested.get("name").and_then(Value::as_str).map(str::trim)
                    && !name.is_empty()
                {
                    return Some(name.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn channel_from(item: &Map<String, Value>) -> Option<SonarChannel> {
    for key in CHANNEL_KEYS {
        match item.get(*key) {
            Some(Value::String(value)) => {
                if let Some(channel) = channel_from_label(value) {
                    return Some(channel);
                }
            }
            Some(Value::Object(nested)) => {
                let found = NESTED_CHANNEL_KEYS
                    .iter()
                    .filter_map(|nested_key| nested.get(*nested_key).and_then(Value::as_str))
                    .find_map(channel_from_label);
                if found.is_some() {
                    return found;
                }
            }
            _ => {}
        }
    }
    None
}

/// Names of the live application sessions in an `audioSessions` list.
///
/// Inactive sessions, system sounds, and sessions without a real process id
/// are skipped.
fn active_session_names(sessions: &[Value]) -> impl Iterator<Item = String> + '_ {
    sessions.iter().filter_map(Value::as_object).filter_map(|session| {
        if let Some(state) = session.get("state").and_then(Value::as_str)
            && !ACTIVE_SESSION_STATES.contains(&state.trim().to_lowercase().as_str())
        {
            return None;
        }
        if session.get("isSystemSound").and_then(Value::as_bool) == Some(true) {
            return None;
        }
        if session.get("processId").and_then(Value::as_i64).is_some_and(|pid| pid <= 0) {
            return None;
        }
        app_name_from(session)
    })
}

/// Walk the document, collecting entry objects and direct channel maps.
fn collect_entries<'a>(
    node: &'a Value,
    routed: &mut RoutedApps,
    entries: &mut Vec<&'a Map<String, Value>>,
) {
    match node {
        Value::Object(map) => {
            for key in CONTAINER_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    entries.extend(items.iter().filter_map(Value::as_object));
                }
            }

            for (key, value) in map {
                // Some payloads map channels directly to app lists.
                if let (Some(channel), Value::Array(apps)) = (channel_from_label(key), value) {
                    let names = routed.entry(channel).or_default();
                    for app in apps {
                        let name = match app {
                            Value::String(name) => Some(name.trim().to_string()),
                            Value::Object(item) => app_name_from(item),
                            _ => None,
                        };
                        names.extend(name.filter(|name| !name.is_empty()));
                    }
                }
                if value.is_object() || value.is_array() {
                    collect_entries(value, routed, entries);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Some(entry) = item.as_object() {
                    entries.push(entry);
                    collect_entries(item, routed, entries);
                }
            }
        }
        _ => {}
    }
}

/// Extract an app -> channel routing table from an arbitrary Sonar document.
///
/// Every channel is present in the result; channels with no routed apps map
/// to an empty list. App names are de-duplicated, keeping first-seen order.
#[must_use]
pub fn extract_routed_apps(payload: &Value) -> RoutedApps {
    let mut routed: RoutedApps =
        SonarChannel::ALL.into_iter().map(|channel| (channel, Vec::new())).collect();
    let mut entries = Vec::new();
    collect_entries(payload, &mut routed, &mut entries);
    trace!(entries = entries.len(), "Collected routing entries");

    for entry in entries {
        let channel = channel_from(entry);
        if let (Some(name), Some(channel)) = (app_name_from(entry), channel) {
            routed.entry(channel).or_default().push(name);
            continue;
        }

        // Per-role shape: {"role": "game", "audioSessions": [...]}
        if let (Some(channel), Some(Value::Array(sessions))) = (channel, entry.get("audioSessions")) {
            routed.entry(channel).or_default().extend(active_session_names(sessions));
        }
    }

    for names in routed.values_mut() {
        let mut seen = HashSet::new();
        names.retain(|name| seen.insert(name.clone()));
    }

    routed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apps(routed: &RoutedApps, channel: SonarChannel) -> Vec<&str> {
        routed[&channel].iter().map(String::as_str).collect()
    }

    #[test]
    fn test_all_channels_present_for_empty_payload() {
        let routed = extract_routed_apps(&json!({}));

        assert_eq!(routed.len(), 6);
        assert!(routed.values().all(Vec::is_empty));
    }

    #[test]
    fn test_applications_list_with_channel_keys() {
        let payload = json!({
            "applications": [
                {"name": "Discord", "channel": "chatRender"},
                {"processName": "cs2.exe", "routedTo": {"role": "game"}},
                {"appName": "Spotify", "output": "music"},
                {"name": "Orphan"}
            ]
        });

        let routed = extract_routed_apps(&payload);

        assert_eq!(apps(&routed, SonarChannel::ChatRender), ["Discord"]);
        assert_eq!(apps(&routed, SonarChannel::Game), ["cs2.exe"]);
        assert_eq!(apps(&routed, SonarChannel::Media), ["Spotify"]);
        assert!(routed[&SonarChannel::Aux].is_empty());
    }

    #[test]
    fn test_direct_channel_map() {
        let payload = json!({
            "game": ["cs2.exe", "  ", {"displayName": "Valorant"}],
            "chat-capture": ["Discord"]
        });

        let routed = extract_routed_apps(&payload);

        assert_eq!(apps(&routed, SonarChannel::Game), ["cs2.exe", "Valorant"]);
        assert_eq!(apps(&routed, SonarChannel::ChatCapture), ["Discord"]);
    }

    #[test]
    fn test_audio_sessions_shape_filters_inactive() {
        let payload = json!([
            {
                "role": "game",
                "audioSessions": [
                    {"processName": "cs2.exe", "state": "Active", "processId": 4242},
                    {"processName": "idle.exe", "state": "inactive", "processId": 1},
                    {"processName": "System Sounds", "isSystemSound": true},
                    {"processName": "ghost.exe", "processId": 0}
                ]
            },
            {
                "role": "media",
                "audioSessions": [{"processName": "Spotify.exe", "state": "running"}]
            }
        ]);

        let routed = extract_routed_apps(&payload);

        assert_eq!(apps(&routed, SonarChannel::Game), ["cs2.exe"]);
        assert_eq!(apps(&routed, SonarChannel::Media), ["Spotify.exe"]);
    }

    #[test]
    fn test_duplicates_removed_in_first_seen_order() {
        let payload = json!({
            "apps": [
                {"name": "B", "channel": "aux"},
                {"name": "A", "channel": "aux"},
                {"name": "B", "channel": "auxiliary"}
            ],
            "nested": {"routes": [{"name": "A", "channel": "aux"}]}
        });

        let routed = extract_routed_apps(&payload);

        assert_eq!(apps(&routed, SonarChannel::Aux), ["B", "A"]);
    }

    #[test]
    fn test_nested_app_name_object() {
        let payload = json!({
            "items": [{"application": {"name": " Chrome "}, "destination": "MEDIA"}]
        });

        let routed = extract_routed_apps(&payload);

        assert_eq!(apps(&routed, SonarChannel::Media), ["Chrome"]);
    }

    #[test]
    fn test_unrecognized_channel_labels_are_ignored() {
        let payload = json!({"applications": [{"name": "x", "channel": "speakers"}]});

        let routed = extract_routed_apps(&payload);

        assert!(routed.values().all(Vec::is_empty));
    }

    #[test]
    fn test_scalar_payload_is_empty() {
        let routed = extract_routed_apps(&json!("not a routing document"));

        assert!(routed.values().all(Vec::is_empty));
    }
}
