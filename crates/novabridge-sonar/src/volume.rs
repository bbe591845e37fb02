//! Volume and mute extraction from Sonar volume payloads.
//!
//! Sonar has served at least three shapes from its volume endpoints:
//!
//! - mode keyed: `{"masters": {"classic": {...}}, "devices": {"game": {"classic": {...}}}}`
//! - flat: `{"game": {"Volume": 0.5, "Mute": false}}`, nested under a
//!   `streaming`/`monitoring` slider key in stream mode
//! - collections: `{"masters": [...], "devices": [{"role": "game", "volume": 65}]}`
//!
//! Each extractor tries them in that order and returns `None` when nothing
//! matched.

use novabridge_core::{SonarChannel, SonarMode, StreamerSlider, normalize_volume};
use serde_json::{Map, Value};

/// Keys that may carry a volume level, in priority order.
const VOLUME_KEYS: &[&str] = &["Volume", "volume", "value", "level", "gain", "slider"];

/// Keys that may carry a mute flag, in priority order.
const MUTE_KEYS: &[&str] = &["muted", "isMuted", "Mute", "mute"];

/// Top-level keys of the flat shape.
const FLAT_SHAPE_KEYS: &[&str] =
    &["master", "game", "chatRender", "chatCapture", "media", "aux", "streaming", "monitoring"];

/// Whether a payload looks like a volume document at all.
#[must_use]
pub fn looks_like_volume_payload(payload: &Value) -> bool {
    let Some(map) = payload.as_object() else {
        return false;
    };
    map.contains_key("masters")
        || map.contains_key("devices")
        || FLAT_SHAPE_KEYS.iter().any(|key| map.contains_key(*key))
}

/// Read a volume level from one entry. Accepts `{"value": x}` wrappers.
fn volume_value(item: &Map<String, Value>) -> Option<f64> {
    VOLUME_KEYS.iter().filter_map(|key| item.get(*key)).find_map(|value| match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(nested) => nested.get("value").and_then(Value::as_f64),
        _ => None,
    })
}

/// Read a mute flag from one entry. Accepts booleans, numbers, and
/// `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off` strings.
fn mute_value(item: &Map<String, Value>) -> Option<bool> {
    MUTE_KEYS.iter().filter_map(|key| item.get(*key)).find_map(|value| match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// `masters.<mode>` or `devices.<channel>.<mode>`.
fn mode_keyed_entry<'a>(
    payload: &'a Map<String, Value>,
    channel: SonarChannel,
    mode: SonarMode,
) -> Option<&'a Map<String, Value>> {
    let section = match channel {
        SonarChannel::Master => payload.get("masters")?.as_object()?,
        _ => payload.get("devices")?.as_object()?.get(channel.as_str())?.as_object()?,
    };
    section.get(mode.as_str())?.as_object()
}

/// `<channel>` in classic mode, `<slider>.<channel>` in stream mode.
fn flat_entry<'a>(
    payload: &'a Map<String, Value>,
    channel: SonarChannel,
    mode: SonarMode,
    slider: StreamerSlider,
) -> Option<&'a Map<String, Value>> {
    let container = match mode {
        SonarMode::Stream => payload.get(slider.as_str())?.as_object()?,
        SonarMode::Classic => payload,
    };
    container.get(channel.as_str())?.as_object()
}

/// Lower-cased text of an entry's keys and string values.
fn searchable_text(item: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    for (key, value) in item {
        if let Value::String(text) = value {
            parts.push(text.as_str());
        }
        parts.push(key.as_str());
    }
    parts.join(" ").to_lowercase().replace('-', "_")
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == '/' || c == '_').filter(|token| !token.is_empty())
}

/// Entries of the `devices` then `masters` arrays that mention `channel`.
///
/// Exact token matches come first so that `chat` does not pick up a
/// `chatCapture` entry ahead of the real `chatRender` one.
fn collection_matches(
    payload: &Map<String, Value>,
    channel: SonarChannel,
) -> Vec<&Map<String, Value>> {
    let items: Vec<&Map<String, Value>> = ["devices", "masters"]
        .iter()
        .filter_map(|key| payload.get(*key)?.as_array())
        .flatten()
        .filter_map(Value::as_object)
        .collect();
    let aliases = channel.aliases();

    let (exact, loose): (Vec<_>, Vec<_>) = items
        .into_iter()
        .map(|item| (item, searchable_text(item)))
        .filter(|(_, text)| aliases.iter().any(|alias| text.contains(*alias)))
        .partition(|(_, text)| tokens(text).any(|token| aliases.contains(&token)));

    exact.into_iter().chain(loose).map(|(item, _)| item).collect()
}

fn extract<T>(
    payload: &Value,
    channel: SonarChannel,
    mode: SonarMode,
    slider: StreamerSlider,
    read: impl Fn(&Map<String, Value>) -> Option<T>,
) -> Option<T> {
    let map = payload.as_object()?;

    if let Some(value) = mode_keyed_entry(map, channel, mode).and_then(&read) {
        return Some(value);
    }
    if let Some(value) = flat_entry(map, channel, mode, slider).and_then(&read) {
        return Some(value);
    }
    if let Some(value) = collection_matches(map, channel).into_iter().find_map(&read) {
        return Some(value);
    }

    // Some releases list a single global master without naming it.
    if channel == SonarChannel::Master {
        let first = map.get("masters")?.as_array()?.first()?.as_object()?;
        return read(first);
    }
    None
}

/// Volume of `channel` (0.0 - 1.0) from any known payload shape.
#[must_use]
pub fn extract_channel_volume(
    payload: &Value,
    channel: SonarChannel,
    mode: SonarMode,
    slider: StreamerSlider,
) -> Option<f64> {
    extract(payload, channel, mode, slider, volume_value).map(normalize_volume)
}

/// Mute flag of `channel` from any known payload shape.
#[must_use]
pub fn extract_channel_mute(
    payload: &Value,
    channel: SonarChannel,
    mode: SonarMode,
    slider: StreamerSlider,
) -> Option<bool> {
    extract(payload, channel, mode, slider, mute_value)
}

/// Top-level keys, for error messages.
#[must_use]
pub fn payload_keys(payload: &Value) -> Vec<String> {
    payload.as_object().map(|map| map.keys().cloned().collect()).unwrap_or_default()
}
