use std::{collections::HashMap, time::Duration};

use zbus::zvariant::{OwnedValue, Value};

/// Metadata for the track a player is currently presenting.
///
/// Every field is optional: players routinely omit keys, and some publish
/// an empty map until their first track is fully loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    /// Track title (`xesam:title`)
    pub title: Option<String>,

    /// Track artists (`xesam:artist`)
    pub artists: Vec<String>,

    /// Album name (`xesam:album`)
    pub album: Option<String>,

    /// Artwork reference (`mpris:artUrl`)
    pub art_url: Option<String>,

    /// Track length (`mpris:length`)
    pub length: Option<Duration>,

    /// MPRIS track identifier (`mpris:trackid`)
    pub track_id: Option<String>,
}

impl TrackMetadata {
    /// Decode an MPRIS metadata map.
    ///
    /// Returns `None` for an empty map so that "no metadata yet" stays
    /// distinguishable from "metadata without a title".
    pub fn from_map(metadata: &HashMap<String, OwnedValue>) -> Option<Self> {
        if metadata.is_empty() {
            return None;
        }

        let mut track = Self::default();

        if let Some(title) = metadata.get("xesam:title") {
            track.title = value_as_string(title);
        }

        if let Some(artist) = metadata.get("xesam:artist") {
            track.artists = value_as_strings(artist);
        }

        if let Some(album) = metadata.get("xesam:album") {
            track.album = value_as_string(album);
        }

        if let Some(art_url) = metadata.get("mpris:artUrl") {
            track.art_url = value_as_string(art_url).filter(|url| !url.is_empty());
        }

        if let Some(length) = metadata.get("mpris:length") {
            track.length = value_as_i64(length)
                .filter(|micros| *micros > 0)
                .map(|micros| Duration::from_micros(micros.unsigned_abs()));
        }

        if let Some(track_id) = metadata.get("mpris:trackid") {
            track.track_id = value_as_string(track_id);
        }

        Some(track)
    }

    /// Decode metadata carried inside a `PropertiesChanged` value.
    pub fn from_value(value: &Value<'_>) -> Option<Self> {
        let owned = value.try_to_owned().ok()?;
        let map = HashMap::<String, OwnedValue>::try_from(owned).ok()?;
        Self::from_map(&map)
    }

    /// Whether the track carries a non-empty title.
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|title| !title.is_empty())
    }

    /// Artists joined for display.
    pub fn artist_line(&self) -> Option<String> {
        if self.artists.is_empty() {
            None
        } else {
            Some(self.artists.join(", "))
        }
    }

    /// Track length in microseconds, or 0 when unknown.
    pub fn length_micros(&self) -> i64 {
        self.length
            .map(|length| i64::try_from(length.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

pub(crate) fn value_as_string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::ObjectPath(path) => Some(path.as_str().to_string()),
        Value::Value(inner) => value_as_string(inner),
        _ => None,
    }
}

pub(crate) fn value_as_strings(value: &Value<'_>) -> Vec<String> {
    match value {
        Value::Array(array) => array.iter().filter_map(value_as_string).collect(),
        Value::Value(inner) => value_as_strings(inner),
        other => value_as_string(other).into_iter().collect(),
    }
}

pub(crate) fn value_as_i64(value: &Value<'_>) -> Option<i64> {
    match value {
        Value::I64(v) => Some(*v),
        Value::U64(v) => i64::try_from(*v).ok(),
        Value::I32(v) => Some(i64::from(*v)),
        Value::U32(v) => Some(i64::from(*v)),
        Value::I16(v) => Some(i64::from(*v)),
        Value::U16(v) => Some(i64::from(*v)),
        Value::U8(v) => Some(i64::from(*v)),
        Value::F64(v) => Some(*v as i64),
        Value::Value(inner) => value_as_i64(inner),
        _ => None,
    }
}

pub(crate) fn value_as_f64(value: &Value<'_>) -> Option<f64> {
    match value {
        Value::F64(v) => Some(*v),
        Value::Value(inner) => value_as_f64(inner),
        other => value_as_i64(other).map(|v| v as f64),
    }
}

pub(crate) fn value_as_bool(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(v) => Some(*v),
        Value::Value(inner) => value_as_bool(inner),
        _ => None,
    }
}
