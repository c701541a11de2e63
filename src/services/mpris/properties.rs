use zbus::zvariant::Value;

use super::{
    LoopStatus, PlaybackStatus, TrackMetadata,
    metadata::{value_as_bool, value_as_f64, value_as_i64, value_as_string, value_as_strings},
};

/// Name of a property listeners can subscribe to.
///
/// Covers every MPRIS property a handle caches plus the two synthetic
/// properties maintained by the handle itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PropertyName {
    PlaybackStatus,
    LoopStatus,
    Rate,
    Shuffle,
    Metadata,
    Volume,
    Position,
    MinimumRate,
    MaximumRate,
    CanGoNext,
    CanGoPrevious,
    CanPlay,
    CanPause,
    CanSeek,
    CanControl,
    CanQuit,
    CanRaise,
    CanSetFullscreen,
    Fullscreen,
    HasTrackList,
    Identity,
    DesktopEntry,
    SupportedMimeTypes,
    SupportedUriSchemes,
    /// User pin override toggled
    IsPinned,
    /// Validity re-evaluated
    IsInvalid,
}

impl PropertyName {
    /// Map a D-Bus property name onto a known property.
    pub fn from_dbus(name: &str) -> Option<Self> {
        let property = match name {
            "PlaybackStatus" => Self::PlaybackStatus,
            "LoopStatus" => Self::LoopStatus,
            "Rate" => Self::Rate,
            "Shuffle" => Self::Shuffle,
            "Metadata" => Self::Metadata,
            "Volume" => Self::Volume,
            "Position" => Self::Position,
            "MinimumRate" => Self::MinimumRate,
            "MaximumRate" => Self::MaximumRate,
            "CanGoNext" => Self::CanGoNext,
            "CanGoPrevious" => Self::CanGoPrevious,
            "CanPlay" => Self::CanPlay,
            "CanPause" => Self::CanPause,
            "CanSeek" => Self::CanSeek,
            "CanControl" => Self::CanControl,
            "CanQuit" => Self::CanQuit,
            "CanRaise" => Self::CanRaise,
            "CanSetFullscreen" => Self::CanSetFullscreen,
            "Fullscreen" => Self::Fullscreen,
            "HasTrackList" => Self::HasTrackList,
            "Identity" => Self::Identity,
            "DesktopEntry" => Self::DesktopEntry,
            "SupportedMimeTypes" => Self::SupportedMimeTypes,
            "SupportedUriSchemes" => Self::SupportedUriSchemes,
            _ => return None,
        };

        Some(property)
    }
}

/// A single property change with its typed value.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum PlayerProperty {
    PlaybackStatus(PlaybackStatus),
    LoopStatus(LoopStatus),
    Rate(f64),
    Shuffle(bool),
    Metadata(Option<TrackMetadata>),
    Volume(f64),
    /// Playback position in microseconds
    Position(i64),
    MinimumRate(f64),
    MaximumRate(f64),
    CanGoNext(bool),
    CanGoPrevious(bool),
    CanPlay(bool),
    CanPause(bool),
    CanSeek(bool),
    CanControl(bool),
    CanQuit(bool),
    CanRaise(bool),
    CanSetFullscreen(bool),
    Fullscreen(bool),
    HasTrackList(bool),
    Identity(String),
    DesktopEntry(String),
    SupportedMimeTypes(Vec<String>),
    SupportedUriSchemes(Vec<String>),
    IsPinned(bool),
    IsInvalid(bool),
}

impl PlayerProperty {
    /// The name listeners subscribe to for this change.
    pub fn name(&self) -> PropertyName {
        match self {
            Self::PlaybackStatus(_) => PropertyName::PlaybackStatus,
            Self::LoopStatus(_) => PropertyName::LoopStatus,
            Self::Rate(_) => PropertyName::Rate,
            Self::Shuffle(_) => PropertyName::Shuffle,
            Self::Metadata(_) => PropertyName::Metadata,
            Self::Volume(_) => PropertyName::Volume,
            Self::Position(_) => PropertyName::Position,
            Self::MinimumRate(_) => PropertyName::MinimumRate,
            Self::MaximumRate(_) => PropertyName::MaximumRate,
            Self::CanGoNext(_) => PropertyName::CanGoNext,
            Self::CanGoPrevious(_) => PropertyName::CanGoPrevious,
            Self::CanPlay(_) => PropertyName::CanPlay,
            Self::CanPause(_) => PropertyName::CanPause,
            Self::CanSeek(_) => PropertyName::CanSeek,
            Self::CanControl(_) => PropertyName::CanControl,
            Self::CanQuit(_) => PropertyName::CanQuit,
            Self::CanRaise(_) => PropertyName::CanRaise,
            Self::CanSetFullscreen(_) => PropertyName::CanSetFullscreen,
            Self::Fullscreen(_) => PropertyName::Fullscreen,
            Self::HasTrackList(_) => PropertyName::HasTrackList,
            Self::Identity(_) => PropertyName::Identity,
            Self::DesktopEntry(_) => PropertyName::DesktopEntry,
            Self::SupportedMimeTypes(_) => PropertyName::SupportedMimeTypes,
            Self::SupportedUriSchemes(_) => PropertyName::SupportedUriSchemes,
            Self::IsPinned(_) => PropertyName::IsPinned,
            Self::IsInvalid(_) => PropertyName::IsInvalid,
        }
    }

    /// Decode one entry of a `PropertiesChanged` signal.
    ///
    /// Returns `None` for unknown properties or values of the wrong type.
    pub fn from_dbus(name: &str, value: &Value<'_>) -> Option<Self> {
        let property = match PropertyName::from_dbus(name)? {
            PropertyName::PlaybackStatus => {
                Self::PlaybackStatus(PlaybackStatus::from(value_as_string(value)?.as_str()))
            }
            PropertyName::LoopStatus => {
                Self::LoopStatus(LoopStatus::from(value_as_string(value)?.as_str()))
            }
            PropertyName::Rate => Self::Rate(value_as_f64(value)?),
            PropertyName::Shuffle => Self::Shuffle(value_as_bool(value)?),
            PropertyName::Metadata => Self::Metadata(TrackMetadata::from_value(value)),
            PropertyName::Volume => Self::Volume(value_as_f64(value)?),
            PropertyName::Position => Self::Position(value_as_i64(value)?),
            PropertyName::MinimumRate => Self::MinimumRate(value_as_f64(value)?),
            PropertyName::MaximumRate => Self::MaximumRate(value_as_f64(value)?),
            PropertyName::CanGoNext => Self::CanGoNext(value_as_bool(value)?),
            PropertyName::CanGoPrevious => Self::CanGoPrevious(value_as_bool(value)?),
            PropertyName::CanPlay => Self::CanPlay(value_as_bool(value)?),
            PropertyName::CanPause => Self::CanPause(value_as_bool(value)?),
            PropertyName::CanSeek => Self::CanSeek(value_as_bool(value)?),
            PropertyName::CanControl => Self::CanControl(value_as_bool(value)?),
            PropertyName::CanQuit => Self::CanQuit(value_as_bool(value)?),
            PropertyName::CanRaise => Self::CanRaise(value_as_bool(value)?),
            PropertyName::CanSetFullscreen => Self::CanSetFullscreen(value_as_bool(value)?),
            PropertyName::Fullscreen => Self::Fullscreen(value_as_bool(value)?),
            PropertyName::HasTrackList => Self::HasTrackList(value_as_bool(value)?),
            PropertyName::Identity => Self::Identity(value_as_string(value)?),
            PropertyName::DesktopEntry => Self::DesktopEntry(value_as_string(value)?),
            PropertyName::SupportedMimeTypes => Self::SupportedMimeTypes(value_as_strings(value)),
            PropertyName::SupportedUriSchemes => {
                Self::SupportedUriSchemes(value_as_strings(value))
            }
            PropertyName::IsPinned | PropertyName::IsInvalid => return None,
        };

        Some(property)
    }
}

/// Snapshot of the `org.mpris.MediaPlayer2` interface properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootProperties {
    /// Human-readable player name
    pub identity: String,
    /// Desktop entry basename, without `.desktop`
    pub desktop_entry: String,
    /// Whether `Quit` is supported
    pub can_quit: bool,
    /// Whether `Raise` is supported
    pub can_raise: bool,
    /// Whether fullscreen can be toggled
    pub can_set_fullscreen: bool,
    /// Whether the player is fullscreen
    pub fullscreen: bool,
    /// Whether the player exposes a track list
    pub has_track_list: bool,
    /// MIME types the player can open
    pub supported_mime_types: Vec<String>,
    /// URI schemes the player can open
    pub supported_uri_schemes: Vec<String>,
}

/// Snapshot of the `org.mpris.MediaPlayer2.Player` interface properties.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackProperties {
    /// Playing, paused or stopped
    pub playback_status: PlaybackStatus,
    /// Current loop mode
    pub loop_status: LoopStatus,
    /// Playback rate, 1.0 being normal speed
    pub rate: f64,
    /// Whether shuffle is on
    pub shuffle: bool,
    /// Current track metadata, if the player published any
    pub metadata: Option<TrackMetadata>,
    /// Volume level
    pub volume: f64,
    /// Lowest supported rate
    pub minimum_rate: f64,
    /// Highest supported rate
    pub maximum_rate: f64,
    /// Whether `Next` is supported
    pub can_go_next: bool,
    /// Whether `Previous` is supported
    pub can_go_previous: bool,
    /// Whether `Play` is supported
    pub can_play: bool,
    /// Whether `Pause` is supported
    pub can_pause: bool,
    /// Whether seeking is supported
    pub can_seek: bool,
    /// Whether the player accepts control at all
    pub can_control: bool,
}

impl Default for PlaybackProperties {
    fn default() -> Self {
        Self {
            playback_status: PlaybackStatus::Stopped,
            loop_status: LoopStatus::None,
            rate: 1.0,
            shuffle: false,
            metadata: None,
            volume: 1.0,
            minimum_rate: 1.0,
            maximum_rate: 1.0,
            can_go_next: false,
            can_go_previous: false,
            can_play: false,
            can_pause: false,
            can_seek: false,
            can_control: false,
        }
    }
}
