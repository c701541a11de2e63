use std::fmt;

/// Well-known bus name prefix shared by every MPRIS player.
pub const MPRIS_BUS_NAME_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Object path every MPRIS player exports its interfaces on.
pub const MPRIS_OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Root MPRIS interface name.
pub const MPRIS_INTERFACE: &str = "org.mpris.MediaPlayer2";

/// Playback MPRIS interface name.
pub const MPRIS_PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Unique identifier for a media player
///
/// Wraps the player's D-Bus bus name, which is unique among live players
/// and stable for the lifetime of the player's session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a PlayerId from a D-Bus bus name
    pub fn from_bus_name(bus_name: &str) -> Self {
        Self(bus_name.to_string())
    }

    /// Get the D-Bus bus name
    pub fn bus_name(&self) -> &str {
        &self.0
    }

    /// Player name without the MPRIS prefix, e.g. `spotify` for
    /// `org.mpris.MediaPlayer2.spotify`.
    pub fn short_name(&self) -> &str {
        self.0.strip_prefix(MPRIS_BUS_NAME_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a bus name follows the MPRIS naming convention.
pub fn is_mpris_bus_name(name: &str) -> bool {
    name.len() > MPRIS_BUS_NAME_PREFIX.len() && name.starts_with(MPRIS_BUS_NAME_PREFIX)
}

/// Current playback state of a media player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Player is currently playing
    Playing,

    /// Player is paused
    Paused,

    /// Player is stopped
    #[default]
    Stopped,
}

impl From<&str> for PlaybackStatus {
    fn from(status: &str) -> Self {
        match status {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

impl From<PlaybackStatus> for &'static str {
    fn from(status: PlaybackStatus) -> Self {
        match status {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).into())
    }
}

/// Loop mode for track or playlist repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopStatus {
    /// No looping
    #[default]
    None,

    /// Loop current track
    Track,

    /// Loop entire playlist
    Playlist,
}

impl LoopStatus {
    /// Next mode in the None -> Track -> Playlist -> None cycle.
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Track,
            Self::Track => Self::Playlist,
            Self::Playlist => Self::None,
        }
    }
}

impl From<&str> for LoopStatus {
    fn from(status: &str) -> Self {
        match status {
            "Track" => Self::Track,
            "Playlist" => Self::Playlist,
            _ => Self::None,
        }
    }
}

impl From<LoopStatus> for &'static str {
    fn from(status: LoopStatus) -> Self {
        match status {
            LoopStatus::None => "None",
            LoopStatus::Track => "Track",
            LoopStatus::Playlist => "Playlist",
        }
    }
}

impl fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).into())
    }
}
