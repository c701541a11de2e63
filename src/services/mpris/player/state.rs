use crate::services::mpris::{PlaybackProperties, PlayerProperty, RootProperties};

/// Cached view of everything a player has reported so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    /// Root interface values
    pub root: RootProperties,
    /// Playback interface values
    pub playback: PlaybackProperties,
    /// Last known position in microseconds
    pub position: i64,
}

impl PlayerState {
    /// Whether the cached values are insufficient to show the player.
    ///
    /// A player needs a name (identity or desktop entry) and a titled track.
    pub fn is_invalid(&self) -> bool {
        let has_name = !self.root.identity.is_empty() || !self.root.desktop_entry.is_empty();
        let has_title = self
            .playback
            .metadata
            .as_ref()
            .is_some_and(|metadata| metadata.has_title());

        !has_name || !has_title
    }

    /// Fold one change into the cache.
    pub fn apply(&mut self, change: &PlayerProperty) {
        let root = &mut self.root;
        let playback = &mut self.playback;

        match change {
            PlayerProperty::PlaybackStatus(v) => playback.playback_status = *v,
            PlayerProperty::LoopStatus(v) => playback.loop_status = *v,
            PlayerProperty::Rate(v) => playback.rate = *v,
            PlayerProperty::Shuffle(v) => playback.shuffle = *v,
            PlayerProperty::Metadata(v) => playback.metadata = v.clone(),
            PlayerProperty::Volume(v) => playback.volume = *v,
            PlayerProperty::Position(v) => self.position = *v,
            PlayerProperty::MinimumRate(v) => playback.minimum_rate = *v,
            PlayerProperty::MaximumRate(v) => playback.maximum_rate = *v,
            PlayerProperty::CanGoNext(v) => playback.can_go_next = *v,
            PlayerProperty::CanGoPrevious(v) => playback.can_go_previous = *v,
            PlayerProperty::CanPlay(v) => playback.can_play = *v,
            PlayerProperty::CanPause(v) => playback.can_pause = *v,
            PlayerProperty::CanSeek(v) => playback.can_seek = *v,
            PlayerProperty::CanControl(v) => playback.can_control = *v,
            PlayerProperty::CanQuit(v) => root.can_quit = *v,
            PlayerProperty::CanRaise(v) => root.can_raise = *v,
            PlayerProperty::CanSetFullscreen(v) => root.can_set_fullscreen = *v,
            PlayerProperty::Fullscreen(v) => root.fullscreen = *v,
            PlayerProperty::HasTrackList(v) => root.has_track_list = *v,
            PlayerProperty::Identity(v) => root.identity = v.clone(),
            PlayerProperty::DesktopEntry(v) => root.desktop_entry = v.clone(),
            PlayerProperty::SupportedMimeTypes(v) => root.supported_mime_types = v.clone(),
            PlayerProperty::SupportedUriSchemes(v) => root.supported_uri_schemes = v.clone(),
            PlayerProperty::IsPinned(_) | PlayerProperty::IsInvalid(_) => {}
        }
    }
}
