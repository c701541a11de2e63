use std::sync::Arc;

use bitflags::bitflags;
use tracing::info;

use super::PlayerHandle;
use crate::services::lyric::Lyric;

bitflags! {
    /// Parts of the media widget that need redrawing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WidgetFlags: u32 {
        /// Panel player icon.
        const PLAYER_ICON = 1 << 0;
        /// Panel track label.
        const LABEL = 1 << 1;
        /// Panel playback buttons.
        const CONTROLS = 1 << 2;
        /// Menu player switcher.
        const MENU_PLAYERS = 1 << 3;
        /// Menu cover art.
        const MENU_IMAGE = 1 << 4;
        /// Menu title and artist.
        const MENU_LABELS = 1 << 5;
        /// Menu position slider.
        const MENU_SLIDER = 1 << 6;
        /// Menu playback buttons.
        const MENU_CONTROLS = 1 << 7;
    }
}

/// Receiver of everything the engine wants the user interface to show.
///
/// Calls arrive from listener dispatch and from the presence loop. An
/// implementation may pin or unpin the player it is handed, which reselects
/// before the call returns. It must not add or remove players synchronously.
pub trait DisplaySink: Send + Sync {
    /// Replace the displayed player.
    fn display_player(&self, player: &Arc<PlayerHandle>);

    /// Tear down whatever is displayed. Must tolerate repeated calls.
    fn clear_display(&self);

    /// Refresh parts of the currently displayed player.
    fn update_display(&self, flags: WidgetFlags);

    /// Show a lyric line, or hide the lyric when `None`.
    fn update_lyric(&self, lyric: Option<&Lyric>);

    /// Hide or restore the shell's own media notification.
    fn set_suppressed(&self, suppressed: bool);
}

/// Sink that only logs, used when no shell is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDisplay;

impl DisplaySink for TracingDisplay {
    fn display_player(&self, player: &Arc<PlayerHandle>) {
        let metadata = player.metadata().unwrap_or_default();
        info!(
            player = %player.id(),
            name = %player.display_name(),
            status = %player.playback_status(),
            title = metadata.title.as_deref().unwrap_or_default(),
            artist = %metadata.artist_line().unwrap_or_default(),
            "Displaying player"
        );
    }

    fn clear_display(&self) {
        info!("Clearing display");
    }

    fn update_display(&self, flags: WidgetFlags) {
        info!(?flags, "Updating display");
    }

    fn update_lyric(&self, lyric: Option<&Lyric>) {
        match lyric {
            Some(lyric) => info!(time = lyric.time, sender = %lyric.sender, "Lyric: {}", lyric.content),
            None => info!("Lyric cleared"),
        }
    }

    fn set_suppressed(&self, suppressed: bool) {
        info!(suppressed, "Shell media notification suppression changed");
    }
}
