use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::services::mpris::{Blacklist, PollSettings};

/// Player tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MediaConfig {
    /// Application ids of players to ignore, e.g. `firefox` or `spotify.desktop`.
    /// Matched against a player's desktop entry and identity, ignoring case.
    pub blacklisted_players: Vec<String>,

    /// Hide the shell's built-in media notification while running.
    pub hide_media_notification: bool,

    /// Delay between start-up polls of a new player, in milliseconds.
    pub poll_interval_ms: u64,

    /// How long to keep polling a new player for its first track, in milliseconds.
    pub poll_timeout_ms: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            blacklisted_players: Vec::new(),
            hide_media_notification: true,
            poll_interval_ms: 250,
            poll_timeout_ms: 5000,
        }
    }
}

impl MediaConfig {
    /// Blacklist built from `blacklisted_players`.
    pub fn blacklist(&self) -> Blacklist {
        Blacklist::new(&self.blacklisted_players)
    }

    /// Poll budget built from the interval and timeout.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::from_timeout(
            Duration::from_millis(self.poll_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}
