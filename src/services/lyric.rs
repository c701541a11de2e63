//! Inbound lyric lines from an external helper.
//!
//! The helper calls `UpdateLyric` with a JSON record naming the player it
//! follows. Lines are shown only while that player is the active one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use zbus::{Connection, fdo, interface};

use super::mpris::{ActivePlayerSelector, DisplaySink};

/// Well-known bus name the lyric interface is served under.
pub const LYRIC_BUS_NAME: &str = "org.gnome.Shell.Extensions.MediaControls.Lyric";

/// Object path the lyric interface is served at.
pub const LYRIC_OBJECT_PATH: &str = "/org/gnome/Shell/Extensions/MediaControls/Lyric";

/// Errors raised by the lyric channel
#[derive(thiserror::Error, Debug)]
pub enum LyricError {
    /// The message was not a lyric record
    #[error("Malformed lyric message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),
}

/// One lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lyric {
    /// Text to show; empty hides the lyric
    pub content: String,
    /// Offset into the track in seconds
    #[serde(default)]
    pub time: f64,
    /// Short name of the player the line belongs to, e.g. `spotify`
    #[serde(default)]
    pub sender: String,
}

impl Lyric {
    /// Parse the JSON form sent over D-Bus.
    ///
    /// # Errors
    /// Returns error if `json` is not a lyric record.
    pub fn from_json(json: &str) -> Result<Self, LyricError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Sends lyric lines to the display when they belong to the active player.
pub struct LyricRouter {
    selector: Arc<ActivePlayerSelector>,
    display: Arc<dyn DisplaySink>,
}

impl LyricRouter {
    /// Route against the selector's current pick.
    pub fn new(selector: Arc<ActivePlayerSelector>, display: Arc<dyn DisplaySink>) -> Self {
        Self { selector, display }
    }

    /// Deliver `lyric`. Returns whether the display was updated.
    ///
    /// An empty line always hides the lyric. Any other line is shown only
    /// when the active player's bus name contains the sender, so an empty
    /// sender matches whichever player is active.
    pub fn route(&self, lyric: &Lyric) -> bool {
        if lyric.content.is_empty() {
            self.display.update_lyric(None);
            return true;
        }

        let Some(active) = self.selector.active_id() else {
            debug!(sender = %lyric.sender, "Dropping lyric, no active player");
            return false;
        };

        if lyric.sender.is_empty() {
            debug!(active = %active, "Lyric without sender, showing on the active player");
        } else if !active.bus_name().contains(lyric.sender.as_str()) {
            debug!(sender = %lyric.sender, active = %active, "Dropping lyric from inactive player");
            return false;
        }

        self.display.update_lyric(Some(lyric));
        true
    }
}

/// D-Bus face of the lyric channel.
pub struct LyricService {
    router: Arc<LyricRouter>,
}

impl LyricService {
    /// Serve lines into `router`.
    pub fn new(router: Arc<LyricRouter>) -> Self {
        Self { router }
    }

    /// Claim the lyric bus name on the session bus and export the interface.
    ///
    /// The returned connection keeps the service alive.
    ///
    /// # Errors
    /// Returns error if the session bus is unreachable or the name is taken.
    #[instrument(skip(router))]
    pub async fn serve(router: Arc<LyricRouter>) -> Result<Connection, LyricError> {
        let connection = zbus::connection::Builder::session()?
            .name(LYRIC_BUS_NAME)?
            .serve_at(LYRIC_OBJECT_PATH, Self::new(router))?
            .build()
            .await?;

        info!("Lyric service listening on {LYRIC_BUS_NAME}");
        Ok(connection)
    }
}

#[interface(name = "org.gnome.Shell.Extensions.MediaControls.Lyric")]
impl LyricService {
    async fn update_lyric(&self, current_lyric: &str) -> fdo::Result<()> {
        let lyric = Lyric::from_json(current_lyric)
            .map_err(|e| fdo::Error::InvalidArgs(e.to_string()))?;

        self.router.route(&lyric);
        Ok(())
    }

    async fn like_this_track(&self, liked: bool) {
        info!(liked, "Track like requested");
    }
}
