//! Fixed per-role contracts for talking to one MPRIS endpoint.
//!
//! A player is reached through three sub-connections: the root interface,
//! the playback interface and generic property access. Each is a trait so
//! the handle logic runs the same against D-Bus and against test doubles.

mod dbus;

pub use dbus::DbusConnector;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{
    LoopStatus, MediaError, PlaybackProperties, PlayerId, PlayerProperty, RootProperties,
    TrackMetadata,
};

/// One `PropertiesChanged` signal, decoded.
pub type PropertyBatch = Vec<PlayerProperty>;

/// `org.mpris.MediaPlayer2` for a single player.
#[async_trait]
pub trait RootEndpoint: Send + Sync {
    /// Read the current root property values.
    async fn load(&self) -> Result<RootProperties, MediaError>;

    /// Write the `Fullscreen` property.
    async fn set_fullscreen(&self, fullscreen: bool) -> Result<(), MediaError>;

    /// Bring the player window to the front.
    async fn raise(&self) -> Result<(), MediaError>;

    /// Ask the player to exit.
    async fn quit(&self) -> Result<(), MediaError>;
}

/// `org.mpris.MediaPlayer2.Player` for a single player.
#[async_trait]
#[allow(missing_docs)]
pub trait PlaybackEndpoint: Send + Sync {
    /// Read the current playback property values.
    async fn load(&self) -> Result<PlaybackProperties, MediaError>;

    async fn next(&self) -> Result<(), MediaError>;
    async fn previous(&self) -> Result<(), MediaError>;
    async fn play(&self) -> Result<(), MediaError>;
    async fn pause(&self) -> Result<(), MediaError>;
    async fn play_pause(&self) -> Result<(), MediaError>;
    async fn stop(&self) -> Result<(), MediaError>;

    /// Relative seek in microseconds.
    async fn seek(&self, offset: i64) -> Result<(), MediaError>;

    /// Absolute seek in microseconds within `track_id`.
    async fn set_position(&self, track_id: &str, position: i64) -> Result<(), MediaError>;

    async fn open_uri(&self, uri: &str) -> Result<(), MediaError>;

    async fn set_volume(&self, volume: f64) -> Result<(), MediaError>;
    async fn set_rate(&self, rate: f64) -> Result<(), MediaError>;
    async fn set_shuffle(&self, shuffle: bool) -> Result<(), MediaError>;
    async fn set_loop_status(&self, status: LoopStatus) -> Result<(), MediaError>;

    /// Positions reported by the `Seeked` signal, in microseconds.
    async fn seeked(&self) -> Result<BoxStream<'static, i64>, MediaError>;
}

/// `org.freedesktop.DBus.Properties` scoped to one player.
#[async_trait]
pub trait PropertiesEndpoint: Send + Sync {
    /// Uncached playback position in microseconds.
    async fn position(&self) -> Result<i64, MediaError>;

    /// Uncached track metadata.
    async fn metadata(&self) -> Result<Option<TrackMetadata>, MediaError>;

    /// Property change batches in the order the player emits them.
    async fn changes(&self) -> Result<BoxStream<'static, PropertyBatch>, MediaError>;
}

/// Opens the three sub-connections for a player.
#[async_trait]
pub trait EndpointConnector: Send + Sync {
    /// Connect to the root interface.
    async fn root(&self, player_id: &PlayerId) -> Result<Arc<dyn RootEndpoint>, MediaError>;

    /// Connect to the playback interface.
    async fn playback(&self, player_id: &PlayerId)
    -> Result<Arc<dyn PlaybackEndpoint>, MediaError>;

    /// Connect to generic property access.
    async fn properties(
        &self,
        player_id: &PlayerId,
    ) -> Result<Arc<dyn PropertiesEndpoint>, MediaError>;
}
