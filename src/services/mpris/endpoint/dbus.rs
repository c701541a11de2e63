use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use futures::{StreamExt, future, stream::BoxStream};
use tracing::debug;
use zbus::{
    Connection, fdo,
    names::InterfaceName,
    zvariant::{ObjectPath, OwnedValue},
};

use super::{
    EndpointConnector, PlaybackEndpoint, PropertiesEndpoint, PropertyBatch, RootEndpoint,
};
use crate::services::mpris::{
    LoopStatus, MPRIS_INTERFACE, MPRIS_OBJECT_PATH, MPRIS_PLAYER_INTERFACE, MediaError,
    MediaPlayer2PlayerProxy, MediaPlayer2Proxy, PlaybackProperties, PlaybackStatus, PlayerId,
    PlayerProperty, RootProperties, TrackMetadata, metadata::value_as_i64,
};

/// Opens MPRIS sub-connections over a shared session bus connection.
#[derive(Clone)]
pub struct DbusConnector {
    connection: Connection,
}

impl DbusConnector {
    /// Create a connector on top of an existing bus connection
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl EndpointConnector for DbusConnector {
    async fn root(&self, player_id: &PlayerId) -> Result<Arc<dyn RootEndpoint>, MediaError> {
        let proxy = MediaPlayer2Proxy::builder(&self.connection)
            .destination(player_id.bus_name().to_string())?
            .path(MPRIS_OBJECT_PATH)?
            .build()
            .await?;

        Ok(Arc::new(DbusRoot { proxy }))
    }

    async fn playback(
        &self,
        player_id: &PlayerId,
    ) -> Result<Arc<dyn PlaybackEndpoint>, MediaError> {
        let proxy = MediaPlayer2PlayerProxy::builder(&self.connection)
            .destination(player_id.bus_name().to_string())?
            .path(MPRIS_OBJECT_PATH)?
            .build()
            .await?;

        Ok(Arc::new(DbusPlayback { proxy }))
    }

    async fn properties(
        &self,
        player_id: &PlayerId,
    ) -> Result<Arc<dyn PropertiesEndpoint>, MediaError> {
        let proxy = fdo::PropertiesProxy::builder(&self.connection)
            .destination(player_id.bus_name().to_string())?
            .path(MPRIS_OBJECT_PATH)?
            .build()
            .await?;

        Ok(Arc::new(DbusProperties {
            player_id: player_id.clone(),
            proxy,
        }))
    }
}

struct DbusRoot {
    proxy: MediaPlayer2Proxy<'static>,
}

#[async_trait]
impl RootEndpoint for DbusRoot {
    async fn load(&self) -> Result<RootProperties, MediaError> {
        let proxy = &self.proxy;

        Ok(RootProperties {
            identity: proxy.identity().await.unwrap_or_default(),
            desktop_entry: proxy.desktop_entry().await.unwrap_or_default(),
            can_quit: proxy.can_quit().await.unwrap_or(false),
            can_raise: proxy.can_raise().await.unwrap_or(false),
            can_set_fullscreen: proxy.can_set_fullscreen().await.unwrap_or(false),
            fullscreen: proxy.fullscreen().await.unwrap_or(false),
            has_track_list: proxy.has_track_list().await.unwrap_or(false),
            supported_mime_types: proxy.supported_mime_types().await.unwrap_or_default(),
            supported_uri_schemes: proxy.supported_uri_schemes().await.unwrap_or_default(),
        })
    }

    async fn set_fullscreen(&self, fullscreen: bool) -> Result<(), MediaError> {
        Ok(self.proxy.set_fullscreen(fullscreen).await?)
    }

    async fn raise(&self) -> Result<(), MediaError> {
        Ok(self.proxy.raise().await?)
    }

    async fn quit(&self) -> Result<(), MediaError> {
        Ok(self.proxy.quit().await?)
    }
}

struct DbusPlayback {
    proxy: MediaPlayer2PlayerProxy<'static>,
}

#[async_trait]
impl PlaybackEndpoint for DbusPlayback {
    async fn load(&self) -> Result<PlaybackProperties, MediaError> {
        let proxy = &self.proxy;
        let defaults = PlaybackProperties::default();

        let metadata = proxy
            .metadata()
            .await
            .ok()
            .and_then(|map| TrackMetadata::from_map(&map));

        Ok(PlaybackProperties {
            playback_status: proxy
                .playback_status()
                .await
                .map(|status| PlaybackStatus::from(status.as_str()))
                .unwrap_or_default(),
            loop_status: proxy
                .loop_status()
                .await
                .map(|status| LoopStatus::from(status.as_str()))
                .unwrap_or_default(),
            rate: proxy.rate().await.unwrap_or(defaults.rate),
            shuffle: proxy.shuffle().await.unwrap_or(false),
            metadata,
            volume: proxy.volume().await.unwrap_or(defaults.volume),
            minimum_rate: proxy.minimum_rate().await.unwrap_or(defaults.minimum_rate),
            maximum_rate: proxy.maximum_rate().await.unwrap_or(defaults.maximum_rate),
            can_go_next: proxy.can_go_next().await.unwrap_or(false),
            can_go_previous: proxy.can_go_previous().await.unwrap_or(false),
            can_play: proxy.can_play().await.unwrap_or(false),
            can_pause: proxy.can_pause().await.unwrap_or(false),
            can_seek: proxy.can_seek().await.unwrap_or(false),
            can_control: proxy.can_control().await.unwrap_or(false),
        })
    }

    async fn next(&self) -> Result<(), MediaError> {
        Ok(self.proxy.next().await?)
    }

    async fn previous(&self) -> Result<(), MediaError> {
        Ok(self.proxy.previous().await?)
    }

    async fn play(&self) -> Result<(), MediaError> {
        Ok(self.proxy.play().await?)
    }

    async fn pause(&self) -> Result<(), MediaError> {
        Ok(self.proxy.pause().await?)
    }

    async fn play_pause(&self) -> Result<(), MediaError> {
        Ok(self.proxy.play_pause().await?)
    }

    async fn stop(&self) -> Result<(), MediaError> {
        Ok(self.proxy.stop().await?)
    }

    async fn seek(&self, offset: i64) -> Result<(), MediaError> {
        Ok(self.proxy.seek(offset).await?)
    }

    async fn set_position(&self, track_id: &str, position: i64) -> Result<(), MediaError> {
        let track_path = ObjectPath::try_from(track_id)
            .map_err(|e| MediaError::ControlFailed(format!("Invalid track id {track_id}: {e}")))?;

        Ok(self.proxy.set_position(&track_path, position).await?)
    }

    async fn open_uri(&self, uri: &str) -> Result<(), MediaError> {
        Ok(self.proxy.open_uri(uri).await?)
    }

    async fn set_volume(&self, volume: f64) -> Result<(), MediaError> {
        Ok(self.proxy.set_volume(volume).await?)
    }

    async fn set_rate(&self, rate: f64) -> Result<(), MediaError> {
        Ok(self.proxy.set_rate(rate).await?)
    }

    async fn set_shuffle(&self, shuffle: bool) -> Result<(), MediaError> {
        Ok(self.proxy.set_shuffle(shuffle).await?)
    }

    async fn set_loop_status(&self, status: LoopStatus) -> Result<(), MediaError> {
        Ok(self.proxy.set_loop_status(status.into()).await?)
    }

    async fn seeked(&self) -> Result<BoxStream<'static, i64>, MediaError> {
        let stream = self.proxy.receive_seeked().await?;

        Ok(stream
            .filter_map(|signal| future::ready(signal.args().ok().map(|args| *args.position())))
            .boxed())
    }
}

struct DbusProperties {
    player_id: PlayerId,
    proxy: fdo::PropertiesProxy<'static>,
}

impl DbusProperties {
    async fn get_player_property(&self, name: &str) -> Result<OwnedValue, MediaError> {
        let interface = InterfaceName::from_static_str_unchecked(MPRIS_PLAYER_INTERFACE);
        Ok(self.proxy.get(interface, name).await?)
    }
}

#[async_trait]
impl PropertiesEndpoint for DbusProperties {
    async fn position(&self) -> Result<i64, MediaError> {
        let value = self.get_player_property("Position").await?;

        value_as_i64(&value).ok_or_else(|| MediaError::InvalidValue {
            property: "Position".to_string(),
            details: format!("expected an integer, got {}", value.value_signature()),
        })
    }

    async fn metadata(&self) -> Result<Option<TrackMetadata>, MediaError> {
        let value = self.get_player_property("Metadata").await?;

        let map = HashMap::<String, OwnedValue>::try_from(value).map_err(|e| {
            MediaError::InvalidValue {
                property: "Metadata".to_string(),
                details: e.to_string(),
            }
        })?;

        Ok(TrackMetadata::from_map(&map))
    }

    async fn changes(&self) -> Result<BoxStream<'static, PropertyBatch>, MediaError> {
        let stream = self.proxy.receive_properties_changed().await?;
        let player_id = self.player_id.clone();

        Ok(stream
            .filter_map(move |signal| {
                let batch = signal.args().ok().and_then(|args| {
                    let interface = args.interface_name().as_str();
                    if interface != MPRIS_INTERFACE && interface != MPRIS_PLAYER_INTERFACE {
                        return None;
                    }

                    let batch: PropertyBatch = args
                        .changed_properties()
                        .iter()
                        .filter_map(|(name, value)| PlayerProperty::from_dbus(name, value))
                        .collect();

                    if batch.is_empty() { None } else { Some(batch) }
                });

                if batch.is_none() {
                    debug!(player = %player_id, "Ignoring PropertiesChanged signal");
                }

                future::ready(batch)
            })
            .boxed())
    }
}
