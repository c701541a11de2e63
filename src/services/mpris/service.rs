use std::sync::{Arc, Mutex};

use futures::{Stream, StreamExt, stream::BoxStream};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use zbus::Connection;

use super::{
    ActivePlayerSelector, DbusConnector, DbusPresenceWatcher, MediaError, PlayerHandle,
    PlayerRegistry,
    display::DisplaySink,
    endpoint::EndpointConnector,
    presence::{PresenceEvent, PresenceWatcher},
};
use crate::{
    config::{Config, MediaConfig},
    services::lyric::{LyricRouter, LyricService},
};

/// Player tracking and active player selection, wired together.
///
/// Discovers MPRIS players, keeps the registry in step with the bus,
/// reports the active player to a [`DisplaySink`] and routes lyric lines.
pub struct MprisService {
    registry: Arc<PlayerRegistry>,
    selector: Arc<ActivePlayerSelector>,
    display: Arc<dyn DisplaySink>,
    lyrics: Arc<LyricRouter>,
    media_config: Mutex<MediaConfig>,
    presence_task: Mutex<Option<JoinHandle<()>>>,
    lyric_connection: Mutex<Option<Connection>>,
}

impl MprisService {
    /// Connect to the session bus and start tracking players.
    ///
    /// The lyric interface is served too when enabled; failing to claim its
    /// bus name is logged and does not stop the service.
    ///
    /// # Errors
    /// Returns error if the session bus is unreachable or presence
    /// monitoring cannot be set up.
    #[instrument(skip_all)]
    pub async fn start(config: &Config, display: Arc<dyn DisplaySink>) -> Result<Self, MediaError> {
        let connection = Connection::session().await.map_err(|e| {
            MediaError::InitializationFailed(format!("D-Bus connection failed: {e}"))
        })?;

        let service = Self::with_backends(
            Arc::new(DbusConnector::new(connection.clone())),
            Arc::new(DbusPresenceWatcher::new(connection)),
            display,
            &config.media,
        )
        .await?;

        if config.lyrics.enabled {
            match LyricService::serve(Arc::clone(&service.lyrics)).await {
                Ok(connection) => *lock(&service.lyric_connection) = Some(connection),
                Err(e) => warn!("Lyric service unavailable: {e}"),
            }
        }

        Ok(service)
    }

    /// Start tracking players through the given backends.
    ///
    /// # Errors
    /// Returns error if the presence watcher cannot be subscribed to.
    pub async fn with_backends(
        connector: Arc<dyn EndpointConnector>,
        presence: Arc<dyn PresenceWatcher>,
        display: Arc<dyn DisplaySink>,
        media_config: &MediaConfig,
    ) -> Result<Self, MediaError> {
        display.set_suppressed(media_config.hide_media_notification);

        let selector = Arc::new(ActivePlayerSelector::new(Arc::clone(&display)));
        let registry = PlayerRegistry::new(
            connector,
            Arc::clone(&presence),
            Arc::clone(&selector),
            Arc::clone(&display),
            media_config.blacklist(),
            media_config.poll_settings(),
        );
        let lyrics = Arc::new(LyricRouter::new(
            Arc::clone(&selector),
            Arc::clone(&display),
        ));

        let events = presence.subscribe().await?;
        let presence_task = tokio::spawn(Self::follow_presence(Arc::clone(&registry), events));

        registry.add_running_players().await;
        registry.reselect();

        info!(players = registry.len(), "MPRIS service started");

        Ok(Self {
            registry,
            selector,
            display,
            lyrics,
            media_config: Mutex::new(media_config.clone()),
            presence_task: Mutex::new(Some(presence_task)),
            lyric_connection: Mutex::new(None),
        })
    }

    async fn follow_presence(
        registry: Arc<PlayerRegistry>,
        mut events: BoxStream<'static, PresenceEvent>,
    ) {
        while let Some(event) = events.next().await {
            match event {
                PresenceEvent::Appeared(player_id) => {
                    if registry.reserve(&player_id) {
                        let registry = Arc::clone(&registry);
                        tokio::spawn(async move {
                            registry.complete_add(player_id).await;
                        });
                    }
                }
                PresenceEvent::Vanished(player_id) => {
                    registry.remove_player(&player_id);
                }
            }
        }

        debug!("Presence stream ended");
    }

    /// Valid players in display order.
    pub fn players(&self) -> Vec<Arc<PlayerHandle>> {
        self.registry.snapshot()
    }

    /// Valid players, then every change to that list.
    pub fn players_monitored(&self) -> impl Stream<Item = Vec<Arc<PlayerHandle>>> + Send {
        self.registry.watch()
    }

    /// The active player, if any.
    pub fn active_player(&self) -> Option<Arc<PlayerHandle>> {
        self.selector.active()
    }

    /// The active player, then every change.
    pub fn active_player_monitored(&self) -> impl Stream<Item = Option<Arc<PlayerHandle>>> + Send {
        self.selector.watch()
    }

    /// Router for lyric lines.
    pub fn lyrics(&self) -> Arc<LyricRouter> {
        Arc::clone(&self.lyrics)
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    /// Apply new media settings.
    ///
    /// Suppression is forwarded when it changes, poll settings apply to
    /// players added afterwards, and a changed blacklist reconciles every
    /// player against it.
    #[instrument(skip_all)]
    pub async fn update_config(&self, media_config: &MediaConfig) {
        let previous = std::mem::replace(&mut *lock(&self.media_config), media_config.clone());

        if previous.hide_media_notification != media_config.hide_media_notification {
            self.display
                .set_suppressed(media_config.hide_media_notification);
        }

        if previous.poll_interval_ms != media_config.poll_interval_ms
            || previous.poll_timeout_ms != media_config.poll_timeout_ms
        {
            self.registry.set_poll_settings(media_config.poll_settings());
        }

        if previous.blacklisted_players != media_config.blacklisted_players {
            info!("Blacklist changed, reconciling players");
            self.registry.set_blacklist(media_config.blacklist()).await;
        }
    }

    /// Stop following the bus and release every player.
    ///
    /// Restores the shell's media notification. Safe to call repeatedly.
    pub fn shutdown(&self) {
        if let Some(task) = lock(&self.presence_task).take() {
            task.abort();
        } else {
            return;
        }

        lock(&self.lyric_connection).take();
        self.registry.clear();
        self.display.set_suppressed(false);

        info!("MPRIS service stopped");
    }
}

impl Drop for MprisService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
