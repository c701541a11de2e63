/// Per-handle property listeners
pub mod listeners;
/// Start-up poll for late-publishing players
pub mod polling;
/// Cached player state
pub mod state;

use std::sync::{
    Arc, Mutex, OnceLock, RwLock,
    atomic::{AtomicBool, Ordering},
};

use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

pub use listeners::{PropertyChangeBus, Subscription};
pub use polling::PollSettings;
pub use state::PlayerState;

use polling::PollTask;

use super::{
    LoopStatus, MediaError, PlaybackStatus, PlayerId, PlayerProperty, PropertyName, TrackMetadata,
    endpoint::{
        EndpointConnector, PlaybackEndpoint, PropertiesEndpoint, PropertyBatch, RootEndpoint,
    },
};

struct Endpoints {
    root: Arc<dyn RootEndpoint>,
    playback: Arc<dyn PlaybackEndpoint>,
    properties: Arc<dyn PropertiesEndpoint>,
}

/// Live view of one MPRIS player.
///
/// A handle caches the player's properties, keeps them current from change
/// signals, and republishes every change on its [`PropertyChangeBus`]. It also
/// carries two flags the player itself knows nothing about: the user pin and
/// the validity verdict.
pub struct PlayerHandle {
    id: PlayerId,
    poll_settings: PollSettings,

    pinned: AtomicBool,
    invalid: AtomicBool,
    initializing: AtomicBool,
    destroyed: AtomicBool,

    state: RwLock<PlayerState>,
    listeners: PropertyChangeBus,
    endpoints: OnceLock<Endpoints>,

    poll: Mutex<Option<PollTask>>,
    signals: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerHandle {
    /// Create an unconnected handle. It stays invalid until initialized.
    pub fn new(id: PlayerId, poll_settings: PollSettings) -> Arc<Self> {
        Arc::new(Self {
            id,
            poll_settings,
            pinned: AtomicBool::new(false),
            invalid: AtomicBool::new(true),
            initializing: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            state: RwLock::new(PlayerState::default()),
            listeners: PropertyChangeBus::default(),
            endpoints: OnceLock::new(),
            poll: Mutex::new(None),
            signals: Mutex::new(None),
        })
    }

    /// Connect the three sub-connections and start tracking the player.
    ///
    /// The sub-connections are opened concurrently and the first failure
    /// aborts the whole initialization. On success the cache is seeded,
    /// validity is evaluated once and the start-up poll begins.
    ///
    /// # Errors
    /// Returns the first sub-connection error, or
    /// [`MediaError::AlreadyInitialized`] on a second call.
    #[instrument(skip(self, connector), fields(player = %self.id))]
    pub async fn initialize(
        self: &Arc<Self>,
        connector: &dyn EndpointConnector,
    ) -> Result<(), MediaError> {
        if self.initializing.swap(true, Ordering::SeqCst) {
            return Err(MediaError::AlreadyInitialized(self.id.clone()));
        }

        let id = &self.id;
        let ((root, root_props), (playback, playback_props), (properties, changes)) = tokio::try_join!(
            async {
                let root = connector.root(id).await?;
                let props = root.load().await?;
                Ok::<_, MediaError>((root, props))
            },
            async {
                let playback = connector.playback(id).await?;
                let props = playback.load().await?;
                Ok::<_, MediaError>((playback, props))
            },
            async {
                let properties = connector.properties(id).await?;
                let changes = properties.changes().await?;
                Ok::<_, MediaError>((properties, changes))
            },
        )?;

        let seeked = match playback.seeked().await {
            Ok(seeked) => Some(seeked),
            Err(e) => {
                debug!("Seeked signal unavailable: {e}");
                None
            }
        };

        {
            let mut state = write(&self.state);
            state.root = root_props;
            state.playback = playback_props;
        }

        let _ = self.endpoints.set(Endpoints {
            root,
            playback,
            properties: Arc::clone(&properties),
        });

        self.watch_validity();
        self.spawn_signal_task(changes, seeked);
        self.validate();
        self.start_polling(properties);

        debug!("Player initialized");
        Ok(())
    }

    fn watch_validity(self: &Arc<Self>) {
        for property in [
            PropertyName::Metadata,
            PropertyName::Identity,
            PropertyName::DesktopEntry,
        ] {
            let weak = Arc::downgrade(self);
            self.listeners.subscribe(property, move |_| {
                if let Some(player) = weak.upgrade() {
                    player.validate();
                }
            });
        }
    }

    fn spawn_signal_task(
        self: &Arc<Self>,
        changes: BoxStream<'static, PropertyBatch>,
        seeked: Option<BoxStream<'static, i64>>,
    ) {
        let seeked = seeked
            .unwrap_or_else(|| stream::empty().boxed())
            .map(|position| vec![PlayerProperty::Position(position)]);
        let mut batches = stream::select(changes, seeked);
        let weak = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            while let Some(batch) = batches.next().await {
                let Some(player) = weak.upgrade() else {
                    return;
                };
                player.apply_changes(batch);
            }
        });

        *lock(&self.signals) = Some(task);
    }

    fn start_polling(self: &Arc<Self>, properties: Arc<dyn PropertiesEndpoint>) {
        let task = PollTask::start(
            Arc::downgrade(self),
            self.id.clone(),
            properties,
            self.poll_settings,
        );
        *lock(&self.poll) = Some(task);
    }

    /// Fold a batch of changes into the cache and notify listeners.
    ///
    /// Each change is applied before its listeners run, so a listener reading
    /// back through the handle sees the new value.
    pub fn apply_changes(&self, batch: PropertyBatch) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }

        for change in batch {
            write(&self.state).apply(&change);
            self.listeners.emit(&change);
        }
    }

    pub(crate) fn apply_initial_poll(&self, position: i64, metadata: Option<TrackMetadata>) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }

        {
            let mut state = write(&self.state);
            state.position = position;
            state.playback.metadata = metadata.clone();
        }

        self.listeners.emit(&PlayerProperty::Metadata(metadata));
    }

    /// Re-evaluate validity and announce the verdict.
    ///
    /// Listeners of [`PropertyName::IsInvalid`] are notified every time, even
    /// when the verdict did not change.
    pub fn validate(&self) {
        let invalid = read(&self.state).is_invalid();
        self.invalid.store(invalid, Ordering::SeqCst);
        self.listeners.emit(&PlayerProperty::IsInvalid(invalid));
    }

    /// Mark the player as the user's choice.
    pub fn pin(&self) {
        self.pinned.store(true, Ordering::SeqCst);
        self.listeners.emit(&PlayerProperty::IsPinned(true));
    }

    /// Clear the user pin.
    pub fn unpin(&self) {
        self.pinned.store(false, Ordering::SeqCst);
        self.listeners.emit(&PlayerProperty::IsPinned(false));
    }

    /// Register a listener for one property.
    pub fn on_property_changed<F>(&self, property: PropertyName, callback: F) -> Subscription
    where
        F: Fn(&PlayerProperty) + Send + Sync + 'static,
    {
        self.listeners.subscribe(property, callback)
    }

    /// Stop background work and drop every listener. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(poll) = lock(&self.poll).take() {
            poll.cancel();
        }
        if let Some(signals) = lock(&self.signals).take() {
            signals.abort();
        }
        self.listeners.clear();

        debug!(player = %self.id, "Player handle destroyed");
    }

    /// Whether the start-up poll is still running.
    pub fn is_polling(&self) -> bool {
        lock(&self.poll)
            .as_ref()
            .is_some_and(|poll| !poll.is_finished())
    }

    /// Player identifier, derived from its bus name.
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Bus name the player owns.
    pub fn bus_name(&self) -> &str {
        self.id.bus_name()
    }

    /// Whether the user pinned this player.
    pub fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::SeqCst)
    }

    /// Whether the player lacks the data needed to be shown.
    pub fn is_invalid(&self) -> bool {
        self.invalid.load(Ordering::SeqCst)
    }

    /// Copy of the whole cached state.
    pub fn state(&self) -> PlayerState {
        read(&self.state).clone()
    }

    /// Name suitable for display: identity, then desktop entry, then bus name.
    pub fn display_name(&self) -> String {
        let state = read(&self.state);
        if !state.root.identity.is_empty() {
            state.root.identity.clone()
        } else if !state.root.desktop_entry.is_empty() {
            state.root.desktop_entry.clone()
        } else {
            self.id.short_name().to_string()
        }
    }
}

/// Cached property accessors.
#[allow(missing_docs)]
impl PlayerHandle {
    pub fn identity(&self) -> String {
        read(&self.state).root.identity.clone()
    }

    pub fn desktop_entry(&self) -> String {
        read(&self.state).root.desktop_entry.clone()
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        read(&self.state).playback.playback_status
    }

    pub fn loop_status(&self) -> LoopStatus {
        read(&self.state).playback.loop_status
    }

    pub fn rate(&self) -> f64 {
        read(&self.state).playback.rate
    }

    pub fn shuffle(&self) -> bool {
        read(&self.state).playback.shuffle
    }

    pub fn metadata(&self) -> Option<TrackMetadata> {
        read(&self.state).playback.metadata.clone()
    }

    pub fn volume(&self) -> f64 {
        read(&self.state).playback.volume
    }

    pub fn minimum_rate(&self) -> f64 {
        read(&self.state).playback.minimum_rate
    }

    pub fn maximum_rate(&self) -> f64 {
        read(&self.state).playback.maximum_rate
    }

    pub fn can_go_next(&self) -> bool {
        read(&self.state).playback.can_go_next
    }

    pub fn can_go_previous(&self) -> bool {
        read(&self.state).playback.can_go_previous
    }

    pub fn can_play(&self) -> bool {
        read(&self.state).playback.can_play
    }

    pub fn can_pause(&self) -> bool {
        read(&self.state).playback.can_pause
    }

    pub fn can_seek(&self) -> bool {
        read(&self.state).playback.can_seek
    }

    pub fn can_control(&self) -> bool {
        read(&self.state).playback.can_control
    }

    pub fn can_quit(&self) -> bool {
        read(&self.state).root.can_quit
    }

    pub fn can_raise(&self) -> bool {
        read(&self.state).root.can_raise
    }

    pub fn can_set_fullscreen(&self) -> bool {
        read(&self.state).root.can_set_fullscreen
    }

    pub fn fullscreen(&self) -> bool {
        read(&self.state).root.fullscreen
    }

    pub fn has_track_list(&self) -> bool {
        read(&self.state).root.has_track_list
    }

    pub fn supported_mime_types(&self) -> Vec<String> {
        read(&self.state).root.supported_mime_types.clone()
    }

    pub fn supported_uri_schemes(&self) -> Vec<String> {
        read(&self.state).root.supported_uri_schemes.clone()
    }

    /// Last position seen through signals or polling, in microseconds.
    pub fn cached_position(&self) -> i64 {
        read(&self.state).position
    }

    /// Ask the player for its position right now.
    ///
    /// Returns `None` when the handle is not connected or the query fails.
    pub async fn position(&self) -> Option<i64> {
        let endpoints = self.endpoints().ok()?;

        match endpoints.properties.position().await {
            Ok(position) => Some(position),
            Err(e) => {
                debug!(player = %self.id, "Position query failed: {e}");
                None
            }
        }
    }
}

/// Player commands. Failures are logged and otherwise ignored.
#[allow(missing_docs)]
impl PlayerHandle {
    pub async fn next(&self) {
        let result = async { self.endpoints()?.playback.next().await }.await;
        self.report("Next", result);
    }

    pub async fn previous(&self) {
        let result = async { self.endpoints()?.playback.previous().await }.await;
        self.report("Previous", result);
    }

    pub async fn play(&self) {
        let result = async { self.endpoints()?.playback.play().await }.await;
        self.report("Play", result);
    }

    pub async fn pause(&self) {
        let result = async { self.endpoints()?.playback.pause().await }.await;
        self.report("Pause", result);
    }

    pub async fn play_pause(&self) {
        let result = async { self.endpoints()?.playback.play_pause().await }.await;
        self.report("PlayPause", result);
    }

    pub async fn stop(&self) {
        let result = async { self.endpoints()?.playback.stop().await }.await;
        self.report("Stop", result);
    }

    /// Relative seek in microseconds.
    pub async fn seek(&self, offset: i64) {
        let result = async { self.endpoints()?.playback.seek(offset).await }.await;
        self.report("Seek", result);
    }

    /// Absolute seek in microseconds within the track `track_id`.
    ///
    /// Players ignore the request when `track_id` is no longer current.
    pub async fn set_position(&self, track_id: &str, position: i64) {
        let result = async {
            self.endpoints()?
                .playback
                .set_position(track_id, position)
                .await
        }
        .await;
        self.report("SetPosition", result);
    }

    pub async fn open_uri(&self, uri: &str) {
        let result = async { self.endpoints()?.playback.open_uri(uri).await }.await;
        self.report("OpenUri", result);
    }

    pub async fn raise(&self) {
        let result = async { self.endpoints()?.root.raise().await }.await;
        self.report("Raise", result);
    }

    pub async fn quit(&self) {
        let result = async { self.endpoints()?.root.quit().await }.await;
        self.report("Quit", result);
    }

    pub async fn set_fullscreen(&self, fullscreen: bool) {
        let result = async { self.endpoints()?.root.set_fullscreen(fullscreen).await }.await;
        self.report("Fullscreen", result);
    }

    pub async fn set_volume(&self, volume: f64) {
        let result = async { self.endpoints()?.playback.set_volume(volume).await }.await;
        self.report("Volume", result);
    }

    pub async fn set_rate(&self, rate: f64) {
        let result = async { self.endpoints()?.playback.set_rate(rate).await }.await;
        self.report("Rate", result);
    }

    pub async fn set_shuffle(&self, shuffle: bool) {
        let result = async { self.endpoints()?.playback.set_shuffle(shuffle).await }.await;
        self.report("Shuffle", result);
    }

    pub async fn set_loop_status(&self, status: LoopStatus) {
        let result = async { self.endpoints()?.playback.set_loop_status(status).await }.await;
        self.report("LoopStatus", result);
    }

    /// Flip shuffle relative to the cached value.
    pub async fn toggle_shuffle(&self) {
        self.set_shuffle(!self.shuffle()).await;
    }

    /// Advance the loop mode: none, track, playlist, none.
    pub async fn toggle_loop(&self) {
        self.set_loop_status(self.loop_status().next()).await;
    }

    fn endpoints(&self) -> Result<&Endpoints, MediaError> {
        self.endpoints
            .get()
            .ok_or_else(|| MediaError::NotInitialized(self.id.clone()))
    }

    fn report(&self, command: &'static str, result: Result<(), MediaError>) {
        if let Err(e) = result {
            warn!(player = %self.id, command, "Player command failed: {e}");
        }
    }
}

impl PartialEq for PlayerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("id", &self.id)
            .field("pinned", &self.is_pinned())
            .field("invalid", &self.is_invalid())
            .finish()
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read(state: &RwLock<PlayerState>) -> std::sync::RwLockReadGuard<'_, PlayerState> {
    state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(state: &RwLock<PlayerState>) -> std::sync::RwLockWriteGuard<'_, PlayerState> {
    state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
