//! Tests for player tracking
//!
//! Drives handles, the registry, selection and lyric routing through
//! in-memory endpoints and presence events. No session bus required.
//! Async tests run on paused time so `settle` lets every ready task finish.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use tokio::sync::{Notify, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    config::MediaConfig,
    services::{
        lyric::{Lyric, LyricRouter},
        mpris::{
            ActivePlayerSelector, Blacklist, DisplaySink, LoopStatus, MediaError, MprisService,
            PlaybackProperties, PlaybackStatus, PlayerHandle, PlayerId, PlayerProperty,
            PlayerRegistry, PollSettings, PresenceEvent, PresenceWatcher, PropertyName,
            RootProperties, TrackMetadata, WidgetFlags,
            endpoint::{
                EndpointConnector, PlaybackEndpoint, PropertiesEndpoint, PropertyBatch,
                RootEndpoint,
            },
        },
    },
};

#[derive(Debug, Clone)]
struct MockPlayer {
    root: RootProperties,
    playback: PlaybackProperties,
    fail: bool,
    position: i64,
    poll_metadata: Option<TrackMetadata>,
    poll_fails: bool,
}

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct MockConnector {
    players: Mutex<HashMap<PlayerId, MockPlayer>>,
    changes: Mutex<HashMap<PlayerId, mpsc::UnboundedSender<PropertyBatch>>>,
    commands: Log,
    poll_calls: Arc<AtomicUsize>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockConnector {
    fn insert(&self, player_id: &PlayerId, player: MockPlayer) {
        self.players
            .lock()
            .unwrap()
            .insert(player_id.clone(), player);
    }

    fn emit(&self, player_id: &PlayerId, batch: PropertyBatch) {
        let changes = self.changes.lock().unwrap();
        changes[player_id].send(batch).unwrap();
    }

    /// Make every root connection wait until the returned gate is notified.
    fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn player(&self, player_id: &PlayerId) -> Result<MockPlayer, MediaError> {
        let player = self
            .players
            .lock()
            .unwrap()
            .get(player_id)
            .cloned()
            .ok_or_else(|| MediaError::PlayerNotFound(player_id.clone()))?;

        if player.fail {
            return Err(MediaError::InitializationFailed(format!(
                "{player_id} refused the connection"
            )));
        }

        Ok(player)
    }
}

#[async_trait]
impl EndpointConnector for MockConnector {
    async fn root(&self, player_id: &PlayerId) -> Result<Arc<dyn RootEndpoint>, MediaError> {
        let gate = self.hold.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let player = self.player(player_id)?;
        Ok(Arc::new(MockRoot {
            props: player.root,
            commands: Arc::clone(&self.commands),
        }))
    }

    async fn playback(
        &self,
        player_id: &PlayerId,
    ) -> Result<Arc<dyn PlaybackEndpoint>, MediaError> {
        let player = self.player(player_id)?;
        Ok(Arc::new(MockPlayback {
            props: player.playback,
            commands: Arc::clone(&self.commands),
        }))
    }

    async fn properties(
        &self,
        player_id: &PlayerId,
    ) -> Result<Arc<dyn PropertiesEndpoint>, MediaError> {
        let player = self.player(player_id)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.changes
            .lock()
            .unwrap()
            .insert(player_id.clone(), sender);

        Ok(Arc::new(MockProperties {
            player,
            receiver: Mutex::new(Some(receiver)),
            poll_calls: Arc::clone(&self.poll_calls),
        }))
    }
}

struct MockRoot {
    props: RootProperties,
    commands: Log,
}

#[async_trait]
impl RootEndpoint for MockRoot {
    async fn load(&self) -> Result<RootProperties, MediaError> {
        Ok(self.props.clone())
    }

    async fn set_fullscreen(&self, fullscreen: bool) -> Result<(), MediaError> {
        self.commands
            .lock()
            .unwrap()
            .push(format!("Fullscreen {fullscreen}"));
        Ok(())
    }

    async fn raise(&self) -> Result<(), MediaError> {
        self.commands.lock().unwrap().push("Raise".to_string());
        Ok(())
    }

    async fn quit(&self) -> Result<(), MediaError> {
        self.commands.lock().unwrap().push("Quit".to_string());
        Ok(())
    }
}

struct MockPlayback {
    props: PlaybackProperties,
    commands: Log,
}

impl MockPlayback {
    fn record(&self, command: String) -> Result<(), MediaError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

#[async_trait]
impl PlaybackEndpoint for MockPlayback {
    async fn load(&self) -> Result<PlaybackProperties, MediaError> {
        Ok(self.props.clone())
    }

    async fn next(&self) -> Result<(), MediaError> {
        self.record("Next".to_string())
    }

    async fn previous(&self) -> Result<(), MediaError> {
        self.record("Previous".to_string())
    }

    async fn play(&self) -> Result<(), MediaError> {
        self.record("Play".to_string())
    }

    async fn pause(&self) -> Result<(), MediaError> {
        self.record("Pause".to_string())
    }

    async fn play_pause(&self) -> Result<(), MediaError> {
        self.record("PlayPause".to_string())
    }

    async fn stop(&self) -> Result<(), MediaError> {
        self.record("Stop".to_string())
    }

    async fn seek(&self, offset: i64) -> Result<(), MediaError> {
        self.record(format!("Seek {offset}"))
    }

    async fn set_position(&self, track_id: &str, position: i64) -> Result<(), MediaError> {
        self.record(format!("SetPosition {track_id} {position}"))
    }

    async fn open_uri(&self, uri: &str) -> Result<(), MediaError> {
        self.record(format!("OpenUri {uri}"))
    }

    async fn set_volume(&self, volume: f64) -> Result<(), MediaError> {
        self.record(format!("Volume {volume}"))
    }

    async fn set_rate(&self, rate: f64) -> Result<(), MediaError> {
        self.record(format!("Rate {rate}"))
    }

    async fn set_shuffle(&self, shuffle: bool) -> Result<(), MediaError> {
        self.record(format!("Shuffle {shuffle}"))
    }

    async fn set_loop_status(&self, status: LoopStatus) -> Result<(), MediaError> {
        self.record(format!("LoopStatus {status:?}"))
    }

    async fn seeked(&self) -> Result<BoxStream<'static, i64>, MediaError> {
        Err(MediaError::ControlFailed("no Seeked signal".to_string()))
    }
}

struct MockProperties {
    player: MockPlayer,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<PropertyBatch>>>,
    poll_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PropertiesEndpoint for MockProperties {
    async fn position(&self) -> Result<i64, MediaError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);

        if self.player.poll_fails {
            return Err(MediaError::ControlFailed("Position unavailable".to_string()));
        }
        Ok(self.player.position)
    }

    async fn metadata(&self) -> Result<Option<TrackMetadata>, MediaError> {
        Ok(self.player.poll_metadata.clone())
    }

    async fn changes(&self) -> Result<BoxStream<'static, PropertyBatch>, MediaError> {
        match self.receiver.lock().unwrap().take() {
            Some(receiver) => Ok(UnboundedReceiverStream::new(receiver).boxed()),
            None => Ok(futures::stream::empty().boxed()),
        }
    }
}

struct MockPresence {
    running: Mutex<Vec<PlayerId>>,
    events: Mutex<Option<mpsc::UnboundedReceiver<PresenceEvent>>>,
}

impl MockPresence {
    fn new(running: Vec<PlayerId>) -> (Arc<Self>, mpsc::UnboundedSender<PresenceEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let presence = Arc::new(Self {
            running: Mutex::new(running),
            events: Mutex::new(Some(receiver)),
        });
        (presence, sender)
    }

    fn set_running(&self, running: Vec<PlayerId>) {
        *self.running.lock().unwrap() = running;
    }
}

#[async_trait]
impl PresenceWatcher for MockPresence {
    async fn list_endpoints(&self) -> Result<Vec<PlayerId>, MediaError> {
        Ok(self.running.lock().unwrap().clone())
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, PresenceEvent>, MediaError> {
        let receiver = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| MediaError::InitializationFailed("already subscribed".to_string()))?;
        Ok(UnboundedReceiverStream::new(receiver).boxed())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DisplayCall {
    Player(PlayerId),
    Clear,
    Update(WidgetFlags),
    Lyric(Option<String>),
    Suppressed(bool),
}

#[derive(Default)]
struct RecordingDisplay {
    calls: Mutex<Vec<DisplayCall>>,
}

impl RecordingDisplay {
    fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn take(&self) -> Vec<DisplayCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn last_player(&self) -> Option<PlayerId> {
        self.calls().into_iter().rev().find_map(|call| match call {
            DisplayCall::Player(player_id) => Some(player_id),
            _ => None,
        })
    }

    fn record(&self, call: DisplayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DisplaySink for RecordingDisplay {
    fn display_player(&self, player: &Arc<PlayerHandle>) {
        self.record(DisplayCall::Player(player.id().clone()));
    }

    fn clear_display(&self) {
        self.record(DisplayCall::Clear);
    }

    fn update_display(&self, flags: WidgetFlags) {
        self.record(DisplayCall::Update(flags));
    }

    fn update_lyric(&self, lyric: Option<&Lyric>) {
        self.record(DisplayCall::Lyric(lyric.map(|lyric| lyric.content.clone())));
    }

    fn set_suppressed(&self, suppressed: bool) {
        self.record(DisplayCall::Suppressed(suppressed));
    }
}

fn id(name: &str) -> PlayerId {
    PlayerId::from_bus_name(&format!("org.mpris.MediaPlayer2.{name}"))
}

fn track(title: &str) -> TrackMetadata {
    TrackMetadata {
        title: Some(title.to_string()),
        track_id: Some("/org/mpris/MediaPlayer2/Track/1".to_string()),
        length: Some(Duration::from_secs(180)),
        ..Default::default()
    }
}

fn player(name: &str, status: PlaybackStatus) -> MockPlayer {
    MockPlayer {
        root: RootProperties {
            identity: name.to_string(),
            desktop_entry: name.to_lowercase(),
            ..Default::default()
        },
        playback: PlaybackProperties {
            playback_status: status,
            metadata: Some(track(&format!("{name} song"))),
            ..Default::default()
        },
        fail: false,
        position: 0,
        poll_metadata: None,
        poll_fails: false,
    }
}

struct Harness {
    connector: Arc<MockConnector>,
    presence: Arc<MockPresence>,
    display: Arc<RecordingDisplay>,
    selector: Arc<ActivePlayerSelector>,
    registry: Arc<PlayerRegistry>,
}

fn harness(blacklist: Blacklist) -> Harness {
    let connector = Arc::new(MockConnector::default());
    let (presence, _events) = MockPresence::new(Vec::new());
    let display = Arc::new(RecordingDisplay::default());
    let selector = Arc::new(ActivePlayerSelector::new(display.clone()));
    let registry = PlayerRegistry::new(
        connector.clone(),
        presence.clone(),
        Arc::clone(&selector),
        display.clone(),
        blacklist,
        PollSettings::default(),
    );

    Harness {
        connector,
        presence,
        display,
        selector,
        registry,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn ids(handles: &[Arc<PlayerHandle>]) -> Vec<PlayerId> {
    handles.iter().map(|handle| handle.id().clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn adding_the_same_player_twice_keeps_one_entry() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("vlc"), player("VLC", PlaybackStatus::Playing));

    assert!(h.registry.add_player(id("vlc")).await.is_some());
    assert!(h.registry.add_player(id("vlc")).await.is_none());
    assert_eq!(h.registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_initialization_is_never_inserted() {
    let h = harness(Blacklist::default());
    let mut broken = player("Broken", PlaybackStatus::Playing);
    broken.fail = true;
    h.connector.insert(&id("broken"), broken);

    assert!(h.registry.add_player(id("broken")).await.is_none());
    assert!(h.registry.is_empty());
    assert!(
        !h.display
            .calls()
            .iter()
            .any(|call| matches!(call, DisplayCall::Player(_)))
    );

    // a failed attempt must not leave the id reserved
    h.connector
        .insert(&id("broken"), player("Broken", PlaybackStatus::Playing));
    assert!(h.registry.add_player(id("broken")).await.is_some());
}

#[tokio::test(start_paused = true)]
async fn playing_player_takes_over_and_paused_one_returns_on_vanish() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("a"), player("A", PlaybackStatus::Paused));
    h.connector
        .insert(&id("b"), player("B", PlaybackStatus::Playing));

    h.registry.add_player(id("a")).await;
    assert_eq!(h.display.last_player(), Some(id("a")));

    h.registry.add_player(id("b")).await;
    assert_eq!(h.display.last_player(), Some(id("b")));
    assert_eq!(h.selector.active_id(), Some(id("b")));

    assert!(h.registry.remove_player(&id("b")));
    assert_eq!(h.display.last_player(), Some(id("a")));
    assert_eq!(h.selector.active_id(), Some(id("a")));

    assert!(h.registry.remove_player(&id("a")));
    assert_eq!(h.display.calls().last(), Some(&DisplayCall::Clear));
    assert_eq!(h.selector.active_id(), None);
}

#[tokio::test(start_paused = true)]
async fn pinned_player_beats_a_playing_one() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("a"), player("A", PlaybackStatus::Playing));
    h.connector
        .insert(&id("b"), player("B", PlaybackStatus::Paused));

    h.registry.add_player(id("a")).await;
    let b = h.registry.add_player(id("b")).await.unwrap();
    assert_eq!(h.selector.active_id(), Some(id("a")));

    b.pin();
    assert_eq!(h.selector.active_id(), Some(id("b")));
    assert_eq!(h.display.last_player(), Some(id("b")));

    b.unpin();
    assert_eq!(h.selector.active_id(), Some(id("a")));
}

#[tokio::test(start_paused = true)]
async fn status_change_on_active_player_refreshes_display() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("a"), player("A", PlaybackStatus::Playing));
    let a = h.registry.add_player(id("a")).await.unwrap();
    h.display.take();

    h.connector.emit(
        &id("a"),
        vec![PlayerProperty::PlaybackStatus(PlaybackStatus::Paused)],
    );
    settle().await;

    assert_eq!(a.playback_status(), PlaybackStatus::Paused);
    assert_eq!(h.display.take(), vec![DisplayCall::Update(WidgetFlags::all())]);
}

#[tokio::test(start_paused = true)]
async fn player_turning_invalid_leaves_the_list_and_selection() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("a"), player("A", PlaybackStatus::Playing));
    h.connector
        .insert(&id("b"), player("B", PlaybackStatus::Paused));
    h.registry.add_player(id("a")).await;
    h.registry.add_player(id("b")).await;

    h.connector
        .emit(&id("a"), vec![PlayerProperty::Metadata(None)]);
    settle().await;

    assert_eq!(h.registry.len(), 2);
    assert_eq!(ids(&h.registry.snapshot()), vec![id("b")]);
    assert_eq!(h.selector.active_id(), Some(id("b")));
    assert!(
        h.display
            .calls()
            .contains(&DisplayCall::Update(WidgetFlags::MENU_PLAYERS))
    );
}

#[tokio::test(start_paused = true)]
async fn last_valid_player_turning_invalid_clears_the_display() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("a"), player("A", PlaybackStatus::Playing));
    h.registry.add_player(id("a")).await;
    h.display.take();

    h.connector
        .emit(&id("a"), vec![PlayerProperty::Metadata(None)]);
    settle().await;

    assert_eq!(h.registry.len(), 1);
    assert!(h.registry.snapshot().is_empty());
    assert_eq!(h.selector.active_id(), None);
    assert_eq!(h.display.calls().last(), Some(&DisplayCall::Clear));
}

#[tokio::test(start_paused = true)]
async fn paused_previous_pick_keeps_the_spot_over_an_earlier_player() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("a"), player("A", PlaybackStatus::Paused));
    h.connector
        .insert(&id("b"), player("B", PlaybackStatus::Playing));
    h.registry.add_player(id("a")).await;
    h.registry.add_player(id("b")).await;
    assert_eq!(h.selector.active_id(), Some(id("b")));

    h.connector.emit(
        &id("b"),
        vec![PlayerProperty::PlaybackStatus(PlaybackStatus::Paused)],
    );
    settle().await;
    h.display.take();

    h.connector.emit(
        &id("a"),
        vec![PlayerProperty::PlaybackStatus(PlaybackStatus::Stopped)],
    );
    settle().await;

    assert_eq!(h.selector.active_id(), Some(id("b")));
    assert_eq!(h.display.take(), vec![DisplayCall::Update(WidgetFlags::all())]);
}

/// Display that pins whatever player it is asked to show.
#[derive(Default)]
struct PinningDisplay {
    inner: RecordingDisplay,
}

impl DisplaySink for PinningDisplay {
    fn display_player(&self, player: &Arc<PlayerHandle>) {
        self.inner.display_player(player);
        player.pin();
    }

    fn clear_display(&self) {
        self.inner.clear_display();
    }

    fn update_display(&self, flags: WidgetFlags) {
        self.inner.update_display(flags);
    }

    fn update_lyric(&self, lyric: Option<&Lyric>) {
        self.inner.update_lyric(lyric);
    }

    fn set_suppressed(&self, suppressed: bool) {
        self.inner.set_suppressed(suppressed);
    }
}

#[tokio::test(start_paused = true)]
async fn display_may_pin_the_player_it_shows() {
    let connector = Arc::new(MockConnector::default());
    connector.insert(&id("a"), player("A", PlaybackStatus::Paused));
    connector.insert(&id("b"), player("B", PlaybackStatus::Playing));
    let (presence, _events) = MockPresence::new(Vec::new());
    let display = Arc::new(PinningDisplay::default());
    let selector = Arc::new(ActivePlayerSelector::new(display.clone()));
    let registry = PlayerRegistry::new(
        connector,
        presence,
        Arc::clone(&selector),
        display.clone(),
        Blacklist::default(),
        PollSettings::default(),
    );

    let a = registry.add_player(id("a")).await.unwrap();
    assert!(a.is_pinned());
    assert_eq!(
        display.inner.take(),
        vec![
            DisplayCall::Update(WidgetFlags::MENU_PLAYERS),
            DisplayCall::Player(id("a")),
            DisplayCall::Update(WidgetFlags::all()),
        ]
    );

    registry.add_player(id("b")).await.unwrap();
    assert_eq!(selector.active_id(), Some(id("a")));
    assert_eq!(display.inner.last_player(), None);
}

#[tokio::test(start_paused = true)]
async fn lyrics_follow_the_active_player() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("spotify"), player("Spotify", PlaybackStatus::Playing));
    h.registry.add_player(id("spotify")).await;
    h.display.take();

    let router = LyricRouter::new(Arc::clone(&h.selector), h.display.clone());
    let line = |content: &str, sender: &str| Lyric {
        content: content.to_string(),
        time: 1.5,
        sender: sender.to_string(),
    };

    assert!(!router.route(&line("from elsewhere", "vlc")));
    assert!(router.route(&line("sung line", "spotify")));
    assert!(router.route(&line("", "vlc")));

    assert_eq!(
        h.display.take(),
        vec![
            DisplayCall::Lyric(Some("sung line".to_string())),
            DisplayCall::Lyric(None),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn lyric_without_sender_goes_to_the_active_player() {
    let h = harness(Blacklist::default());
    let router = LyricRouter::new(Arc::clone(&h.selector), h.display.clone());
    let anonymous = Lyric {
        content: "whoever sings".to_string(),
        time: 3.0,
        sender: String::new(),
    };

    assert!(!router.route(&anonymous));

    h.connector
        .insert(&id("vlc"), player("VLC", PlaybackStatus::Playing));
    h.registry.add_player(id("vlc")).await;
    h.display.take();

    assert!(router.route(&anonymous));
    assert_eq!(
        h.display.take(),
        vec![DisplayCall::Lyric(Some("whoever sings".to_string()))]
    );
}

#[tokio::test(start_paused = true)]
async fn lyrics_are_dropped_without_an_active_player() {
    let h = harness(Blacklist::default());
    let router = LyricRouter::new(Arc::clone(&h.selector), h.display.clone());

    let lyric = Lyric {
        content: "nobody listens".to_string(),
        time: 0.0,
        sender: "spotify".to_string(),
    };

    assert!(!router.route(&lyric));
    assert!(h.display.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blacklist_applies_on_add_and_on_change() {
    let h = harness(Blacklist::new(["vlc.desktop"]));
    h.connector
        .insert(&id("vlc"), player("VLC", PlaybackStatus::Playing));
    h.connector
        .insert(&id("spotify"), player("Spotify", PlaybackStatus::Paused));

    assert!(h.registry.add_player(id("vlc")).await.is_none());
    assert!(h.registry.add_player(id("spotify")).await.is_some());
    assert_eq!(ids(&h.registry.players()), vec![id("spotify")]);

    h.presence.set_running(vec![id("vlc"), id("spotify")]);
    h.registry.set_blacklist(Blacklist::new(["Spotify"])).await;

    assert_eq!(ids(&h.registry.players()), vec![id("vlc")]);
    assert_eq!(h.selector.active_id(), Some(id("vlc")));
}

#[tokio::test(start_paused = true)]
async fn vanishing_during_initialization_cancels_the_add() {
    let h = harness(Blacklist::default());
    h.connector
        .insert(&id("slow"), player("Slow", PlaybackStatus::Playing));
    let gate = h.connector.gate();

    let (added, removed) = tokio::join!(h.registry.add_player(id("slow")), async {
        settle().await;
        let removed = h.registry.remove_player(&id("slow"));
        gate.notify_one();
        removed
    });

    assert!(!removed);
    assert!(added.is_none());
    assert!(h.registry.is_empty());
    assert!(
        !h.display
            .calls()
            .iter()
            .any(|call| matches!(call, DisplayCall::Player(_)))
    );
}

#[tokio::test(start_paused = true)]
async fn initializing_twice_is_rejected() {
    let connector = MockConnector::default();
    connector.insert(&id("vlc"), player("VLC", PlaybackStatus::Playing));
    let handle = PlayerHandle::new(id("vlc"), PollSettings::default());

    handle.initialize(&connector).await.unwrap();
    assert!(matches!(
        handle.initialize(&connector).await,
        Err(MediaError::AlreadyInitialized(_))
    ));
    assert!(!handle.is_invalid());
    assert_eq!(handle.display_name(), "VLC");
}

#[tokio::test(start_paused = true)]
async fn signal_batches_update_cache_before_listeners_run() {
    let connector = MockConnector::default();
    connector.insert(&id("vlc"), player("VLC", PlaybackStatus::Paused));
    let handle = PlayerHandle::new(id("vlc"), PollSettings::default());
    handle.initialize(&connector).await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    for property in [PropertyName::Volume, PropertyName::PlaybackStatus] {
        let seen = Arc::clone(&seen);
        let weak = Arc::downgrade(&handle);
        handle.on_property_changed(property, move |change| {
            let player = weak.upgrade().unwrap();
            let observed = match change {
                PlayerProperty::Volume(_) => format!("volume {}", player.volume()),
                _ => format!("status {}", player.playback_status()),
            };
            seen.lock().unwrap().push(observed);
        });
    }

    connector.emit(
        &id("vlc"),
        vec![
            PlayerProperty::Volume(0.25),
            PlayerProperty::PlaybackStatus(PlaybackStatus::Playing),
        ],
    );
    connector.emit(&id("vlc"), vec![PlayerProperty::Volume(0.5)]);
    settle().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["volume 0.25", "status Playing", "volume 0.5"]
    );
}

#[tokio::test(start_paused = true)]
async fn commands_reach_the_player_endpoints() {
    let connector = MockConnector::default();
    connector.insert(&id("vlc"), player("VLC", PlaybackStatus::Playing));
    let handle = PlayerHandle::new(id("vlc"), PollSettings::default());

    handle.next().await;
    assert!(connector.commands().is_empty());

    handle.initialize(&connector).await.unwrap();
    handle.next().await;
    handle.play_pause().await;
    handle
        .set_position("/org/mpris/MediaPlayer2/Track/1", 42)
        .await;
    handle.toggle_loop().await;
    handle.toggle_shuffle().await;
    handle.raise().await;

    assert_eq!(
        connector.commands(),
        vec![
            "Next",
            "PlayPause",
            "SetPosition /org/mpris/MediaPlayer2/Track/1 42",
            "LoopStatus Track",
            "Shuffle true",
            "Raise",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn set_position_sends_the_callers_track_id() {
    let connector = MockConnector::default();
    let mut untracked = player("VLC", PlaybackStatus::Playing);
    if let Some(metadata) = untracked.playback.metadata.as_mut() {
        metadata.track_id = None;
    }
    connector.insert(&id("vlc"), untracked);
    let handle = PlayerHandle::new(id("vlc"), PollSettings::default());
    handle.initialize(&connector).await.unwrap();

    handle
        .set_position("/org/mpris/MediaPlayer2/Track/7", 1_500_000)
        .await;

    assert_eq!(
        connector.commands(),
        vec!["SetPosition /org/mpris/MediaPlayer2/Track/7 1500000"]
    );
}

#[tokio::test(start_paused = true)]
async fn poll_publishes_late_metadata() {
    let connector = MockConnector::default();
    let mut late = player("Late", PlaybackStatus::Playing);
    late.playback.metadata = None;
    late.position = 1_000_000;
    late.poll_metadata = Some(track("First song"));
    connector.insert(&id("late"), late);

    let settings = PollSettings {
        interval: Duration::from_millis(100),
        max_attempts: 5,
    };
    let handle = PlayerHandle::new(id("late"), settings);
    handle.initialize(&connector).await.unwrap();
    assert!(handle.is_invalid());
    assert!(handle.is_polling());

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(!handle.is_invalid());
    assert!(!handle.is_polling());
    assert_eq!(handle.cached_position(), 1_000_000);
    assert_eq!(
        handle.metadata().and_then(|metadata| metadata.title),
        Some("First song".to_string())
    );
    assert_eq!(connector.poll_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_gives_up_after_its_budget() {
    let connector = MockConnector::default();
    connector.insert(&id("idle"), player("Idle", PlaybackStatus::Stopped));

    let settings = PollSettings {
        interval: Duration::from_millis(100),
        max_attempts: 3,
    };
    let handle = PlayerHandle::new(id("idle"), settings);
    handle.initialize(&connector).await.unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(!handle.is_polling());
    assert_eq!(connector.poll_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn poll_stops_on_first_failed_query() {
    let connector = MockConnector::default();
    let mut flaky = player("Flaky", PlaybackStatus::Playing);
    flaky.poll_fails = true;
    connector.insert(&id("flaky"), flaky);

    let handle = PlayerHandle::new(id("flaky"), PollSettings::default());
    handle.initialize(&connector).await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(!handle.is_polling());
    assert_eq!(connector.poll_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn destroy_is_idempotent_and_silences_the_handle() {
    let connector = MockConnector::default();
    connector.insert(&id("vlc"), player("VLC", PlaybackStatus::Playing));
    let handle = PlayerHandle::new(id("vlc"), PollSettings::default());
    handle.initialize(&connector).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    handle.on_property_changed(PropertyName::Volume, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    handle.destroy();
    handle.destroy();

    handle.apply_changes(vec![PlayerProperty::Volume(0.1)]);
    assert!(!handle.is_polling());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(handle.volume(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn service_follows_presence_events() {
    let connector = Arc::new(MockConnector::default());
    connector.insert(&id("spotify"), player("Spotify", PlaybackStatus::Paused));
    connector.insert(&id("vlc"), player("VLC", PlaybackStatus::Playing));
    let (presence, events) = MockPresence::new(vec![id("spotify")]);
    let display = Arc::new(RecordingDisplay::default());

    let service = MprisService::with_backends(
        connector,
        presence,
        display.clone(),
        &MediaConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(display.calls().first(), Some(&DisplayCall::Suppressed(true)));
    assert_eq!(ids(&service.players()), vec![id("spotify")]);

    events.send(PresenceEvent::Appeared(id("vlc"))).unwrap();
    settle().await;
    assert_eq!(ids(&service.players()), vec![id("spotify"), id("vlc")]);
    assert_eq!(
        service.active_player().map(|player| player.id().clone()),
        Some(id("vlc"))
    );

    events.send(PresenceEvent::Vanished(id("vlc"))).unwrap();
    settle().await;
    assert_eq!(ids(&service.players()), vec![id("spotify")]);
    assert_eq!(display.last_player(), Some(id("spotify")));

    let config = MediaConfig {
        hide_media_notification: false,
        ..MediaConfig::default()
    };
    display.take();
    service.update_config(&config).await;
    assert_eq!(display.take(), vec![DisplayCall::Suppressed(false)]);

    service.shutdown();
    service.shutdown();
    assert!(service.registry().is_empty());
    assert_eq!(
        display
            .calls()
            .iter()
            .filter(|call| **call == DisplayCall::Suppressed(false))
            .count(),
        1
    );
}
