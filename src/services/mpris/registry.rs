use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, RwLock, Weak},
};

use futures::{Stream, future::join_all};
use tracing::{debug, info, instrument, warn};

use super::{
    ActivePlayerSelector, Blacklist, PlayerHandle, PlayerId, PollSettings, PropertyName,
    Subscription, WidgetFlags, display::DisplaySink, endpoint::EndpointConnector,
    presence::PresenceWatcher,
};
use crate::services::common::Property;

struct Entry {
    handle: Arc<PlayerHandle>,
    subscriptions: Vec<Subscription>,
}

#[derive(Default)]
struct Players {
    entries: Vec<Entry>,
    /// In-flight initializations; `true` once a vanish cancelled them
    pending: HashMap<PlayerId, bool>,
}

impl Players {
    fn position(&self, player_id: &PlayerId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.handle.id() == player_id)
    }
}

/// Insertion-ordered set of connected players.
///
/// The registry owns every [`PlayerHandle`], applies the blacklist, and
/// re-runs active player selection whenever membership or a relevant
/// property changes.
pub struct PlayerRegistry {
    connector: Arc<dyn EndpointConnector>,
    presence: Arc<dyn PresenceWatcher>,
    selector: Arc<ActivePlayerSelector>,
    display: Arc<dyn DisplaySink>,
    blacklist: RwLock<Blacklist>,
    poll_settings: RwLock<PollSettings>,
    players: Mutex<Players>,
    player_list: Property<Vec<Arc<PlayerHandle>>>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    pub fn new(
        connector: Arc<dyn EndpointConnector>,
        presence: Arc<dyn PresenceWatcher>,
        selector: Arc<ActivePlayerSelector>,
        display: Arc<dyn DisplaySink>,
        blacklist: Blacklist,
        poll_settings: PollSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            connector,
            presence,
            selector,
            display,
            blacklist: RwLock::new(blacklist),
            poll_settings: RwLock::new(poll_settings),
            players: Mutex::new(Players::default()),
            player_list: Property::new(Vec::new()),
        })
    }

    /// Connect to a player and start tracking it.
    ///
    /// Does nothing if the player is already tracked or still initializing.
    /// Players that fail to initialize or are blacklisted are never
    /// inserted. Returns the inserted handle.
    pub async fn add_player(self: &Arc<Self>, player_id: PlayerId) -> Option<Arc<PlayerHandle>> {
        if !self.reserve(&player_id) {
            return None;
        }

        self.complete_add(player_id).await
    }

    /// Claim `player_id` for an addition. Returns false if it is already
    /// tracked or initializing.
    pub(crate) fn reserve(&self, player_id: &PlayerId) -> bool {
        let mut players = self.lock_players();
        if players.position(player_id).is_some() || players.pending.contains_key(player_id) {
            debug!(player = %player_id, "Player already tracked");
            return false;
        }

        players.pending.insert(player_id.clone(), false);
        true
    }

    /// Finish an addition claimed with [`Self::reserve`].
    #[instrument(skip(self), fields(player = %player_id))]
    pub(crate) async fn complete_add(
        self: &Arc<Self>,
        player_id: PlayerId,
    ) -> Option<Arc<PlayerHandle>> {
        let handle = PlayerHandle::new(player_id.clone(), self.poll_settings());

        if let Err(e) = handle.initialize(self.connector.as_ref()).await {
            warn!("Failed to initialize player: {e}");
            self.lock_players().pending.remove(&player_id);
            handle.destroy();
            return None;
        }

        let blacklisted = self.blacklist().contains(&handle);
        {
            let mut players = self.lock_players();
            let cancelled = players.pending.remove(&player_id).unwrap_or(true);

            if cancelled {
                debug!("Player vanished during initialization");
                drop(players);
                handle.destroy();
                return None;
            }

            if blacklisted {
                info!("Ignoring blacklisted player");
                drop(players);
                handle.destroy();
                return None;
            }

            let subscriptions = self.watch_player(&handle);
            players.entries.push(Entry {
                handle: Arc::clone(&handle),
                subscriptions,
            });
        }

        info!(name = %handle.display_name(), "Player added");
        self.players_changed();
        self.reselect();

        Some(handle)
    }

    fn watch_player(self: &Arc<Self>, handle: &PlayerHandle) -> Vec<Subscription> {
        let mut subscriptions = Vec::with_capacity(3);

        for property in [PropertyName::IsPinned, PropertyName::PlaybackStatus] {
            let registry = Arc::downgrade(self);
            subscriptions.push(handle.on_property_changed(property, move |_| {
                if let Some(registry) = registry.upgrade() {
                    registry.reselect();
                }
            }));
        }

        let registry: Weak<Self> = Arc::downgrade(self);
        subscriptions.push(
            handle.on_property_changed(PropertyName::IsInvalid, move |_| {
                if let Some(registry) = registry.upgrade() {
                    registry.players_changed();
                    registry.reselect();
                }
            }),
        );

        subscriptions
    }

    /// Stop tracking a player. Returns whether anything was removed.
    ///
    /// A player still initializing is cancelled instead.
    #[instrument(skip(self), fields(player = %player_id))]
    pub fn remove_player(&self, player_id: &PlayerId) -> bool {
        let entry = {
            let mut players = self.lock_players();

            if let Some(cancelled) = players.pending.get_mut(player_id) {
                *cancelled = true;
                return false;
            }

            match players.position(player_id) {
                Some(index) => players.entries.remove(index),
                None => return false,
            }
        };

        for subscription in &entry.subscriptions {
            subscription.unsubscribe();
        }
        entry.handle.destroy();

        info!("Player removed");
        self.players_changed();
        self.reselect();
        true
    }

    /// Drop newly blacklisted players, then add every running player that
    /// is not tracked yet.
    #[instrument(skip(self))]
    pub async fn reconcile_all(self: &Arc<Self>) {
        let blacklist = self.blacklist();
        let blocked: Vec<PlayerId> = self
            .players()
            .iter()
            .filter(|handle| blacklist.contains(handle))
            .map(|handle| handle.id().clone())
            .collect();

        for player_id in &blocked {
            self.remove_player(player_id);
        }

        self.add_running_players().await;
    }

    /// Add every player the presence watcher currently knows about.
    pub async fn add_running_players(self: &Arc<Self>) {
        let player_ids = match self.presence.list_endpoints().await {
            Ok(player_ids) => player_ids,
            Err(e) => {
                warn!("Failed to list running players: {e}");
                return;
            }
        };

        join_all(
            player_ids
                .into_iter()
                .map(|player_id| self.add_player(player_id)),
        )
        .await;
    }

    /// Replace the blacklist and reconcile against it.
    pub async fn set_blacklist(self: &Arc<Self>, blacklist: Blacklist) {
        {
            let mut current = self
                .blacklist
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *current == blacklist {
                return;
            }
            *current = blacklist;
        }

        self.reconcile_all().await;
    }

    /// Poll budget for players added from now on.
    pub fn set_poll_settings(&self, settings: PollSettings) {
        *self
            .poll_settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }

    /// Stop tracking every player.
    pub fn clear(&self) {
        let ids: Vec<PlayerId> = self
            .players()
            .iter()
            .map(|handle| handle.id().clone())
            .collect();

        for player_id in &ids {
            self.remove_player(player_id);
        }
    }

    /// Valid players in insertion order, read fresh from the registry.
    pub fn snapshot(&self) -> Vec<Arc<PlayerHandle>> {
        self.lock_players()
            .entries
            .iter()
            .filter(|entry| !entry.handle.is_invalid())
            .map(|entry| Arc::clone(&entry.handle))
            .collect()
    }

    /// Every tracked player, valid or not, in insertion order.
    pub fn players(&self) -> Vec<Arc<PlayerHandle>> {
        self.lock_players()
            .entries
            .iter()
            .map(|entry| Arc::clone(&entry.handle))
            .collect()
    }

    /// Look up a tracked player.
    pub fn player(&self, player_id: &PlayerId) -> Option<Arc<PlayerHandle>> {
        let players = self.lock_players();
        players
            .position(player_id)
            .map(|index| Arc::clone(&players.entries[index].handle))
    }

    /// Number of tracked players, valid or not.
    pub fn len(&self) -> usize {
        self.lock_players().entries.len()
    }

    /// Whether no player is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Valid players, then every change to that list.
    pub fn watch(&self) -> impl Stream<Item = Vec<Arc<PlayerHandle>>> + Send {
        self.player_list.watch()
    }

    /// Re-run active player selection.
    pub fn reselect(&self) -> Option<Arc<PlayerHandle>> {
        self.selector.reselect(&self.snapshot())
    }

    fn players_changed(&self) {
        self.player_list.set(self.snapshot());
        self.display.update_display(WidgetFlags::MENU_PLAYERS);
    }

    fn blacklist(&self) -> Blacklist {
        self.blacklist
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn poll_settings(&self) -> PollSettings {
        *self
            .poll_settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_players(&self) -> MutexGuard<'_, Players> {
        self.players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
