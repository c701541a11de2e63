use async_trait::async_trait;
use futures::{StreamExt, future, stream::BoxStream};
use tracing::{debug, instrument};
use zbus::{Connection, fdo};

use super::{MediaError, PlayerId, is_mpris_bus_name};

/// Lifecycle change of an MPRIS bus name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// A player took ownership of its bus name
    Appeared(PlayerId),
    /// A player released its bus name
    Vanished(PlayerId),
}

/// Source of MPRIS endpoint lifecycle events.
///
/// Implementations only surface names carrying the MPRIS prefix.
#[async_trait]
pub trait PresenceWatcher: Send + Sync {
    /// Players currently present on the bus.
    ///
    /// # Errors
    /// Returns error if the bus cannot be queried.
    async fn list_endpoints(&self) -> Result<Vec<PlayerId>, MediaError>;

    /// Appeared and vanished events from now on.
    ///
    /// # Errors
    /// Returns error if the signal subscription fails.
    async fn subscribe(&self) -> Result<BoxStream<'static, PresenceEvent>, MediaError>;
}

/// Presence watcher backed by the bus daemon's `NameOwnerChanged` signal.
#[derive(Clone)]
pub struct DbusPresenceWatcher {
    connection: Connection,
}

impl DbusPresenceWatcher {
    /// Watch names on an existing bus connection
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    async fn bus_proxy(&self) -> Result<fdo::DBusProxy<'static>, MediaError> {
        fdo::DBusProxy::new(&self.connection)
            .await
            .map_err(|e| MediaError::InitializationFailed(format!("DBus proxy failed: {e}")))
    }
}

#[async_trait]
impl PresenceWatcher for DbusPresenceWatcher {
    #[instrument(skip(self))]
    async fn list_endpoints(&self) -> Result<Vec<PlayerId>, MediaError> {
        let names = self.bus_proxy().await?.list_names().await?;

        let players: Vec<PlayerId> = names
            .iter()
            .filter(|name| is_mpris_bus_name(name.as_str()))
            .map(|name| PlayerId::from_bus_name(name.as_str()))
            .collect();

        debug!(count = players.len(), "Listed running players");
        Ok(players)
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, PresenceEvent>, MediaError> {
        let name_owner_changed = self
            .bus_proxy()
            .await?
            .receive_name_owner_changed()
            .await
            .map_err(|e| {
                MediaError::InitializationFailed(format!("Signal subscription failed: {e}"))
            })?;

        Ok(name_owner_changed
            .filter_map(|signal| {
                let event = signal.args().ok().and_then(|args| {
                    if !is_mpris_bus_name(args.name().as_str()) {
                        return None;
                    }

                    let player_id = PlayerId::from_bus_name(args.name().as_str());
                    match (args.old_owner().is_some(), args.new_owner().is_some()) {
                        (false, true) => Some(PresenceEvent::Appeared(player_id)),
                        (true, false) => Some(PresenceEvent::Vanished(player_id)),
                        _ => None,
                    }
                });

                future::ready(event)
            })
            .boxed())
    }
}
