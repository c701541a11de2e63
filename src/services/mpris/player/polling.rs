use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use super::PlayerHandle;
use crate::services::mpris::{PlayerId, endpoint::PropertiesEndpoint};

/// Interval and attempt budget for the start-up poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay before each attempt
    pub interval: Duration,
    /// Attempts before giving up
    pub max_attempts: u32,
}

impl PollSettings {
    /// Budget derived from an overall timeout, rounding the attempt count up.
    pub fn from_timeout(timeout: Duration, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let attempts = timeout.as_millis().div_ceil(interval.as_millis());

        Self {
            interval,
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_timeout(Duration::from_millis(5000), Duration::from_millis(250))
    }
}

/// Background poll for players that publish their first track late.
///
/// Some players only emit property changes for the first track after a
/// client has queried them, so the handle asks for position and metadata
/// directly until both look populated. The task stops on success, on the
/// first failed query, when the budget runs out, or when cancelled.
pub(crate) struct PollTask {
    handle: JoinHandle<()>,
}

impl PollTask {
    pub(crate) fn start(
        player: Weak<PlayerHandle>,
        player_id: PlayerId,
        properties: Arc<dyn PropertiesEndpoint>,
        settings: PollSettings,
    ) -> Self {
        let handle = tokio::spawn(async move {
            Self::run(player, player_id, properties, settings).await;
        });

        Self { handle }
    }

    #[instrument(skip(player, properties, settings), fields(player = %player_id))]
    async fn run(
        player: Weak<PlayerHandle>,
        player_id: PlayerId,
        properties: Arc<dyn PropertiesEndpoint>,
        settings: PollSettings,
    ) {
        for attempt in 1..=settings.max_attempts {
            tokio::time::sleep(settings.interval).await;

            let result = tokio::try_join!(properties.position(), properties.metadata());

            let Some(player) = player.upgrade() else {
                return;
            };

            match result {
                Ok((position, metadata)) => {
                    let length = metadata.as_ref().map_or(0, |m| m.length_micros());

                    if position > 0 && length > 0 {
                        debug!(attempt, "Player finished initializing");
                        player.apply_initial_poll(position, metadata);
                        return;
                    }
                }
                Err(e) => {
                    debug!(attempt, "Stopping initialization poll: {e}");
                    return;
                }
            }
        }

        debug!("Initialization poll budget exhausted");
    }

    /// Stop the poll. Safe to call repeatedly or after it finished.
    pub(crate) fn cancel(&self) {
        self.handle.abort();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
