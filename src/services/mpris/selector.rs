use std::sync::{Arc, Mutex};

use futures::Stream;
use tracing::debug;

use super::{PlaybackStatus, PlayerHandle, PlayerId, WidgetFlags, display::DisplaySink};
use crate::services::common::Property;

/// Pick the active player from `handles`, given in insertion order.
///
/// Invalid handles are skipped. The first pinned handle wins outright.
/// Otherwise the first handle is the default, and a later one takes over
/// only while the current pick is not playing and the later one is playing
/// or was the previous pick.
pub fn choose<'a>(
    handles: &'a [Arc<PlayerHandle>],
    previous: Option<&PlayerId>,
) -> Option<&'a Arc<PlayerHandle>> {
    let mut best: Option<&Arc<PlayerHandle>> = None;

    for handle in handles.iter().filter(|handle| !handle.is_invalid()) {
        if handle.is_pinned() {
            return Some(handle);
        }

        let Some(current) = best else {
            best = Some(handle);
            continue;
        };

        let current_idle = current.playback_status() != PlaybackStatus::Playing;
        let candidate_playing = handle.playback_status() == PlaybackStatus::Playing;
        let was_previous = previous == Some(handle.id());

        if current_idle && (candidate_playing || was_previous) {
            best = Some(handle);
        }
    }

    best
}

/// Keeps the active player in step with the registry and tells the display.
pub struct ActivePlayerSelector {
    display: Arc<dyn DisplaySink>,
    previous: Mutex<Option<PlayerId>>,
    active: Property<Option<Arc<PlayerHandle>>>,
}

impl ActivePlayerSelector {
    /// Selector with nothing chosen yet.
    pub fn new(display: Arc<dyn DisplaySink>) -> Self {
        Self {
            display,
            previous: Mutex::new(None),
            active: Property::new(None),
        }
    }

    /// Run selection from scratch and report the outcome.
    ///
    /// A new pick replaces the display, the same pick refreshes it and no
    /// pick clears it. The pick is recorded before the display is told, so
    /// the display may pin or unpin players, which reselects re-entrantly.
    pub fn reselect(&self, handles: &[Arc<PlayerHandle>]) -> Option<Arc<PlayerHandle>> {
        let (chosen, changed) = {
            let mut previous = self
                .previous
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            let chosen = choose(handles, previous.as_ref()).cloned();
            let changed = chosen.as_ref().map(|handle| handle.id()) != previous.as_ref();

            *previous = chosen.as_ref().map(|handle| handle.id().clone());
            self.active.set(chosen.clone());
            (chosen, changed)
        };

        match &chosen {
            Some(handle) if changed => {
                debug!(player = %handle.id(), "Active player changed");
                self.display.display_player(handle);
            }
            Some(_) => self.display.update_display(WidgetFlags::all()),
            None => {
                if changed {
                    debug!("No active player");
                }
                self.display.clear_display();
            }
        }

        chosen
    }

    /// The current pick.
    pub fn active(&self) -> Option<Arc<PlayerHandle>> {
        self.active.get()
    }

    /// Identifier of the current pick.
    pub fn active_id(&self) -> Option<PlayerId> {
        self.active.get().map(|handle| handle.id().clone())
    }

    /// Current pick, then every change.
    pub fn watch(&self) -> impl Stream<Item = Option<Arc<PlayerHandle>>> + Send {
        self.active.watch()
    }
}
