use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ConfigError, ConfigStore, file_watcher::FileWatcher};

const DEBOUNCE: Duration = Duration::from_millis(500);

impl ConfigStore {
    /// Starts monitoring the backing file and broadcasts updates.
    ///
    /// Bursts of file events are debounced; once the file has been quiet for
    /// half a second it is reloaded and the differences are broadcast to
    /// subscribers. Dropping or aborting the returned task stops watching.
    ///
    /// # Errors
    /// Returns error if the store has no backing file or file watching
    /// cannot be initialized.
    pub fn start_file_watching(&self) -> Result<JoinHandle<()>, ConfigError> {
        let path = self
            .path()
            .ok_or_else(|| ConfigError::FileWatcherInitError {
                details: "store has no backing file".to_string(),
            })?
            .to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::FileWatchError {
                    path: parent.to_path_buf(),
                    details: e.to_string(),
                })?;
            }
        }

        let (watcher, mut event_rx) =
            FileWatcher::watch(&path).map_err(|e| ConfigError::FileWatchError {
                path: path.clone(),
                details: e.to_string(),
            })?;

        info!(path = %path.display(), "Watching config file");
        let store = self.clone();

        Ok(tokio::spawn(async move {
            let _watcher = watcher;
            let mut pending = false;

            let debounce_sleep = tokio::time::sleep(DEBOUNCE);
            tokio::pin!(debounce_sleep);

            loop {
                tokio::select! {
                    event = event_rx.recv() => {
                        let Some(event) = event else {
                            break;
                        };
                        debug!(?event.kind, "Config file event");
                        pending = true;
                        debounce_sleep.as_mut().reset(tokio::time::Instant::now() + DEBOUNCE);
                    }

                    _ = &mut debounce_sleep, if pending => {
                        pending = false;
                        match store.reload() {
                            Ok(changes) => debug!(count = changes.len(), "Reloaded config"),
                            Err(e) => warn!("Failed to reload config: {e}"),
                        }
                    }
                }
            }
        }))
    }
}
