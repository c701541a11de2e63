use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use async_stream::stream;
use futures::Stream;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::{Config, ConfigPaths};

use super::{ConfigChange, ConfigError, diff, path_ops::path_matches};

/// A thread-safe configuration store that holds the loaded settings and
/// broadcasts changes found on reload.
#[derive(Clone)]
pub struct ConfigStore {
    config: Arc<RwLock<Config>>,
    path: Option<PathBuf>,
    change_sender: broadcast::Sender<ConfigChange>,
}

impl ConfigStore {
    /// Creates a store with default configuration values and no backing file
    pub fn with_defaults() -> Self {
        Self::from_parts(Config::default(), None)
    }

    /// Loads a store from the main configuration file
    ///
    /// # Errors
    /// * `ConfigError::PersistenceError` - If the configuration file cannot be loaded
    pub fn load() -> Result<Self, ConfigError> {
        let path = ConfigPaths::main_config().map_err(|e| ConfigError::PersistenceError {
            path: PathBuf::from("config.toml"),
            details: e.to_string(),
        })?;

        Self::load_from(&path)
    }

    /// Loads a store from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// * `ConfigError::PersistenceError` - If the file exists but cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = load_config(path)?;
        Ok(Self::from_parts(config, Some(path.to_path_buf())))
    }

    fn from_parts(config: Config, path: Option<PathBuf>) -> Self {
        let (change_sender, _) = broadcast::channel(1000);

        Self {
            config: Arc::new(RwLock::new(config)),
            path,
            change_sender,
        }
    }

    /// File this store was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns a clone of the current configuration, handling poisoned locks gracefully
    pub fn get_current(&self) -> Config {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the configuration and broadcast every field that changed.
    ///
    /// # Errors
    /// * `ConfigError::SerializationError` - If either config cannot be serialized
    pub fn replace(&self, new_config: Config) -> Result<Vec<ConfigChange>, ConfigError> {
        let old_config = {
            let mut config = match self.config.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::replace(&mut *config, new_config.clone())
        };

        let changes = diff::diff_configs(&old_config, &new_config)?;
        for change in &changes {
            debug!(path = %change.path, "Config changed");
            let _ = self.change_sender.send(change.clone());
        }

        Ok(changes)
    }

    /// Re-read the backing file and broadcast what changed.
    ///
    /// # Errors
    /// * `ConfigError::PersistenceError` - If the file cannot be read or parsed
    pub fn reload(&self) -> Result<Vec<ConfigChange>, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };

        self.replace(load_config(path)?)
    }

    /// Creates a stream that yields ConfigChange events matching the specified path pattern
    ///
    /// # Arguments
    /// * `pattern` - A pattern to match configuration paths (supports "*" wildcards)
    pub fn subscribe_to_path(&self, pattern: &str) -> impl Stream<Item = ConfigChange> + use<> {
        let pattern = pattern.to_string();
        let mut receiver = self.change_sender.subscribe();

        stream! {
            loop {
                match receiver.recv().await {
                    Ok(change) if path_matches(&change.path, &pattern) => yield change,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Config::load(path).map_err(|e| ConfigError::PersistenceError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}
