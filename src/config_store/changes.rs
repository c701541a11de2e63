use std::{path::PathBuf, time::Instant};

use toml::Value;

/// Represents a configuration change with path-based identification.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChange {
    /// Path to the changed field using dot notation (e.g., "media.blacklisted_players").
    pub path: String,
    /// The previous value of the field, if available.
    pub old_value: Option<Value>,
    /// The new value of the field.
    pub new_value: Value,
    /// Timestamp when the change occurred.
    pub timestamp: Instant,
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error occurred while loading configuration from disk
    #[error("failed to load config from '{path}': {details}")]
    PersistenceError {
        /// Path where loading failed
        path: PathBuf,
        /// Error details from the load operation
        details: String,
    },

    /// Error occurred while serializing configuration
    #[error("failed to serialize {content_type}: {details}")]
    SerializationError {
        /// Type of content being serialized
        content_type: String,
        /// Serialization error details
        details: String,
    },

    /// Failed to initialize file watcher
    #[error("failed to initialize file watcher: {details}")]
    FileWatcherInitError {
        /// File watcher initialization error details
        details: String,
    },

    /// Error occurred while watching a specific file
    #[error("file watcher error for '{path}': {details}")]
    FileWatchError {
        /// Path being watched when error occurred
        path: PathBuf,
        /// File watcher error details
        details: String,
    },
}

impl ConfigChange {
    /// Creates a new configuration change.
    pub fn new(path: String, old_value: Option<Value>, new_value: Value) -> Self {
        Self {
            path,
            old_value,
            new_value,
            timestamp: Instant::now(),
        }
    }
}
