//! Reactive configuration store with change tracking.
//!
//! Holds the loaded configuration, reloads it when the file changes, and
//! notifies subscribers of the fields that changed.

mod changes;
mod diff;
mod file_watcher;
mod file_watching;
mod path_ops;
mod store;

#[cfg(test)]
mod tests;

pub use changes::{ConfigChange, ConfigError};
pub use file_watcher::{FileEvent, FileEventKind, FileWatcher};
pub use store::ConfigStore;
