use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::mpsc;

/// Represents a file system event for a watched file.
#[derive(Debug, Clone)]
pub struct FileEvent {
    /// The path of the file that changed
    pub path: PathBuf,
    /// The type of change that occurred
    pub kind: FileEventKind,
}

/// The type of file system change that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was modified
    Modified,
    /// File was created
    Created,
    /// File was removed
    Removed,
}

/// Watches a single file through its parent directory.
///
/// Watching the directory keeps events flowing when an editor replaces the
/// file or when the file does not exist yet.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    file: PathBuf,
}

impl FileWatcher {
    /// Start watching `file` and return the watcher with its event receiver.
    ///
    /// Only events for `file` itself are forwarded. Uses an unbounded channel
    /// since file events are infrequent but bursty.
    ///
    /// # Errors
    /// Returns error if the watcher cannot be created or the parent directory
    /// cannot be watched.
    pub fn watch(
        file: &Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FileEvent>), notify::Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let file_name = file.file_name().map(ToOwned::to_owned);

        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };

            let kind = match event.kind {
                EventKind::Create(_) => FileEventKind::Created,
                EventKind::Modify(_) => FileEventKind::Modified,
                EventKind::Remove(_) => FileEventKind::Removed,
                _ => return,
            };

            for path in event.paths {
                if path.file_name() != file_name.as_deref() {
                    continue;
                }
                let _ = event_tx.send(FileEvent { path, kind });
            }
        })?;

        let directory = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        watcher.watch(directory, RecursiveMode::NonRecursive)?;

        Ok((
            Self {
                _watcher: watcher,
                file: file.to_path_buf(),
            },
            event_rx,
        ))
    }

    /// The watched file
    pub fn file(&self) -> &Path {
        &self.file
    }
}
