//! File watching for task triggers.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File was created
    Created(PathBuf),

    /// File was modified
    Modified(PathBuf),

    /// File was deleted
    Deleted(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Modified(p) | WatchEvent::Deleted(p) => p,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Directories are watched recursively, files through their parent
    /// directory. Events arriving less than `debounce` apart are delivered as
    /// one batch.
    pub fn new(
        paths: &[PathBuf],
        debounce: Duration,
    ) -> Result<(Self, async_mpsc::Receiver<Vec<WatchEvent>>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        let mut watched: Vec<PathBuf> = Vec::new();
        for path in paths {
            let (target, mode) = if path.is_dir() {
                (path.clone(), RecursiveMode::Recursive)
            } else {
                match path.parent() {
                    Some(parent) if parent.is_dir() => {
                        (parent.to_path_buf(), RecursiveMode::NonRecursive)
                    }
                    _ => {
                        tracing::warn!("Not watching missing path {}", path.display());
                        continue;
                    }
                }
            };

            if watched.contains(&target) {
                continue;
            }
            watcher
                .watch(&target, mode)
                .map_err(std::io::Error::other)?;
            tracing::debug!("Watching {}", target.display());
            watched.push(target);
        }

        std::thread::spawn(move || {
            while let Ok(first) = sync_rx.recv() {
                let mut batch = Vec::new();
                collect(&mut batch, first);

                while let Ok(event) = sync_rx.recv_timeout(debounce) {
                    collect(&mut batch, event);
                }

                if !batch.is_empty() && async_tx.blocking_send(batch).is_err() {
                    break;
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Add the classified paths of `event` to `batch`, skipping repeats.
fn collect(batch: &mut Vec<WatchEvent>, event: notify::Event) {
    for path in &event.paths {
        if let Some(e) = classify_event(path, &event.kind) {
            if !batch.contains(&e) {
                batch.push(e);
            }
        }
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    match kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Modify(_) => Some(WatchEvent::Modified(path.to_path_buf())),
        _ => None,
    }
}
