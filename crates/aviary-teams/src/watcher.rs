//! File watcher for team directory changes.
//!
//! Uses platform-native file watching (FSEvents on macOS, inotify on
//! Linux) and drains events non-blocking; the daemon feeds drained paths
//! into the per-path [`crate::debounce::Debouncer`].

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// Watches the teams directory for config/inbox/task changes.
pub struct TeamWatcher {
    /// The underlying notify watcher. Must be kept alive.
    _watcher: RecommendedWatcher,
    /// Channel receiver for file events.
    receiver: Receiver<Result<Event, notify::Error>>,
}

impl TeamWatcher {
    /// Create a new watcher for the teams directory.
    ///
    /// Watches recursively: configs, inboxes, and tasks are nested in
    /// per-team subdirectories. Returns `None` if the directory doesn't
    /// exist yet or the watcher can't be created; the daemon re-checks
    /// opportunistically.
    pub fn new(teams_dir: &Path) -> Option<Self> {
        if !teams_dir.is_dir() {
            tracing::debug!(
                event = "teams.watcher.dir_missing",
                path = %teams_dir.display(),
                "Teams directory doesn't exist yet"
            );
            return None;
        }

        let (tx, rx) = mpsc::channel();

        let mut watcher = match notify::recommended_watcher(tx) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(
                    event = "teams.watcher.create_failed",
                    error = %e,
                );
                return None;
            }
        };

        if let Err(e) = watcher.watch(teams_dir, RecursiveMode::Recursive) {
            tracing::warn!(
                event = "teams.watcher.watch_failed",
                path = %teams_dir.display(),
                error = %e,
            );
            return None;
        }

        tracing::info!(
            event = "teams.watcher.started",
            path = %teams_dir.display()
        );

        Some(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Drain pending file events (non-blocking) and return the distinct
    /// changed paths.
    pub fn drain_changed_paths(&self) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = Vec::new();

        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => {
                    if !Self::is_relevant_event(&event) {
                        continue;
                    }
                    for path in event.paths {
                        if !changed.contains(&path) {
                            changed.push(path);
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(event = "teams.watcher.event_error", error = %e);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!(event = "teams.watcher.channel_disconnected");
                    break;
                }
            }
        }

        if !changed.is_empty() {
            tracing::debug!(
                event = "teams.watcher.paths_changed",
                count = changed.len(),
            );
        }

        changed
    }

    /// Check if an event is relevant (create/modify/remove of .json files).
    fn is_relevant_event(event: &Event) -> bool {
        let is_relevant_kind = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        );

        if !is_relevant_kind {
            return false;
        }

        event.paths.iter().any(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "json")
        })
    }
}
