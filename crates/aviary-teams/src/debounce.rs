//! Per-path debounce for file-system change notifications.
//!
//! Multi-step writes (temp file, rename, metadata touch) produce bursts of
//! notifications for the same path. Each notification restarts that path's
//! timer; a path is only released once its window has passed with no
//! further notifications, so reconciliation reads settled files.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Default settle window.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Explicit per-path timer map, independent of the notification backend.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record a change notification for a path, restarting its timer.
    pub fn notify(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path, now + self.window);
    }

    /// Remove and return all paths whose windows have settled.
    pub fn drain_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let due: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &due {
            self.pending.remove(path);
        }
        due
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
