//! Offset-tracking reader for the append-only event log.
//!
//! The log grows by whole JSON lines. The tailer remembers the last
//! consumed byte offset and, on each poll, reads exactly the newly
//! appended range. A missing file is "no data yet", never an error.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::events::RawEvent;

/// Tails the event log, yielding parsed events for newly appended lines.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    offset: u64,
}

impl LogTailer {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            offset: 0,
        }
    }

    /// Current byte offset into the log.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Move the offset to the current end of the file, skipping any
    /// existing content. Used at daemon start so only new activity shows.
    pub fn skip_to_end(&mut self) -> u64 {
        self.offset = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        self.offset
    }

    /// Read newly appended lines and parse each as an event.
    ///
    /// If the file has not grown (duplicate or no-op notification, or a
    /// truncation), the offset is resynchronized to the current size and
    /// nothing is yielded. Otherwise the offset advances to the new size
    /// *before* parsing, so a crash mid-parse never re-delivers bytes.
    /// Unparseable lines are dropped; a trailing line still being written
    /// may be split across two polls and lost (known gap, not buffered).
    pub fn poll(&mut self) -> Vec<RawEvent> {
        let mut file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    event = "core.ingest.open_failed",
                    path = %self.path.display(),
                    error = %e,
                );
                return Vec::new();
            }
        };

        let size = match file.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                warn!(
                    event = "core.ingest.stat_failed",
                    path = %self.path.display(),
                    error = %e,
                );
                return Vec::new();
            }
        };

        if size <= self.offset {
            // Duplicate/no-op notification, or the file shrank underneath us.
            self.offset = size;
            return Vec::new();
        }

        let start = self.offset;
        let len = (size - start) as usize;
        // Advance before parsing: already-claimed bytes are never re-read.
        self.offset = size;

        if file.seek(SeekFrom::Start(start)).is_err() {
            return Vec::new();
        }
        let mut buf = vec![0u8; len];
        if let Err(e) = file.read_exact(&mut buf) {
            warn!(
                event = "core.ingest.read_failed",
                path = %self.path.display(),
                error = %e,
            );
            return Vec::new();
        }

        let text = String::from_utf8_lossy(&buf);
        let mut events = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEvent>(trimmed) {
                Ok(event) => events.push(event),
                Err(e) => {
                    debug!(
                        event = "core.ingest.line_dropped",
                        error = %e,
                    );
                }
            }
        }
        events
    }
}
