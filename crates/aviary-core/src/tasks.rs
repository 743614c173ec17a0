//! Delegation correlation.
//!
//! A `Task` delegation and the session it spawns never carry each other's
//! identity. The matcher bridges them: delegations queue a pending record,
//! and the next session-start within the eligibility window claims the most
//! recent one from a different originator.

use std::collections::VecDeque;

use tracing::debug;

/// Maximum age of a pending delegation still eligible for matching.
pub const MATCH_WINDOW_MS: u64 = 15_000;

/// Placeholder recipient for delegation messages until correlation
/// resolves the spawned session's id.
pub const PLACEHOLDER_RECIPIENT: &str = "subagent";

const SUMMARY_VERBATIM_CHARS: usize = 32;
const SUMMARY_TRUNCATE_CHARS: usize = 40;

/// An unmatched delegation awaiting its session-start.
#[derive(Debug, Clone)]
pub struct PendingTask {
    /// Delegating agent id.
    pub from: String,
    /// Compact display label computed from the description.
    pub label: String,
    pub full_description: String,
    pub cwd: Option<String>,
    /// Epoch ms the delegation was observed.
    pub timestamp: u64,
    /// Id of the placeholder-addressed message to rewrite on match.
    pub message_id: String,
}

/// FIFO queue of pending delegations.
///
/// Entries older than the eligibility window are never explicitly expired;
/// they simply become unmatchable.
#[derive(Debug, Default)]
pub struct TaskMatcher {
    pending: VecDeque<PendingTask>,
}

impl TaskMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: PendingTask) {
        debug!(
            event = "core.tasks.pending_pushed",
            from = %task.from,
            label = %task.label,
        );
        self.pending.push_back(task);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Match a newly started session against the queue.
    ///
    /// Takes the most recent entry younger than the window whose originator
    /// differs from the new session. The matched entry is removed.
    pub fn match_session_start(&mut self, new_session_id: &str, now: u64) -> Option<PendingTask> {
        let index = self.pending.iter().rposition(|task| {
            now.saturating_sub(task.timestamp) < MATCH_WINDOW_MS && task.from != new_session_id
        })?;
        let task = self.pending.remove(index)?;
        debug!(
            event = "core.tasks.delegation_matched",
            from = %task.from,
            to = new_session_id,
            label = %task.label,
        );
        Some(task)
    }
}

/// Compact display label for a task description.
///
/// Takes the first sentence/clause up to a terminator; descriptions of 32
/// characters or fewer pass through verbatim, longer ones are cut at the
/// last word boundary before 40 characters with an ellipsis appended.
pub fn summarize_task(description: &str) -> String {
    let first_clause = description
        .split(['.', '!', '?', '\n'])
        .next()
        .unwrap_or("")
        .trim();

    if first_clause.chars().count() <= SUMMARY_VERBATIM_CHARS {
        return first_clause.to_string();
    }

    let prefix: String = first_clause.chars().take(SUMMARY_TRUNCATE_CHARS).collect();
    let cut = prefix.rfind(' ').unwrap_or(prefix.len());
    let mut label = prefix[..cut].trim_end().to_string();
    label.push('…');
    label
}
