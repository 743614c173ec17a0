//! Hysteresis state machine for displayed agent status.
//!
//! Rapid tool-call sequences would otherwise flicker into "thinking"
//! between each call; an active status therefore holds for a minimum
//! dwell time before a passive status may replace it.

use aviary_protocol::AgentStatus;

use crate::agents::types::Agent;
use crate::events::EventKind;

/// Default minimum dwell of an active status, in milliseconds.
pub const DEFAULT_HOLD_MS: u64 = 3000;

const READ_TOOLS: &[&str] = &[
    "Read",
    "Glob",
    "Grep",
    "LS",
    "NotebookRead",
    "WebFetch",
    "WebSearch",
];
const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];
const DELEGATE_TOOLS: &[&str] = &["Task", "SendMessage"];

/// Computes an agent's displayed status from the event sequence.
#[derive(Debug, Clone, Copy)]
pub struct StatusResolver {
    hold_ms: u64,
}

impl Default for StatusResolver {
    fn default() -> Self {
        Self {
            hold_ms: DEFAULT_HOLD_MS,
        }
    }
}

impl StatusResolver {
    pub fn new(hold_ms: u64) -> Self {
        Self { hold_ms }
    }

    /// The active status a tool name maps to.
    pub fn active_status_for_tool(tool: &str) -> AgentStatus {
        if READ_TOOLS.contains(&tool) {
            AgentStatus::Reading
        } else if WRITE_TOOLS.contains(&tool) {
            AgentStatus::Writing
        } else if DELEGATE_TOOLS.contains(&tool) {
            AgentStatus::Delegating
        } else {
            AgentStatus::ToolCall
        }
    }

    /// Apply one event to the agent's status.
    ///
    /// Pre-tool events stamp an active status; post-tool events transition
    /// to `thinking` only once the hold has elapsed. Unrecognized kinds
    /// leave the status unchanged.
    pub fn apply(&self, agent: &mut Agent, kind: EventKind, tool: Option<&str>, now: u64) {
        match kind {
            EventKind::PreTool => {
                let status = Self::active_status_for_tool(tool.unwrap_or(""));
                agent.set_active_status(status, now);
            }
            EventKind::PostTool => {
                if now.saturating_sub(agent.status_set_at) >= self.hold_ms {
                    agent.status = AgentStatus::Thinking;
                }
                // Within the hold window the prior active status is more
                // informative than "thinking"; leave it.
            }
            EventKind::Stop | EventKind::SubagentStop | EventKind::TaskDone => {
                agent.status = AgentStatus::Done;
            }
            EventKind::SessionStart => {
                agent.status = AgentStatus::Starting;
            }
            EventKind::Unknown => {}
        }
    }
}
