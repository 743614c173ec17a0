//! Domain types for tracked agents.

use aviary_protocol::{AgentInfo, AgentRole, AgentStatus};

use crate::ring::RingBuffer;

/// Number of recent file paths kept per agent for role inference.
pub const FILE_HISTORY_CAPACITY: usize = 30;

/// Where an agent's display label came from. A label only ever moves away
/// from `Placeholder`; inference never replaces a task- or team-derived
/// label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Placeholder,
    Inferred,
    Task,
    Team,
}

/// Optional attributes applied when an agent is first seen or updated.
#[derive(Debug, Default, Clone)]
pub struct AgentHints {
    pub label: Option<String>,
    pub label_source: Option<LabelSource>,
    pub role: Option<AgentRole>,
    pub cwd: Option<String>,
}

/// A tracked unit of activity: one session or team member.
///
/// Created on first reference, mutated only by the reconciliation pass,
/// never destroyed.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: String,
    pub short_id: String,
    pub label: String,
    pub label_source: LabelSource,
    pub role: AgentRole,
    pub color: String,
    pub status: AgentStatus,
    /// Epoch ms of the last transition into an active status. Only advances.
    pub status_set_at: u64,
    pub last_tool: Option<String>,
    pub last_file: Option<String>,
    pub last_active: u64,
    pub tokens: u64,
    pub tool_calls: u64,
    pub cwd: Option<String>,
    /// Last 30 file paths this agent touched, oldest evicted first.
    pub file_paths: RingBuffer<String>,
    pub team_name: Option<String>,
    pub team_member_name: Option<String>,
    pub agent_type: Option<String>,
    pub spawn_prompt: Option<String>,
    pub created_at: u64,
}

/// Display truncation of a session id.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Placeholder display label derived from the id.
pub fn placeholder_label(id: &str) -> String {
    format!("agent-{}", short_id(id))
}

impl Agent {
    pub fn new(id: &str, color: String, now: u64) -> Self {
        Self {
            id: id.to_string(),
            short_id: short_id(id),
            label: placeholder_label(id),
            label_source: LabelSource::Placeholder,
            role: AgentRole::Worker,
            color,
            status: AgentStatus::Idle,
            status_set_at: 0,
            last_tool: None,
            last_file: None,
            last_active: now,
            tokens: 0,
            tool_calls: 0,
            cwd: None,
            file_paths: RingBuffer::new(FILE_HISTORY_CAPACITY),
            team_name: None,
            team_member_name: None,
            agent_type: None,
            spawn_prompt: None,
            created_at: now,
        }
    }

    pub fn is_placeholder_label(&self) -> bool {
        self.label_source == LabelSource::Placeholder
    }

    /// Apply a label. Non-placeholder labels are never overwritten back,
    /// and inference may only replace a placeholder.
    ///
    /// Returns `true` if the label changed.
    pub fn set_label(&mut self, label: &str, source: LabelSource) -> bool {
        if source == LabelSource::Placeholder || !self.is_placeholder_label() {
            return false;
        }
        self.label = label.to_string();
        self.label_source = source;
        true
    }

    /// Record a touched file path in the bounded history.
    pub fn record_file(&mut self, path: &str) {
        self.last_file = Some(path.to_string());
        self.file_paths.push(path.to_string());
    }

    /// Stamp a transition into an active status. `status_set_at` only
    /// advances forward.
    pub fn set_active_status(&mut self, status: AgentStatus, now: u64) {
        self.status = status;
        if now > self.status_set_at {
            self.status_set_at = now;
        }
    }

    /// Project into the subscriber-facing wire type.
    pub fn to_info(&self) -> AgentInfo {
        AgentInfo {
            id: self.id.clone(),
            short_id: self.short_id.clone(),
            label: self.label.clone(),
            role: self.role,
            color: self.color.clone(),
            status: self.status,
            status_set_at: self.status_set_at,
            last_tool: self.last_tool.clone(),
            last_file: self.last_file.clone(),
            last_active: self.last_active,
            tokens: self.tokens,
            tool_calls: self.tool_calls,
            cwd: self.cwd.clone(),
            team_name: self.team_name.clone(),
            team_member_name: self.team_member_name.clone(),
            agent_type: self.agent_type.clone(),
            spawn_prompt: self.spawn_prompt.clone(),
        }
    }
}
