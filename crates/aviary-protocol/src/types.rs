use serde::{Deserialize, Serialize};

/// Displayed status of a tracked agent.
///
/// Derived from the hook-event stream by the status resolver; `thinking`
/// only replaces an active status after the hysteresis hold elapses.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Starting,
    Idle,
    Reading,
    Writing,
    ToolCall,
    Delegating,
    Thinking,
    Blocked,
    Done,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Starting => write!(f, "starting"),
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Reading => write!(f, "reading"),
            AgentStatus::Writing => write!(f, "writing"),
            AgentStatus::ToolCall => write!(f, "tool_call"),
            AgentStatus::Delegating => write!(f, "delegating"),
            AgentStatus::Thinking => write!(f, "thinking"),
            AgentStatus::Blocked => write!(f, "blocked"),
            AgentStatus::Done => write!(f, "done"),
        }
    }
}

/// Role of an agent within the swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Lead,
    Worker,
    Subagent,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Lead => write!(f, "lead"),
            AgentRole::Worker => write!(f, "worker"),
            AgentRole::Subagent => write!(f, "subagent"),
        }
    }
}

/// Wire form of a tracked agent.
///
/// This is the subscriber-facing projection; the engine keeps additional
/// bookkeeping (label provenance, bounded path history) internally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub short_id: String,
    pub label: String,
    pub role: AgentRole,
    /// Hex color assigned once at creation from the cyclic palette.
    pub color: String,
    pub status: AgentStatus,
    /// Epoch milliseconds of the last transition into an active status.
    pub status_set_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_file: Option<String>,
    /// Epoch milliseconds of the last observed activity.
    pub last_active: u64,
    pub tokens: u64,
    pub tool_calls: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_member_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_prompt: Option<String>,
}

/// A normalized activity record appended to the bounded event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub agent_id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub status: AgentStatus,
    pub activity: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub tokens: u64,
}

/// An inter-agent message surfaced to subscribers.
///
/// `to` may be the `"subagent"` placeholder until delegation correlation
/// resolves the actual recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

/// A single entry in a team member's inbox file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub read: bool,
}

/// A task record from a team's tasks directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<String>,
}

/// A team member as declared in the team's config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMemberInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

/// Team metadata as pushed in `team_update` and `snapshot` messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub members: Vec<TeamMemberInfo>,
}
