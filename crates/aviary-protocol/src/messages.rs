use serde::{Deserialize, Serialize};

use crate::types::{AgentInfo, AgentMessage, EventRecord, InboxMessage, TaskRecord, TeamInfo};

/// Error codes returned by the daemon in error responses.
///
/// Unknown codes from future daemon versions deserialize to `Unknown`
/// via `#[serde(other)]`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AgentNotFound,
    TeamNotFound,
    InboxWriteFailed,
    ProtocolError,
    IoError,
    SerializationError,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::AgentNotFound => write!(f, "agent_not_found"),
            ErrorCode::TeamNotFound => write!(f, "team_not_found"),
            ErrorCode::InboxWriteFailed => write!(f, "inbox_write_failed"),
            ErrorCode::ProtocolError => write!(f, "protocol_error"),
            ErrorCode::IoError => write!(f, "io_error"),
            ErrorCode::SerializationError => write!(f, "serialization_error"),
            ErrorCode::Unknown => write!(f, "unknown"),
        }
    }
}

/// Subscriber -> Daemon request messages.
///
/// Each variant maps to a JSONL message with `"type"` as the tag field.
/// All requests carry an `id` field for response correlation. Subscribing
/// itself is implicit: connecting to the socket delivers a `snapshot`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Request the full context for one agent (record, inbox, tasks, team).
    #[serde(rename = "get_agent_context")]
    GetAgentContext { id: String, agent_id: String },

    /// Append a message to a team member's inbox file (atomic write).
    #[serde(rename = "post_inbox")]
    PostInbox {
        id: String,
        team: String,
        member: String,
        #[serde(default)]
        from: String,
        text: String,
    },

    #[serde(rename = "ping")]
    Ping { id: String },
}

impl ClientMessage {
    /// Extract the request ID from any client message.
    pub fn id(&self) -> &str {
        match self {
            ClientMessage::GetAgentContext { id, .. }
            | ClientMessage::PostInbox { id, .. }
            | ClientMessage::Ping { id } => id,
        }
    }
}

/// Daemon -> Subscriber push and response messages.
///
/// Response messages echo the request `id`. Push messages have no `id`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full current state, sent once on connect. Late subscribers converge
    /// from this without replaying history.
    #[serde(rename = "snapshot")]
    Snapshot {
        agents: Vec<AgentInfo>,
        events: Vec<EventRecord>,
        messages: Vec<AgentMessage>,
        teams: Vec<TeamInfo>,
    },

    /// A new agent appeared, or an existing agent was relabeled.
    #[serde(rename = "agent_join")]
    AgentJoin { agent: AgentInfo },

    /// A normalized activity record plus the updated agent.
    #[serde(rename = "event")]
    Event {
        record: EventRecord,
        agent: AgentInfo,
    },

    /// An inter-agent message (delegation or inbox-derived).
    #[serde(rename = "message")]
    Message { message: AgentMessage },

    /// Response to `get_agent_context`.
    #[serde(rename = "agent_context")]
    AgentContext {
        id: String,
        agent: AgentInfo,
        inbox: Vec<InboxMessage>,
        tasks: Vec<TaskRecord>,
        #[serde(skip_serializing_if = "Option::is_none")]
        team: Option<TeamInfo>,
    },

    /// New inbox entries observed for one team member.
    #[serde(rename = "inbox_update")]
    InboxUpdate {
        team: String,
        member: String,
        messages: Vec<InboxMessage>,
    },

    /// A team's configuration changed.
    #[serde(rename = "team_update")]
    TeamUpdate { team: TeamInfo },

    /// A team's task list was re-read.
    #[serde(rename = "task_update")]
    TaskUpdate {
        team: String,
        tasks: Vec<TaskRecord>,
    },

    #[serde(rename = "error")]
    Error {
        id: String,
        code: ErrorCode,
        message: String,
    },

    #[serde(rename = "ack")]
    Ack { id: String },

    #[serde(rename = "pong")]
    Pong { id: String },
}
