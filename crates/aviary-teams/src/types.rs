//! Domain types for team state.
//!
//! Our own types decoupled from the on-disk JSON format. Raw serde types
//! live in `parser.rs`.

use std::collections::BTreeMap;

use aviary_protocol::{InboxMessage, TaskRecord, TeamInfo, TeamMemberInfo};

/// Parsed team configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamConfig {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<TeamMemberInfo>,
}

impl TeamConfig {
    /// Whether a member acts as the team lead.
    pub fn is_lead(member: &TeamMemberInfo) -> bool {
        member.name == "team-lead" || member.agent_type.as_deref() == Some("team-lead")
    }
}

/// Full reconciled state of one team: config plus the last observed
/// inbox and task snapshots.
#[derive(Debug, Clone, Default)]
pub struct TeamSnapshot {
    pub config: TeamConfig,
    /// Member name -> ordered (append-only) inbox contents.
    pub inboxes: BTreeMap<String, Vec<InboxMessage>>,
    /// Task id -> task record.
    pub tasks: BTreeMap<String, TaskRecord>,
}

impl TeamSnapshot {
    pub fn to_team_info(&self) -> TeamInfo {
        TeamInfo {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            members: self.config.members.clone(),
        }
    }

    pub fn tasks_vec(&self) -> Vec<TaskRecord> {
        self.tasks.values().cloned().collect()
    }
}

/// A diff produced by one team reconciliation pass.
#[derive(Debug, Clone)]
pub enum TeamDelta {
    /// The team's configuration changed (or was seen for the first time).
    TeamUpdated(TeamInfo),
    /// Entries appended to one member's inbox since the prior snapshot.
    InboxAppended {
        team: String,
        member: String,
        messages: Vec<InboxMessage>,
    },
    /// The team's task list changed; carries the full new list.
    TasksUpdated {
        team: String,
        tasks: Vec<TaskRecord>,
    },
}
