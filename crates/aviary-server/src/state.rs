//! Shared daemon state and the glue between its pipelines.
//!
//! One `AppState` behind a lock is the single mutator context: the event
//! ingest loop, the team reconciliation loop, and client requests all take
//! it in turn and apply their results atomically.

use aviary_core::{Delta, Engine, RawEvent};
use aviary_protocol::{ErrorCode, ServerMessage};
use aviary_teams::{TeamConfig, TeamDelta, TeamStore, inbox};
use tracing::warn;

use crate::broadcast::Broadcaster;

/// Number of recent messages included in the connect snapshot.
const SNAPSHOT_MESSAGES: usize = 100;

pub struct AppState {
    pub engine: Engine,
    pub teams: TeamStore,
    pub broadcaster: Broadcaster,
    snapshot_events: usize,
}

impl AppState {
    pub fn new(engine: Engine, teams: TeamStore, snapshot_events: usize) -> Self {
        Self {
            engine,
            teams,
            broadcaster: Broadcaster::new(),
            snapshot_events,
        }
    }

    fn broadcast_delta(&mut self, delta: Delta) {
        let msg = match delta {
            Delta::AgentJoined(agent) => ServerMessage::AgentJoin { agent },
            Delta::Event { record, agent } => ServerMessage::Event { record, agent },
            Delta::Message(message) => ServerMessage::Message { message },
        };
        self.broadcaster.broadcast(&msg);
    }

    /// Run one raw event through the engine and broadcast its deltas.
    pub fn apply_raw_event(&mut self, raw: &RawEvent) {
        for delta in self.engine.apply(raw) {
            self.broadcast_delta(delta);
        }
    }

    /// Feed team reconciliation diffs into the registry and fan them out.
    pub fn apply_team_deltas(&mut self, deltas: Vec<TeamDelta>) {
        for delta in deltas {
            match delta {
                TeamDelta::TeamUpdated(team) => {
                    for member in &team.members {
                        let is_lead = TeamConfig::is_lead(member);
                        if let Some(join) =
                            self.engine.register_team_member(&team.name, member, is_lead)
                        {
                            self.broadcast_delta(join);
                        }
                    }
                    self.broadcaster.broadcast(&ServerMessage::TeamUpdate { team });
                }
                TeamDelta::InboxAppended {
                    team,
                    member,
                    messages,
                } => {
                    // Messages with a recognizable sender also show up as
                    // visual inter-agent messages, resolved to known agent
                    // ids within the team where possible.
                    for message in &messages {
                        if !message.from.is_empty() {
                            let from = self.engine.resolve_team_name(&team, &message.from);
                            let to = self.engine.resolve_team_name(&team, &member);
                            let delta = self.engine.record_team_message(&from, &to, &message.text);
                            self.broadcast_delta(delta);
                        }
                    }
                    self.broadcaster.broadcast(&ServerMessage::InboxUpdate {
                        team,
                        member,
                        messages,
                    });
                }
                TeamDelta::TasksUpdated { team, tasks } => {
                    self.broadcaster
                        .broadcast(&ServerMessage::TaskUpdate { team, tasks });
                }
            }
        }
    }

    /// The full-state message sent to a subscriber on connect.
    pub fn snapshot_message(&self) -> ServerMessage {
        ServerMessage::Snapshot {
            agents: self.engine.snapshot_agents(),
            events: self.engine.events_tail(self.snapshot_events),
            messages: self.engine.messages_tail(SNAPSHOT_MESSAGES),
            teams: self.teams.team_infos(),
        }
    }

    /// Pure read-side composition of one agent's full context.
    pub fn agent_context(&self, request_id: &str, agent_id: &str) -> ServerMessage {
        let Some(agent) = self.engine.registry().get(agent_id) else {
            return ServerMessage::Error {
                id: request_id.to_string(),
                code: ErrorCode::AgentNotFound,
                message: format!("No agent with id '{agent_id}'"),
            };
        };

        let mut candidates: Vec<&str> = Vec::new();
        if let Some(member) = agent.team_member_name.as_deref() {
            candidates.push(member);
        }
        candidates.push(agent.label.as_str());
        candidates.push(agent.id.as_str());

        let (inbox, tasks, team) = match agent.team_name.as_deref() {
            Some(team_name) => (
                self.teams.inbox_for(team_name, &candidates),
                self.teams.tasks_owned_by(team_name, &candidates),
                self.teams.team(team_name).map(|t| t.to_team_info()),
            ),
            None => {
                // Uncorrelated agent: search every team for an inbox under
                // its label or raw id.
                let found = self
                    .teams
                    .teams()
                    .map(|t| t.config.name.clone())
                    .find(|name| !self.teams.inbox_for(name, &candidates).is_empty());
                match found {
                    Some(name) => (
                        self.teams.inbox_for(&name, &candidates),
                        self.teams.tasks_owned_by(&name, &candidates),
                        None,
                    ),
                    None => (Vec::new(), Vec::new(), None),
                }
            }
        };

        ServerMessage::AgentContext {
            id: request_id.to_string(),
            agent: agent.to_info(),
            inbox,
            tasks,
            team,
        }
    }

    /// Append a message to a member's inbox on behalf of a subscriber.
    pub fn post_inbox(
        &mut self,
        request_id: &str,
        team: &str,
        member: &str,
        from: &str,
        text: &str,
    ) -> ServerMessage {
        match inbox::append_message(self.teams.paths(), team, member, from, text) {
            Ok(()) => ServerMessage::Ack {
                id: request_id.to_string(),
            },
            Err(e) => {
                warn!(
                    event = "server.state.inbox_write_failed",
                    team = team,
                    member = member,
                    error = %e,
                );
                ServerMessage::Error {
                    id: request_id.to_string(),
                    code: ErrorCode::InboxWriteFailed,
                    message: e.to_string(),
                }
            }
        }
    }
}
