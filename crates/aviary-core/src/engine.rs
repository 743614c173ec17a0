//! The reconciliation pass.
//!
//! One raw event in, a batch of state deltas out. The engine owns all
//! mutable state (registry, pending delegations, history rings) and is
//! driven from exactly one context at a time; the daemon holds it behind
//! a lock and applies results atomically.

use std::sync::Arc;

use aviary_protocol::{AgentInfo, AgentMessage, AgentRole, EventRecord, TeamMemberInfo};
use tracing::debug;

use crate::agents::registry::AgentRegistry;
use crate::agents::types::{AgentHints, LabelSource};
use crate::clock::Clock;
use crate::events::{EventKind, RawEvent};
use crate::ids::IdSource;
use crate::palette;
use crate::ring::RingBuffer;
use crate::roles;
use crate::status::{DEFAULT_HOLD_MS, StatusResolver};
use crate::tasks::{PLACEHOLDER_RECIPIENT, PendingTask, TaskMatcher, summarize_task};

/// Default capacity of the event history ring.
pub const DEFAULT_EVENTS_CAPACITY: usize = 500;
/// Default capacity of the message history ring.
pub const DEFAULT_MESSAGES_CAPACITY: usize = 100;

/// A state change produced by one reconciliation pass, ready to broadcast.
#[derive(Debug, Clone)]
pub enum Delta {
    /// A new agent appeared or an existing one was relabeled.
    AgentJoined(AgentInfo),
    /// A normalized activity record plus the updated agent.
    Event {
        record: EventRecord,
        agent: AgentInfo,
    },
    /// An inter-agent message was created or its recipient resolved.
    Message(AgentMessage),
}

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub hold_ms: u64,
    pub events_capacity: usize,
    pub messages_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hold_ms: DEFAULT_HOLD_MS,
            events_capacity: DEFAULT_EVENTS_CAPACITY,
            messages_capacity: DEFAULT_MESSAGES_CAPACITY,
        }
    }
}

/// Stateful reconciliation engine over the raw event stream.
pub struct Engine {
    registry: AgentRegistry,
    matcher: TaskMatcher,
    resolver: StatusResolver,
    events: RingBuffer<EventRecord>,
    messages: RingBuffer<AgentMessage>,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdSource>,
}

impl Engine {
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>, ids: Box<dyn IdSource>) -> Self {
        Self {
            registry: AgentRegistry::new(),
            matcher: TaskMatcher::new(),
            resolver: StatusResolver::new(config.hold_ms),
            events: RingBuffer::new(config.events_capacity),
            messages: RingBuffer::new(config.messages_capacity),
            clock,
            ids,
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Apply one raw event and return the deltas to broadcast.
    ///
    /// Events without a session id cannot be attributed and are dropped.
    pub fn apply(&mut self, raw: &RawEvent) -> Vec<Delta> {
        let Some(session_id) = raw.session_id.clone() else {
            debug!(event = "core.engine.event_without_session_dropped");
            return Vec::new();
        };
        let kind = raw.kind();
        let now = self.clock.now_ms();
        let mut deltas = Vec::new();

        let hints = AgentHints {
            cwd: raw.cwd.clone(),
            ..Default::default()
        };
        let (created, agent) = self.registry.get_or_create(&session_id, hints, now);
        if created {
            deltas.push(Delta::AgentJoined(agent.to_info()));
        }

        self.resolver.apply(agent, kind, raw.tool(), now);
        agent.last_active = now;

        let mut activity = default_activity(kind, raw.tool(), raw.file_path().as_deref());

        match kind {
            EventKind::PreTool => {
                agent.tool_calls += 1;
                agent.tokens += raw.estimated_tokens();
                if let Some(tool) = raw.tool() {
                    agent.last_tool = Some(tool.to_string());
                }
                if let Some(file) = raw.file_path() {
                    agent.record_file(&file);
                    if agent.is_placeholder_label() {
                        let paths: Vec<&str> =
                            agent.file_paths.iter().map(String::as_str).collect();
                        if let Some(label) = roles::infer_role_label(paths) {
                            agent.set_label(label, LabelSource::Inferred);
                        }
                    }
                }
            }
            EventKind::PostTool => {
                agent.tokens += raw.estimated_tokens();
            }
            _ => {}
        }

        // Delegation: queue a pending task and announce it to the
        // placeholder recipient.
        if kind == EventKind::PreTool
            && raw.tool() == Some("Task")
            && let Some(description) = raw.description()
            && !description.trim().is_empty()
        {
            let label = summarize_task(description);
            activity = format!("Delegating: {label}");
            let message_id = self.ids.next_id();
            let message = AgentMessage {
                id: message_id.clone(),
                from: session_id.clone(),
                to: PLACEHOLDER_RECIPIENT.to_string(),
                text: label.clone(),
                timestamp: now,
            };
            self.messages.push(message.clone());
            deltas.push(Delta::Message(message));
            self.matcher.push(PendingTask {
                from: session_id.clone(),
                label,
                full_description: description.to_string(),
                cwd: raw.cwd.clone(),
                timestamp: now,
                message_id,
            });
        }

        // Session start: claim the freshest pending delegation from a
        // different originator and resolve its placeholder message.
        if kind == EventKind::SessionStart
            && let Some(task) = self.matcher.match_session_start(&session_id, now)
        {
            let agent = self
                .registry
                .get_mut(&session_id)
                .expect("agent created above");
            agent.set_label(&task.label, LabelSource::Task);
            if agent.role == AgentRole::Worker {
                agent.role = AgentRole::Subagent;
            }
            if agent.cwd.is_none() {
                agent.cwd = task.cwd.clone();
            }
            let mut resolved = None;
            for message in self.messages.iter_mut() {
                if message.id == task.message_id {
                    message.to = session_id.clone();
                    resolved = Some(message.clone());
                    break;
                }
            }
            if let Some(message) = resolved {
                deltas.push(Delta::Message(message));
            }
            // Label changed: announce the agent again.
            deltas.push(Delta::AgentJoined(agent.to_info()));
        }

        if kind != EventKind::Unknown {
            let agent = self.registry.get(&session_id).expect("agent created above");
            let record = EventRecord {
                id: self.ids.next_id(),
                agent_id: session_id.clone(),
                kind: kind.as_str().to_string(),
                tool: raw.tool().map(str::to_string),
                file: raw.file_path(),
                status: agent.status,
                activity,
                timestamp: now,
                tokens: raw.estimated_tokens(),
            };
            self.events.push(record.clone());
            deltas.push(Delta::Event {
                record,
                agent: agent.to_info(),
            });
        }

        deltas
    }

    /// Register or update an agent discovered through team membership.
    ///
    /// Conservative label/role rules apply, but team-scoped fields (team
    /// name, member name, agent type, color, spawn prompt) are always
    /// refreshed. Returns an `AgentJoin` delta when the agent is new or
    /// was relabeled.
    pub fn register_team_member(
        &mut self,
        team: &str,
        member: &TeamMemberInfo,
        is_lead: bool,
    ) -> Option<Delta> {
        let id = member
            .agent_id
            .clone()
            .unwrap_or_else(|| format!("{}@{}", member.name, team));
        let now = self.clock.now_ms();
        let hints = AgentHints {
            label: Some(member.name.clone()),
            label_source: Some(LabelSource::Team),
            role: Some(if is_lead {
                AgentRole::Lead
            } else {
                AgentRole::Worker
            }),
            cwd: member.cwd.clone(),
        };
        let (created, agent) = self.registry.get_or_create(&id, hints, now);
        let label_before = agent.label.clone();
        agent.set_label(&member.name, LabelSource::Team);

        agent.team_name = Some(team.to_string());
        agent.team_member_name = Some(member.name.clone());
        agent.agent_type = member.agent_type.clone();
        agent.spawn_prompt = member.prompt.clone();
        if let Some(color) = member.color.as_deref()
            && let Some(hex) = palette::color_from_name(color)
        {
            agent.color = hex.to_string();
        }

        (created || agent.label != label_before).then(|| Delta::AgentJoined(agent.to_info()))
    }

    /// Materialize an inter-agent message observed in a team inbox.
    pub fn record_team_message(&mut self, from: &str, to: &str, text: &str) -> Delta {
        let message = AgentMessage {
            id: self.ids.next_id(),
            from: from.to_string(),
            to: to.to_string(),
            text: text.to_string(),
            timestamp: self.clock.now_ms(),
        };
        self.messages.push(message.clone());
        Delta::Message(message)
    }

    /// Resolve a team-scoped display name to a known agent id, falling
    /// back to the raw name.
    pub fn resolve_team_name(&self, team: &str, name: &str) -> String {
        self.registry
            .resolve_name(Some(team), name)
            .map(|a| a.id.clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// All agents, in creation order, as wire records.
    pub fn snapshot_agents(&self) -> Vec<AgentInfo> {
        self.registry.iter().map(|a| a.to_info()).collect()
    }

    /// The most recent `n` event records, oldest first.
    pub fn events_tail(&self, n: usize) -> Vec<EventRecord> {
        self.events.tail(n).cloned().collect()
    }

    /// The most recent `n` messages, oldest first.
    pub fn messages_tail(&self, n: usize) -> Vec<AgentMessage> {
        self.messages.tail(n).cloned().collect()
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn default_activity(kind: EventKind, tool: Option<&str>, file: Option<&str>) -> String {
    match kind {
        EventKind::SessionStart => "Session started".to_string(),
        EventKind::PreTool => match (tool, file) {
            (Some(tool), Some(file)) => format!("{tool} {}", basename(file)),
            (Some(tool), None) => tool.to_string(),
            _ => "Tool call".to_string(),
        },
        EventKind::PostTool => match tool {
            Some(tool) => format!("Finished {tool}"),
            None => "Finished tool".to_string(),
        },
        EventKind::Stop => "Session stopped".to_string(),
        EventKind::SubagentStop => "Subagent stopped".to_string(),
        EventKind::TaskDone => "Task completed".to_string(),
        EventKind::Unknown => String::new(),
    }
}
