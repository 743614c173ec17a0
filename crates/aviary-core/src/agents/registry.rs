//! Owned map of known agents.
//!
//! Explicit state passed by reference into the reconciliation pass, not
//! ambient module globals, so tests can construct isolated registries.

use std::collections::HashMap;

use aviary_protocol::AgentRole;
use tracing::debug;

use crate::agents::types::{Agent, AgentHints, LabelSource};
use crate::palette::Palette;

/// Registry of all agents seen this process lifetime. No deletion
/// operation exists; agent count stays small in practice.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Agent>,
    palette: Palette,
    /// Creation order, for stable snapshot output.
    order: Vec<String>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an agent by id, creating it on first reference.
    ///
    /// On creation the agent gets the next cyclic palette color, status
    /// `idle`, and label/role from the hints (placeholder/`worker` when
    /// absent). On an existing agent, hints apply conservatively: a hinted
    /// label only overwrites a still-placeholder label, a hinted role only
    /// overwrites a still-default `worker` role.
    ///
    /// Returns `(created, agent)`; the caller emits the creation
    /// notification exactly once, when `created` is true.
    pub fn get_or_create(&mut self, id: &str, hints: AgentHints, now: u64) -> (bool, &mut Agent) {
        let created = !self.agents.contains_key(id);
        if created {
            let color = self.palette.next_color();
            let mut agent = Agent::new(id, color, now);
            if let Some(label) = &hints.label {
                agent.set_label(label, hints.label_source.unwrap_or(LabelSource::Team));
            }
            if let Some(role) = hints.role {
                agent.role = role;
            }
            if hints.cwd.is_some() {
                agent.cwd = hints.cwd.clone();
            }
            debug!(
                event = "core.registry.agent_created",
                agent_id = id,
                label = %agent.label,
            );
            self.agents.insert(id.to_string(), agent);
            self.order.push(id.to_string());
        } else {
            let agent = self.agents.get_mut(id).expect("agent present");
            if let Some(label) = &hints.label {
                agent.set_label(label, hints.label_source.unwrap_or(LabelSource::Team));
            }
            if let Some(role) = hints.role
                && agent.role == AgentRole::Worker
            {
                agent.role = role;
            }
            if agent.cwd.is_none() && hints.cwd.is_some() {
                agent.cwd = hints.cwd.clone();
            }
        }
        (created, self.agents.get_mut(id).expect("agent present"))
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All agents in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    /// Resolve a team member name to an agent id within one team.
    pub fn find_team_member(&self, team: &str, member: &str) -> Option<&Agent> {
        self.iter().find(|a| {
            a.team_name.as_deref() == Some(team) && a.team_member_name.as_deref() == Some(member)
        })
    }

    /// Resolve a display name to an agent: team member name first, then
    /// label, then raw id.
    pub fn resolve_name(&self, team: Option<&str>, name: &str) -> Option<&Agent> {
        if let Some(team) = team
            && let Some(agent) = self.find_team_member(team, name)
        {
            return Some(agent);
        }
        self.iter()
            .find(|a| a.label == name)
            .or_else(|| self.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTE;

    #[test]
    fn test_create_on_first_reference() {
        let mut registry = AgentRegistry::new();
        let (created, agent) = registry.get_or_create("s1", AgentHints::default(), 100);
        assert!(created);
        assert_eq!(agent.id, "s1");
        assert_eq!(agent.color, PALETTE[0]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_second_lookup_not_created() {
        let mut registry = AgentRegistry::new();
        registry.get_or_create("s1", AgentHints::default(), 100);
        let (created, _) = registry.get_or_create("s1", AgentHints::default(), 200);
        assert!(!created);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_colors_assigned_cyclically() {
        let mut registry = AgentRegistry::new();
        for i in 0..PALETTE.len() + 1 {
            registry.get_or_create(&format!("s{i}"), AgentHints::default(), 0);
        }
        let first = registry.get("s0").unwrap();
        let wrapped = registry.get(&format!("s{}", PALETTE.len())).unwrap();
        assert_eq!(first.color, wrapped.color);
    }

    #[test]
    fn test_hinted_label_on_create() {
        let mut registry = AgentRegistry::new();
        let hints = AgentHints {
            label: Some("researcher".to_string()),
            label_source: Some(LabelSource::Team),
            ..Default::default()
        };
        let (_, agent) = registry.get_or_create("s1", hints, 0);
        assert_eq!(agent.label, "researcher");
    }

    #[test]
    fn test_hinted_label_does_not_overwrite_existing() {
        let mut registry = AgentRegistry::new();
        let hints = AgentHints {
            label: Some("researcher".to_string()),
            label_source: Some(LabelSource::Team),
            ..Default::default()
        };
        registry.get_or_create("s1", hints, 0);
        let hints2 = AgentHints {
            label: Some("other-name".to_string()),
            label_source: Some(LabelSource::Team),
            ..Default::default()
        };
        let (_, agent) = registry.get_or_create("s1", hints2, 0);
        assert_eq!(agent.label, "researcher");
    }

    #[test]
    fn test_hinted_role_only_overwrites_default() {
        let mut registry = AgentRegistry::new();
        let hints = AgentHints {
            role: Some(AgentRole::Lead),
            ..Default::default()
        };
        registry.get_or_create("s1", hints, 0);
        let hints2 = AgentHints {
            role: Some(AgentRole::Subagent),
            ..Default::default()
        };
        let (_, agent) = registry.get_or_create("s1", hints2, 0);
        assert_eq!(agent.role, AgentRole::Lead);
    }

    #[test]
    fn test_iter_preserves_creation_order() {
        let mut registry = AgentRegistry::new();
        registry.get_or_create("b", AgentHints::default(), 0);
        registry.get_or_create("a", AgentHints::default(), 0);
        registry.get_or_create("c", AgentHints::default(), 0);
        let ids: Vec<_> = registry.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_find_team_member() {
        let mut registry = AgentRegistry::new();
        let (_, agent) = registry.get_or_create("researcher@team-x", AgentHints::default(), 0);
        agent.team_name = Some("team-x".to_string());
        agent.team_member_name = Some("researcher".to_string());
        assert!(registry.find_team_member("team-x", "researcher").is_some());
        assert!(registry.find_team_member("team-y", "researcher").is_none());
    }

    #[test]
    fn test_resolve_name_falls_back_to_label_then_id() {
        let mut registry = AgentRegistry::new();
        let (_, agent) = registry.get_or_create("s1", AgentHints::default(), 0);
        agent.set_label("Refactor API layer", LabelSource::Task);
        assert_eq!(
            registry
                .resolve_name(None, "Refactor API layer")
                .map(|a| a.id.as_str()),
            Some("s1")
        );
        assert_eq!(
            registry.resolve_name(None, "s1").map(|a| a.id.as_str()),
            Some("s1")
        );
        assert!(registry.resolve_name(None, "missing").is_none());
    }
}
