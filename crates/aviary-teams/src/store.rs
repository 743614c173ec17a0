//! Directory-backed team state reconciliation.
//!
//! Holds the prior snapshot per team and re-reads config, inboxes, and
//! tasks wholesale on each reconciliation, diffing inboxes by length.
//! The append-only assumption is deliberate: "new messages = current
//! length minus previously observed length" is only correct if inbox
//! entries are never edited or removed.

use std::collections::BTreeMap;
use std::path::Path;

use aviary_paths::TeamsDir;
use aviary_protocol::{InboxMessage, TaskRecord, TeamInfo};
use tracing::{debug, info, warn};

use crate::parser;
use crate::types::{TeamDelta, TeamSnapshot};

/// Reconciles team directories against prior snapshots, emitting diffs.
///
/// A team whose files vanish simply stops updating; snapshots are never
/// deleted while the process runs.
#[derive(Debug)]
pub struct TeamStore {
    paths: TeamsDir,
    teams: BTreeMap<String, TeamSnapshot>,
}

impl TeamStore {
    pub fn new(paths: TeamsDir) -> Self {
        Self {
            paths,
            teams: BTreeMap::new(),
        }
    }

    pub fn paths(&self) -> &TeamsDir {
        &self.paths
    }

    pub fn team(&self, name: &str) -> Option<&TeamSnapshot> {
        self.teams.get(name)
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamSnapshot> {
        self.teams.values()
    }

    pub fn team_infos(&self) -> Vec<TeamInfo> {
        self.teams.values().map(|t| t.to_team_info()).collect()
    }

    /// Derive the owning team name from a changed path under the teams
    /// directory.
    pub fn team_name_for_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.paths.root()).ok()?;
        relative
            .components()
            .next()
            .and_then(|c| c.as_os_str().to_str())
            .map(str::to_string)
    }

    /// Reconcile every team directory currently present. Used at startup.
    pub fn scan(&mut self) -> Vec<TeamDelta> {
        let teams_dir = self.paths.root();
        let entries = match std::fs::read_dir(teams_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    event = "teams.store.scan_failed",
                    path = %teams_dir.display(),
                    error = %e,
                );
                return Vec::new();
            }
        };

        let mut deltas = Vec::new();
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                deltas.extend(self.reconcile_team(name));
            }
        }
        deltas
    }

    /// Re-read one team's directory and diff against the prior snapshot.
    ///
    /// Missing files are "no data yet"; malformed files keep the previous
    /// snapshot for that unit and processing continues.
    pub fn reconcile_team(&mut self, team_name: &str) -> Vec<TeamDelta> {
        let config_path = self.paths.config_file(team_name);
        let known = self.teams.contains_key(team_name);

        let config = match parser::parse_team_config(&config_path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                // No config yet (or it vanished): nothing to reconcile.
                if known {
                    debug!(
                        event = "teams.store.config_vanished",
                        team = team_name,
                    );
                }
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    event = "teams.store.config_parse_failed",
                    team = team_name,
                    error = %e,
                );
                if !known {
                    return Vec::new();
                }
                // Keep the previous config, still re-read inboxes/tasks.
                self.teams[team_name].config.clone()
            }
        };

        let mut deltas = Vec::new();

        let config_changed = self
            .teams
            .get(team_name)
            .map(|prev| prev.config != config)
            .unwrap_or(true);

        let inboxes = self.read_inboxes(team_name);
        for (member, messages) in &inboxes {
            let seen = self
                .teams
                .get(team_name)
                .and_then(|t| t.inboxes.get(member))
                .map(Vec::len)
                .unwrap_or(0);
            if messages.len() > seen {
                deltas.push(TeamDelta::InboxAppended {
                    team: config.name.clone(),
                    member: member.clone(),
                    messages: messages[seen..].to_vec(),
                });
            }
        }

        let tasks = self.read_tasks(team_name);
        let tasks_changed = self
            .teams
            .get(team_name)
            .map(|prev| prev.tasks != tasks)
            .unwrap_or(!tasks.is_empty());

        let snapshot = TeamSnapshot {
            config,
            inboxes,
            tasks,
        };

        if config_changed {
            if !known {
                info!(
                    event = "teams.store.team_discovered",
                    team = team_name,
                    members = snapshot.config.members.len(),
                );
            }
            deltas.insert(0, TeamDelta::TeamUpdated(snapshot.to_team_info()));
        }
        if tasks_changed {
            deltas.push(TeamDelta::TasksUpdated {
                team: snapshot.config.name.clone(),
                tasks: snapshot.tasks_vec(),
            });
        }

        self.teams.insert(team_name.to_string(), snapshot);
        deltas
    }

    /// Read all inbox files for a team, keeping the prior contents for
    /// any file that fails to parse.
    fn read_inboxes(&self, team_name: &str) -> BTreeMap<String, Vec<InboxMessage>> {
        let inboxes_dir = self.paths.inboxes_dir(team_name);
        let mut inboxes = BTreeMap::new();

        let entries = match std::fs::read_dir(&inboxes_dir) {
            Ok(entries) => entries,
            Err(_) => return inboxes, // no inboxes yet
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(member) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match parser::parse_inbox(&path) {
                Ok(Some(messages)) => {
                    inboxes.insert(member.to_string(), messages);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        event = "teams.store.inbox_parse_failed",
                        team = team_name,
                        member = member,
                        error = %e,
                    );
                    if let Some(prev) = self
                        .teams
                        .get(team_name)
                        .and_then(|t| t.inboxes.get(member))
                    {
                        inboxes.insert(member.to_string(), prev.clone());
                    }
                }
            }
        }
        inboxes
    }

    /// Read all task files for a team, skipping malformed ones.
    fn read_tasks(&self, team_name: &str) -> BTreeMap<String, TaskRecord> {
        let tasks_dir = self.paths.tasks_dir(team_name);
        let mut tasks = BTreeMap::new();

        let entries = match std::fs::read_dir(&tasks_dir) {
            Ok(entries) => entries,
            Err(_) => return tasks, // no tasks yet
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match parser::parse_task_file(&path) {
                Ok(Some(task)) => {
                    tasks.insert(task.id.clone(), task);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        event = "teams.store.task_parse_failed",
                        team = team_name,
                        path = %path.display(),
                        error = %e,
                    );
                }
            }
        }
        tasks
    }

    /// Resolve a member's inbox, falling back from team member name to
    /// any inbox whose name matches the given display label or raw id.
    pub fn inbox_for(&self, team_name: &str, candidates: &[&str]) -> Vec<InboxMessage> {
        let Some(team) = self.teams.get(team_name) else {
            return Vec::new();
        };
        for candidate in candidates {
            if let Some(messages) = team.inboxes.get(*candidate) {
                return messages.clone();
            }
        }
        Vec::new()
    }

    /// Tasks whose owner resolves to one of the given names.
    pub fn tasks_owned_by(&self, team_name: &str, candidates: &[&str]) -> Vec<TaskRecord> {
        let Some(team) = self.teams.get(team_name) else {
            return Vec::new();
        };
        team.tasks
            .values()
            .filter(|task| {
                task.owner
                    .as_deref()
                    .is_some_and(|owner| candidates.contains(&owner))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn fixture() -> (tempfile::TempDir, TeamsDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = TeamsDir::new(dir.path().join("teams"));
        (dir, paths)
    }

    fn write_team(paths: &TeamsDir, team: &str, config: &str) {
        let team_dir = paths.team_dir(team);
        fs::create_dir_all(&team_dir).unwrap();
        fs::write(team_dir.join("config.json"), config).unwrap();
    }

    fn write_inbox(paths: &TeamsDir, team: &str, member: &str, content: &str) {
        let dir = paths.inboxes_dir(team);
        fs::create_dir_all(&dir).unwrap();
        fs::write(paths.inbox_file(team, member), content).unwrap();
    }

    fn write_task(paths: &TeamsDir, team: &str, id: &str, content: &str) {
        let dir = paths.tasks_dir(team);
        fs::create_dir_all(&dir).unwrap();
        fs::write(paths.task_file(team, id), content).unwrap();
    }

    #[test]
    fn test_reconcile_unknown_team_without_config() {
        let (_dir, paths) = fixture();
        let mut store = TeamStore::new(paths);
        assert!(store.reconcile_team("ghost").is_empty());
        assert!(store.team("ghost").is_none());
    }

    #[test]
    fn test_reconcile_new_team_emits_team_updated() {
        let (_dir, paths) = fixture();
        write_team(
            &paths,
            "my-team",
            r#"{"description":"demo","members":[{"name":"researcher"}]}"#,
        );
        let mut store = TeamStore::new(paths);
        let deltas = store.reconcile_team("my-team");
        assert!(matches!(
            &deltas[0],
            TeamDelta::TeamUpdated(info) if info.name == "my-team" && info.members.len() == 1
        ));
        assert!(store.team("my-team").is_some());
    }

    #[test]
    fn test_reconcile_unchanged_emits_nothing() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[{"name":"a"}]}"#);
        let mut store = TeamStore::new(paths);
        store.reconcile_team("my-team");
        assert!(store.reconcile_team("my-team").is_empty());
    }

    #[test]
    fn test_inbox_diff_reports_appended_tail() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[]}"#);
        write_inbox(
            &paths,
            "my-team",
            "researcher",
            r#"[{"from":"lead","text":"one"},{"from":"lead","text":"two"}]"#,
        );
        let mut store = TeamStore::new(paths.clone());
        store.reconcile_team("my-team");

        // k -> k+3 with the same prefix: exactly the 3 new entries reported
        write_inbox(
            &paths,
            "my-team",
            "researcher",
            r#"[{"from":"lead","text":"one"},{"from":"lead","text":"two"},
                {"from":"lead","text":"three"},{"from":"a","text":"four"},{"from":"b","text":"five"}]"#,
        );
        let deltas = store.reconcile_team("my-team");
        let appended = deltas
            .iter()
            .find_map(|d| match d {
                TeamDelta::InboxAppended { member, messages, .. } => Some((member, messages)),
                _ => None,
            })
            .expect("inbox delta");
        assert_eq!(appended.0, "researcher");
        assert_eq!(appended.1.len(), 3);
        assert_eq!(appended.1[0].text, "three");
        assert_eq!(appended.1[2].text, "five");
    }

    #[test]
    fn test_first_reconcile_reports_existing_inbox_as_new() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[]}"#);
        write_inbox(
            &paths,
            "my-team",
            "researcher",
            r#"[{"from":"lead","text":"one"}]"#,
        );
        let mut store = TeamStore::new(paths);
        let deltas = store.reconcile_team("my-team");
        assert!(deltas.iter().any(|d| matches!(
            d,
            TeamDelta::InboxAppended { messages, .. } if messages.len() == 1
        )));
    }

    #[test]
    fn test_tasks_change_emits_full_list() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[]}"#);
        write_task(&paths, "my-team", "1", r#"{"id":"1","subject":"First"}"#);
        let mut store = TeamStore::new(paths.clone());
        let deltas = store.reconcile_team("my-team");
        assert!(deltas.iter().any(|d| matches!(
            d,
            TeamDelta::TasksUpdated { tasks, .. } if tasks.len() == 1
        )));

        write_task(
            &paths,
            "my-team",
            "2",
            r#"{"id":"2","subject":"Second","owner":"researcher"}"#,
        );
        let deltas = store.reconcile_team("my-team");
        let tasks = deltas
            .iter()
            .find_map(|d| match d {
                TeamDelta::TasksUpdated { tasks, .. } => Some(tasks),
                _ => None,
            })
            .expect("tasks delta");
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_malformed_inbox_keeps_previous_snapshot() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[]}"#);
        write_inbox(
            &paths,
            "my-team",
            "researcher",
            r#"[{"from":"lead","text":"one"}]"#,
        );
        let mut store = TeamStore::new(paths.clone());
        store.reconcile_team("my-team");

        write_inbox(&paths, "my-team", "researcher", "half-written garb");
        let deltas = store.reconcile_team("my-team");
        assert!(
            !deltas
                .iter()
                .any(|d| matches!(d, TeamDelta::InboxAppended { .. }))
        );
        // Previous contents retained
        let team = store.team("my-team").unwrap();
        assert_eq!(team.inboxes["researcher"].len(), 1);
    }

    #[test]
    fn test_malformed_task_skipped_others_kept() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[]}"#);
        write_task(&paths, "my-team", "1", r#"{"id":"1","subject":"Good"}"#);
        write_task(&paths, "my-team", "2", "broken json");
        let mut store = TeamStore::new(paths);
        store.reconcile_team("my-team");
        let team = store.team("my-team").unwrap();
        assert_eq!(team.tasks.len(), 1);
        assert!(team.tasks.contains_key("1"));
    }

    #[test]
    fn test_vanished_config_stops_updating_but_keeps_snapshot() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[{"name":"a"}]}"#);
        let mut store = TeamStore::new(paths.clone());
        store.reconcile_team("my-team");

        fs::remove_file(paths.config_file("my-team")).unwrap();
        assert!(store.reconcile_team("my-team").is_empty());
        assert!(store.team("my-team").is_some());
    }

    #[test]
    fn test_scan_discovers_all_teams() {
        let (_dir, paths) = fixture();
        write_team(&paths, "alpha", r#"{"members":[]}"#);
        write_team(&paths, "beta", r#"{"members":[]}"#);
        let mut store = TeamStore::new(paths);
        let deltas = store.scan();
        assert_eq!(
            deltas
                .iter()
                .filter(|d| matches!(d, TeamDelta::TeamUpdated(_)))
                .count(),
            2
        );
        assert_eq!(store.team_infos().len(), 2);
    }

    #[test]
    fn test_scan_missing_teams_dir() {
        let (_dir, paths) = fixture();
        let mut store = TeamStore::new(paths);
        assert!(store.scan().is_empty());
    }

    #[test]
    fn test_team_name_for_path() {
        let (_dir, paths) = fixture();
        let config = paths.config_file("my-team");
        let inbox = paths.inbox_file("my-team", "researcher");
        let store = TeamStore::new(paths);
        assert_eq!(store.team_name_for_path(&config).as_deref(), Some("my-team"));
        assert_eq!(store.team_name_for_path(&inbox).as_deref(), Some("my-team"));
        assert!(
            store
                .team_name_for_path(&PathBuf::from("/elsewhere/config.json"))
                .is_none()
        );
    }

    #[test]
    fn test_inbox_for_falls_back_through_candidates() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[]}"#);
        write_inbox(
            &paths,
            "my-team",
            "researcher",
            r#"[{"from":"lead","text":"hi"}]"#,
        );
        let mut store = TeamStore::new(paths);
        store.reconcile_team("my-team");
        assert_eq!(
            store.inbox_for("my-team", &["missing", "researcher"]).len(),
            1
        );
        assert!(store.inbox_for("my-team", &["nobody"]).is_empty());
        assert!(store.inbox_for("ghost-team", &["researcher"]).is_empty());
    }

    #[test]
    fn test_tasks_owned_by() {
        let (_dir, paths) = fixture();
        write_team(&paths, "my-team", r#"{"members":[]}"#);
        write_task(
            &paths,
            "my-team",
            "1",
            r#"{"id":"1","subject":"A","owner":"researcher"}"#,
        );
        write_task(
            &paths,
            "my-team",
            "2",
            r#"{"id":"2","subject":"B","owner":"writer"}"#,
        );
        let mut store = TeamStore::new(paths);
        store.reconcile_team("my-team");
        let owned = store.tasks_owned_by("my-team", &["researcher"]);
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, "1");
    }
}
