//! Parsers for team config, inbox, and task files.
//!
//! Raw serde types with `#[serde(default)]` for forward compatibility
//! with unknown/added fields. All parse functions return `Ok(None)` for a
//! missing file and `Err` for malformed JSON; callers decide whether a
//! malformed file keeps the previous snapshot.

use std::path::Path;

use serde::Deserialize;

use aviary_protocol::{InboxMessage, TaskRecord, TeamMemberInfo};

use crate::errors::TeamsError;
use crate::types::TeamConfig;

// =============================================================================
// Team config: ~/.claude/teams/<team>/config.json
// =============================================================================

/// Raw team config (serde).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawTeamConfig {
    #[serde(alias = "teamName")]
    pub name: String,
    pub description: String,
    pub members: Vec<RawTeamMember>,
}

/// Raw team member entry (serde).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawTeamMember {
    #[serde(rename = "agentId", alias = "agent_id", alias = "id")]
    pub agent_id: String,
    pub name: String,
    #[serde(rename = "agentType", alias = "agent_type")]
    pub agent_type: String,
    pub model: String,
    pub color: String,
    #[serde(alias = "spawnPrompt")]
    pub prompt: String,
    pub cwd: String,
}

fn optional(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Parse a team config file.
///
/// The team name falls back to the directory name when the config omits it.
pub fn parse_team_config(path: &Path) -> Result<Option<TeamConfig>, TeamsError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let raw: RawTeamConfig = serde_json::from_str(&content)?;

    let dir_name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    let name = if raw.name.is_empty() { dir_name } else { raw.name };

    let members = raw
        .members
        .into_iter()
        .map(|m| TeamMemberInfo {
            name: m.name,
            agent_id: optional(m.agent_id),
            agent_type: optional(m.agent_type),
            color: optional(m.color),
            prompt: optional(m.prompt),
            cwd: optional(m.cwd),
        })
        .collect();

    Ok(Some(TeamConfig {
        name,
        description: optional(raw.description),
        members,
    }))
}

// =============================================================================
// Inbox: ~/.claude/teams/<team>/inboxes/<member>.json
// =============================================================================

/// Inbox files hold either a raw array of messages or an object wrapping
/// one under `messages`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInboxFile {
    List(Vec<InboxMessage>),
    Wrapped {
        #[serde(default)]
        messages: Vec<InboxMessage>,
    },
}

/// Parse a member's inbox file.
pub fn parse_inbox(path: &Path) -> Result<Option<Vec<InboxMessage>>, TeamsError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let raw: RawInboxFile = serde_json::from_str(&content)?;
    let messages = match raw {
        RawInboxFile::List(messages) => messages,
        RawInboxFile::Wrapped { messages } => messages,
    };
    Ok(Some(messages))
}

// =============================================================================
// Tasks: ~/.claude/teams/<team>/tasks/<id>.json
// =============================================================================

/// Raw task file (serde). Ids and dependency entries may be numbers or
/// strings on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawTask {
    pub id: Option<serde_json::Value>,
    #[serde(alias = "title")]
    pub subject: String,
    pub description: String,
    pub status: String,
    #[serde(alias = "assignee")]
    pub owner: String,
    #[serde(rename = "blockedBy", alias = "blocked_by", alias = "dependencies")]
    pub blocked_by: Vec<serde_json::Value>,
    pub blocks: Vec<serde_json::Value>,
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a task file. The id falls back to the file stem when absent.
pub fn parse_task_file(path: &Path) -> Result<Option<TaskRecord>, TeamsError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let raw: RawTask = serde_json::from_str(&content)?;

    let id = raw
        .id
        .as_ref()
        .map(value_to_string)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string()
        });

    Ok(Some(TaskRecord {
        id,
        subject: raw.subject,
        description: optional(raw.description),
        status: raw.status,
        owner: optional(raw.owner),
        blocked_by: raw.blocked_by.iter().map(value_to_string).collect(),
        blocks: raw.blocks.iter().map(value_to_string).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_team_config_valid() {
        let dir = tempfile::TempDir::new().unwrap();
        let team_dir = dir.path().join("my-team");
        fs::create_dir_all(&team_dir).unwrap();
        let config_path = team_dir.join("config.json");

        fs::write(
            &config_path,
            r#"{
                "description": "Demo team",
                "members": [
                    {
                        "agentId": "researcher@my-team",
                        "name": "researcher",
                        "agentType": "general-purpose",
                        "model": "claude-sonnet-4-5",
                        "color": "blue",
                        "prompt": "Research the codebase",
                        "cwd": "/project"
                    }
                ]
            }"#,
        )
        .unwrap();

        let config = parse_team_config(&config_path).unwrap().unwrap();
        assert_eq!(config.name, "my-team");
        assert_eq!(config.description.as_deref(), Some("Demo team"));
        assert_eq!(config.members.len(), 1);
        let member = &config.members[0];
        assert_eq!(member.name, "researcher");
        assert_eq!(member.agent_id.as_deref(), Some("researcher@my-team"));
        assert_eq!(member.color.as_deref(), Some("blue"));
        assert_eq!(member.cwd.as_deref(), Some("/project"));
    }

    #[test]
    fn test_parse_team_config_explicit_name_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        let team_dir = dir.path().join("dir-name");
        fs::create_dir_all(&team_dir).unwrap();
        let config_path = team_dir.join("config.json");
        fs::write(&config_path, r#"{"name":"real-name","members":[]}"#).unwrap();

        let config = parse_team_config(&config_path).unwrap().unwrap();
        assert_eq!(config.name, "real-name");
    }

    #[test]
    fn test_parse_team_config_minimal_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let team_dir = dir.path().join("team");
        fs::create_dir_all(&team_dir).unwrap();
        let config_path = team_dir.join("config.json");
        fs::write(&config_path, r#"{ "members": [{}] }"#).unwrap();

        let config = parse_team_config(&config_path).unwrap().unwrap();
        assert_eq!(config.members.len(), 1);
        assert_eq!(config.members[0].name, "");
        assert!(config.members[0].agent_id.is_none());
        assert!(config.description.is_none());
    }

    #[test]
    fn test_parse_team_config_extra_unknown_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let team_dir = dir.path().join("team");
        fs::create_dir_all(&team_dir).unwrap();
        let config_path = team_dir.join("config.json");
        fs::write(
            &config_path,
            r#"{ "members": [{ "name": "a", "futureField": 42 }], "anotherNewField": "x" }"#,
        )
        .unwrap();

        let config = parse_team_config(&config_path).unwrap().unwrap();
        assert_eq!(config.members.len(), 1);
    }

    #[test]
    fn test_parse_team_config_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = parse_team_config(&dir.path().join("nope.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_team_config_malformed_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not valid json{{{").unwrap();
        assert!(parse_team_config(&path).is_err());
    }

    #[test]
    fn test_parse_inbox_raw_array() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("researcher.json");
        fs::write(
            &path,
            r#"[{"from":"lead","text":"status?","timestamp":"2026-08-06T10:00:00Z","read":false}]"#,
        )
        .unwrap();

        let messages = parse_inbox(&path).unwrap().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "lead");
        assert_eq!(messages[0].text, "status?");
    }

    #[test]
    fn test_parse_inbox_wrapped_object() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("researcher.json");
        fs::write(&path, r#"{"messages":[{"from":"a","text":"hi"}]}"#).unwrap();

        let messages = parse_inbox(&path).unwrap().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "a");
    }

    #[test]
    fn test_parse_inbox_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(parse_inbox(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn test_parse_inbox_malformed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("inbox.json");
        fs::write(&path, "garbage").unwrap();
        assert!(parse_inbox(&path).is_err());
    }

    #[test]
    fn test_parse_task_file_full() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("7.json");
        fs::write(
            &path,
            r#"{
                "id": "7",
                "subject": "Fix login",
                "description": "The session cookie expires early",
                "status": "in_progress",
                "owner": "researcher",
                "blockedBy": ["3", 4],
                "blocks": ["9"]
            }"#,
        )
        .unwrap();

        let task = parse_task_file(&path).unwrap().unwrap();
        assert_eq!(task.id, "7");
        assert_eq!(task.subject, "Fix login");
        assert_eq!(task.status, "in_progress");
        assert_eq!(task.owner.as_deref(), Some("researcher"));
        assert_eq!(task.blocked_by, vec!["3", "4"]);
        assert_eq!(task.blocks, vec!["9"]);
    }

    #[test]
    fn test_parse_task_file_title_and_assignee_aliases() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("t.json");
        fs::write(
            &path,
            r#"{"id":1,"title":"Do thing","assignee":"worker","dependencies":[2]}"#,
        )
        .unwrap();

        let task = parse_task_file(&path).unwrap().unwrap();
        assert_eq!(task.id, "1");
        assert_eq!(task.subject, "Do thing");
        assert_eq!(task.owner.as_deref(), Some("worker"));
        assert_eq!(task.blocked_by, vec!["2"]);
    }

    #[test]
    fn test_parse_task_file_id_falls_back_to_stem() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("42.json");
        fs::write(&path, r#"{"subject":"No id in body"}"#).unwrap();

        let task = parse_task_file(&path).unwrap().unwrap();
        assert_eq!(task.id, "42");
    }

    #[test]
    fn test_parse_task_file_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(
            parse_task_file(&dir.path().join("nope.json"))
                .unwrap()
                .is_none()
        );
    }
}
