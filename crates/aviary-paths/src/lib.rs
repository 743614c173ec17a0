use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found — set $HOME environment variable")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.claude/` directory layout.
///
/// Single source of truth for every path Aviary reads or writes. Use
/// `resolve()` in production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct AviaryPaths {
    claude_dir: PathBuf,
}

impl AviaryPaths {
    /// Resolve paths from the user's home directory (`~/.claude`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            claude_dir: home.join(".claude"),
        })
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(claude_dir: PathBuf) -> Self {
        Self { claude_dir }
    }

    /// The base `~/.claude` directory.
    pub fn claude_dir(&self) -> &Path {
        &self.claude_dir
    }

    // --- Aviary's own state directory ---

    pub fn aviary_dir(&self) -> PathBuf {
        self.claude_dir.join("aviary")
    }

    /// Append-only hook-event log consumed by the ingestor.
    pub fn event_log(&self) -> PathBuf {
        self.aviary_dir().join("events.jsonl")
    }

    pub fn daemon_socket(&self) -> PathBuf {
        self.aviary_dir().join("aviary.sock")
    }

    pub fn daemon_pid_file(&self) -> PathBuf {
        self.aviary_dir().join("aviary.pid")
    }

    pub fn user_config(&self) -> PathBuf {
        self.aviary_dir().join("config.toml")
    }

    // --- Team directories ---

    pub fn teams_dir(&self) -> PathBuf {
        self.claude_dir.join("teams")
    }

    /// Layout helper rooted at this installation's teams directory.
    pub fn teams(&self) -> TeamsDir {
        TeamsDir::new(self.teams_dir())
    }
}

/// Path layout under a teams root directory.
///
/// Separate from [`AviaryPaths`] because the teams root is independently
/// configurable (`teams_dir` in the daemon config).
#[derive(Debug, Clone)]
pub struct TeamsDir {
    root: PathBuf,
}

impl TeamsDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn team_dir(&self, team_name: &str) -> PathBuf {
        let safe_name = team_name.replace('/', "_");
        self.root.join(safe_name)
    }

    pub fn config_file(&self, team_name: &str) -> PathBuf {
        self.team_dir(team_name).join("config.json")
    }

    pub fn inboxes_dir(&self, team_name: &str) -> PathBuf {
        self.team_dir(team_name).join("inboxes")
    }

    pub fn inbox_file(&self, team_name: &str, member: &str) -> PathBuf {
        let safe_member = member.replace('/', "_");
        self.inboxes_dir(team_name)
            .join(format!("{safe_member}.json"))
    }

    pub fn tasks_dir(&self, team_name: &str) -> PathBuf {
        self.team_dir(team_name).join("tasks")
    }

    pub fn task_file(&self, team_name: &str, task_id: &str) -> PathBuf {
        let safe_id = task_id.replace('/', "_");
        self.tasks_dir(team_name).join(format!("{safe_id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_paths() -> AviaryPaths {
        AviaryPaths::from_dir(PathBuf::from("/home/user/.claude"))
    }

    fn test_teams() -> TeamsDir {
        TeamsDir::new(PathBuf::from("/home/user/.claude/teams"))
    }

    #[test]
    fn test_resolve_returns_ok_when_home_set() {
        // HOME is set in CI and dev environments
        let result = AviaryPaths::resolve();
        assert!(result.is_ok());
        let paths = result.unwrap();
        assert!(paths.claude_dir().to_string_lossy().contains(".claude"));
    }

    #[test]
    fn test_from_dir() {
        let paths = AviaryPaths::from_dir(PathBuf::from("/tmp/test-claude"));
        assert_eq!(paths.claude_dir(), Path::new("/tmp/test-claude"));
    }

    #[test]
    fn test_aviary_dir() {
        assert_eq!(
            test_paths().aviary_dir(),
            PathBuf::from("/home/user/.claude/aviary")
        );
    }

    #[test]
    fn test_event_log() {
        assert_eq!(
            test_paths().event_log(),
            PathBuf::from("/home/user/.claude/aviary/events.jsonl")
        );
    }

    #[test]
    fn test_daemon_socket() {
        assert_eq!(
            test_paths().daemon_socket(),
            PathBuf::from("/home/user/.claude/aviary/aviary.sock")
        );
    }

    #[test]
    fn test_daemon_pid_file() {
        assert_eq!(
            test_paths().daemon_pid_file(),
            PathBuf::from("/home/user/.claude/aviary/aviary.pid")
        );
    }

    #[test]
    fn test_user_config() {
        assert_eq!(
            test_paths().user_config(),
            PathBuf::from("/home/user/.claude/aviary/config.toml")
        );
    }

    #[test]
    fn test_teams_dir() {
        assert_eq!(
            test_paths().teams_dir(),
            PathBuf::from("/home/user/.claude/teams")
        );
    }

    #[test]
    fn test_teams_helper_rooted_at_teams_dir() {
        assert_eq!(
            test_paths().teams().root(),
            Path::new("/home/user/.claude/teams")
        );
    }

    #[test]
    fn test_team_config_file() {
        assert_eq!(
            test_teams().config_file("my-team"),
            PathBuf::from("/home/user/.claude/teams/my-team/config.json")
        );
    }

    #[test]
    fn test_team_dir_sanitizes_slashes() {
        assert_eq!(
            test_teams().team_dir("a/b"),
            PathBuf::from("/home/user/.claude/teams/a_b")
        );
    }

    #[test]
    fn test_inbox_file() {
        assert_eq!(
            test_teams().inbox_file("my-team", "researcher"),
            PathBuf::from("/home/user/.claude/teams/my-team/inboxes/researcher.json")
        );
    }

    #[test]
    fn test_inbox_file_sanitizes_member() {
        assert_eq!(
            test_teams().inbox_file("my-team", "a/b"),
            PathBuf::from("/home/user/.claude/teams/my-team/inboxes/a_b.json")
        );
    }

    #[test]
    fn test_tasks_dir() {
        assert_eq!(
            test_teams().tasks_dir("my-team"),
            PathBuf::from("/home/user/.claude/teams/my-team/tasks")
        );
    }

    #[test]
    fn test_task_file() {
        assert_eq!(
            test_teams().task_file("my-team", "7"),
            PathBuf::from("/home/user/.claude/teams/my-team/tasks/7.json")
        );
    }

    #[test]
    fn test_path_error_message() {
        let err = PathError::HomeNotFound;
        let msg = err.to_string();
        assert!(msg.contains("home directory not found"));
        assert!(msg.contains("$HOME"));
    }
}
