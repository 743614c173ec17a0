use std::path::PathBuf;

use aviary_paths::AviaryPaths;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// Daemon configuration.
///
/// Read from the `[aviary]` section of `~/.claude/aviary/config.toml`;
/// CLI flags override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the Unix domain socket.
    /// Default: `~/.claude/aviary/aviary.sock`
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Path to the PID file.
    /// Default: `~/.claude/aviary/aviary.pid`
    #[serde(default = "default_pid_path")]
    pub pid_path: PathBuf,

    /// Append-only hook-event log to tail.
    /// Default: `~/.claude/aviary/events.jsonl`
    #[serde(default = "default_event_log")]
    pub event_log: PathBuf,

    /// Root of the team directories.
    /// Default: `~/.claude/teams`
    #[serde(default = "default_teams_dir")]
    pub teams_dir: PathBuf,

    /// Minimum dwell of an active agent status in milliseconds.
    /// Default: 3000
    #[serde(default = "default_status_hold_ms")]
    pub status_hold_ms: u64,

    /// Per-path settle window for directory change notifications, ms.
    /// Default: 200
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Poll interval for the watch loop, ms.
    /// Default: 100
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Event history ring capacity.
    /// Default: 500
    #[serde(default = "default_events_capacity")]
    pub events_capacity: usize,

    /// Message history ring capacity.
    /// Default: 100
    #[serde(default = "default_messages_capacity")]
    pub messages_capacity: usize,

    /// Number of recent events included in the connect snapshot.
    /// Default: 100
    #[serde(default = "default_snapshot_events")]
    pub snapshot_events: usize,

    /// When true, replay the whole event log at startup instead of
    /// skipping to its end.
    #[serde(default)]
    pub replay_log: bool,
}

impl ServerConfig {
    /// Validate configuration values.
    ///
    /// Called after loading config to catch misconfiguration early.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.status_hold_ms == 0 {
            return Err(ServerError::ConfigInvalid(
                "status_hold_ms must be > 0".to_string(),
            ));
        }
        if self.debounce_ms == 0 {
            return Err(ServerError::ConfigInvalid(
                "debounce_ms must be > 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ServerError::ConfigInvalid(
                "poll_interval_ms must be > 0".to_string(),
            ));
        }
        if self.events_capacity == 0 {
            return Err(ServerError::ConfigInvalid(
                "events_capacity must be > 0".to_string(),
            ));
        }
        if self.messages_capacity == 0 {
            return Err(ServerError::ConfigInvalid(
                "messages_capacity must be > 0".to_string(),
            ));
        }
        if self.snapshot_events > self.events_capacity {
            return Err(ServerError::ConfigInvalid(
                "snapshot_events must be <= events_capacity".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            pid_path: default_pid_path(),
            event_log: default_event_log(),
            teams_dir: default_teams_dir(),
            status_hold_ms: default_status_hold_ms(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            events_capacity: default_events_capacity(),
            messages_capacity: default_messages_capacity(),
            snapshot_events: default_snapshot_events(),
            replay_log: false,
        }
    }
}

fn fallback_paths() -> AviaryPaths {
    AviaryPaths::resolve().unwrap_or_else(|e| {
        tracing::warn!(
            event = "server.config.home_dir_fallback",
            error = %e,
            fallback = "/tmp/.claude",
        );
        AviaryPaths::from_dir(PathBuf::from("/tmp/.claude"))
    })
}

fn default_socket_path() -> PathBuf {
    fallback_paths().daemon_socket()
}

fn default_pid_path() -> PathBuf {
    fallback_paths().daemon_pid_file()
}

fn default_event_log() -> PathBuf {
    fallback_paths().event_log()
}

fn default_teams_dir() -> PathBuf {
    fallback_paths().teams_dir()
}

fn default_status_hold_ms() -> u64 {
    3000
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_events_capacity() -> usize {
    500
}

fn default_messages_capacity() -> usize {
    100
}

fn default_snapshot_events() -> usize {
    100
}

/// Wrapper for deserializing the `[aviary]` section from the config file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    aviary: ServerConfig,
}

/// Load configuration from `~/.claude/aviary/config.toml`.
///
/// Falls back to defaults if the file doesn't exist or the section is
/// missing; a malformed file logs a warning and uses defaults.
pub fn load_server_config() -> Result<ServerConfig, ServerError> {
    let config_path = fallback_paths().user_config();

    let config = match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
            Ok(file) => file.aviary,
            Err(e) => {
                tracing::warn!(
                    event = "server.config.parse_failed",
                    path = %config_path.display(),
                    error = %e,
                );
                ServerConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ServerConfig::default(),
        Err(e) => {
            tracing::warn!(
                event = "server.config.read_failed",
                path = %config_path.display(),
                error = %e,
            );
            ServerConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}
