//! Raw hook-event parsing and kind normalization.
//!
//! The event log is loosely typed: producers disagree on key names and omit
//! fields freely. `RawEvent` reads everything permissively; absence of any
//! field never aborts processing of a line.

use serde::Deserialize;

/// Normalized event kind derived from the raw kind string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SessionStart,
    PreTool,
    PostTool,
    Stop,
    SubagentStop,
    TaskDone,
    Unknown,
}

impl EventKind {
    /// Parse the raw kind string. Accepts both hook-style PascalCase names
    /// and snake_case names.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SessionStart" | "session_start" => Self::SessionStart,
            "PreToolUse" | "pre_tool" | "pre_tool_use" => Self::PreTool,
            "PostToolUse" | "post_tool" | "post_tool_use" => Self::PostTool,
            "Stop" | "stop" => Self::Stop,
            "SubagentStop" | "subagent_stop" => Self::SubagentStop,
            "TaskDone" | "task_done" | "task_complete" => Self::TaskDone,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::PreTool => "pre_tool",
            Self::PostTool => "post_tool",
            Self::Stop => "stop",
            Self::SubagentStop => "subagent_stop",
            Self::TaskDone => "task_done",
            Self::Unknown => "unknown",
        }
    }
}

/// One line of the event log, read permissively.
///
/// The event kind may arrive under `event`, `hook_event_name`, or `type`;
/// the tool name under `tool_name` or `tool`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RawEvent {
    #[serde(alias = "hook_event_name", alias = "type")]
    pub event: Option<String>,
    #[serde(alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(alias = "tool")]
    pub tool_name: Option<String>,
    pub tool_input: Option<serde_json::Value>,
    pub tool_response: Option<serde_json::Value>,
    pub cwd: Option<String>,
    pub model: Option<String>,
    pub tokens: Option<u64>,
}

impl RawEvent {
    pub fn kind(&self) -> EventKind {
        self.event
            .as_deref()
            .map(EventKind::parse)
            .unwrap_or(EventKind::Unknown)
    }

    pub fn tool(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    /// The file path this event touched, if any. Tool inputs name it
    /// `file_path`, `notebook_path`, or plain `path`.
    pub fn file_path(&self) -> Option<String> {
        let input = self.tool_input.as_ref()?;
        for key in ["file_path", "notebook_path", "path"] {
            if let Some(path) = input.get(key).and_then(|v| v.as_str()) {
                return Some(path.to_string());
            }
        }
        None
    }

    /// The delegation description, for `Task` tool calls.
    pub fn description(&self) -> Option<&str> {
        self.tool_input
            .as_ref()?
            .get("description")
            .or_else(|| self.tool_input.as_ref()?.get("prompt"))
            .and_then(|v| v.as_str())
    }

    /// Token estimate for this event: the explicit count when present,
    /// otherwise a chars/4 estimate over the tool input and response.
    pub fn estimated_tokens(&self) -> u64 {
        if let Some(tokens) = self.tokens {
            return tokens;
        }
        let mut chars = 0usize;
        if let Some(input) = &self.tool_input {
            chars += input.to_string().len();
        }
        if let Some(response) = &self.tool_response {
            chars += response.to_string().len();
        }
        (chars / 4) as u64
    }
}
