//! Inbox writes.
//!
//! Aviary also produces inbox entries (operator messages posted through a
//! subscriber). Writes are atomic: serialize to a temporary file in the
//! same directory, then rename over the target, so concurrent readers
//! never observe a partially-written file.

use std::path::Path;

use aviary_paths::TeamsDir;
use aviary_protocol::InboxMessage;
use tracing::info;

use crate::errors::TeamsError;
use crate::parser;

/// Write the full inbox contents atomically (temp file + rename).
pub fn write_inbox_atomic(path: &Path, messages: &[InboxMessage]) -> Result<(), TeamsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = Path::new(&tmp);

    let json = serde_json::to_string_pretty(messages)?;
    std::fs::write(tmp_path, json)?;
    std::fs::rename(tmp_path, path)?;
    Ok(())
}

/// Append one message to a team member's inbox file.
///
/// The existing contents are re-read first; a missing file starts an
/// empty inbox. The timestamp is stamped here in RFC3339.
pub fn append_message(
    paths: &TeamsDir,
    team: &str,
    member: &str,
    from: &str,
    text: &str,
) -> Result<(), TeamsError> {
    let path = paths.inbox_file(team, member);
    let mut messages = parser::parse_inbox(&path)?.unwrap_or_default();
    messages.push(InboxMessage {
        from: from.to_string(),
        text: text.to_string(),
        timestamp: Some(serde_json::Value::String(
            chrono::Utc::now().to_rfc3339(),
        )),
        read: false,
    });
    write_inbox_atomic(&path, &messages)?;

    info!(
        event = "teams.inbox.message_appended",
        team = team,
        member = member,
        count = messages.len(),
    );
    Ok(())
}
