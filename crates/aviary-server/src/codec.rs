//! JSONL framing over the subscriber socket.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::ServerError;

/// Read a single JSONL message from an async buffered reader.
///
/// Returns `Ok(None)` when the stream is closed (EOF).
/// Returns `Err` on malformed JSON or IO errors.
pub async fn read_message<R, T>(reader: &mut R) -> Result<Option<T>, ServerError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Ok(None); // EOF
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let msg: T = serde_json::from_str(trimmed)
        .map_err(|e| ServerError::Protocol(format!("invalid JSON: {}: {}", e, trimmed)))?;
    Ok(Some(msg))
}

/// Write a single JSONL message to an async writer.
///
/// Serializes the message as compact JSON followed by a newline, then flushes.
pub async fn write_message<W, T>(writer: &mut W, msg: &T) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(msg)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Write a pre-serialized frame (no trailing newline) to an async writer.
///
/// Used by the broadcaster, which serializes once per fan-out.
pub async fn write_frame<W>(writer: &mut W, frame: &str) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
