//! Shared wire types for Aviary's subscriber protocol.
//!
//! Subscribers speak newline-delimited JSON over the daemon socket. Every
//! message is a `#[serde(tag = "type")]` enum variant; unknown fields are
//! tolerated so older clients keep working against newer daemons.

pub mod messages;
pub mod types;

pub use messages::{ClientMessage, ErrorCode, ServerMessage};
pub use types::*;
