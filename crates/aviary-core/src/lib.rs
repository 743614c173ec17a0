//! aviary-core: event normalization and stateful reconciliation.
//!
//! Consumes the append-only hook-event log written by agent sessions and
//! reconciles it into a live model of agents, tasks, and inter-agent
//! messages. The engine is deliberately free of I/O scheduling concerns:
//! the daemon feeds it raw events and team deltas, and it returns the
//! state deltas to broadcast.
//!
//! # Main Entry Points
//!
//! - [`engine::Engine`] - the reconciliation pass over raw events
//! - [`ingest::LogTailer`] - offset-tracking reader for the event log
//! - [`agents::AgentRegistry`] - owned map of known agents

pub mod agents;
pub mod clock;
pub mod engine;
pub mod events;
pub mod ids;
pub mod ingest;
pub mod palette;
pub mod ring;
pub mod roles;
pub mod status;
pub mod tasks;

pub use agents::registry::AgentRegistry;
pub use agents::types::{Agent, AgentHints, LabelSource};
pub use clock::{Clock, SystemClock};
pub use engine::{Delta, Engine, EngineConfig};
pub use events::{EventKind, RawEvent};
pub use ids::{IdSource, SequenceIds, UuidIds};
pub use ingest::LogTailer;
pub use ring::RingBuffer;
pub use status::StatusResolver;
pub use tasks::{PendingTask, TaskMatcher, summarize_task};

// Re-export the wire types the engine projects into.
pub use aviary_protocol::{AgentInfo, AgentMessage, AgentRole, AgentStatus, EventRecord};
