//! Team directory reconciliation for Aviary.
//!
//! Understands the `~/.claude/teams/` layout: one `config.json` per team,
//! per-member inbox files under `inboxes/`, per-task files under `tasks/`.
//! Reconciles directory state against prior snapshots under debounced
//! change notifications and emits the diffs to broadcast.

pub mod debounce;
pub mod errors;
pub mod inbox;
pub mod parser;
pub mod store;
pub mod types;
pub mod watcher;

pub use debounce::Debouncer;
pub use errors::TeamsError;
pub use store::TeamStore;
pub use types::*;
pub use watcher::TeamWatcher;
