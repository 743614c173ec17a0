//! Injectable id generation for events and messages.
//!
//! Production uses UUID v4; tests use a sequence counter so exact ids can
//! be asserted.

/// Source of unique ids for event records and messages.
pub trait IdSource: Send + Sync {
    fn next_id(&mut self) -> String;
}

/// Production id source: random UUID v4.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic id source for tests: `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug)]
pub struct SequenceIds {
    prefix: String,
    next: u64,
}

impl SequenceIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 1,
        }
    }
}

impl Default for SequenceIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdSource for SequenceIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
