//! Subscriber fan-out.
//!
//! Each connection registers an unbounded frame channel. `broadcast`
//! serializes a message once and pushes the shared frame to every open
//! subscriber; a closed channel is pruned on the spot — no buffering, no
//! retry. Delivery to a subscriber that disconnects mid-send is simply
//! lost, by design.

use std::collections::HashMap;
use std::sync::Arc;

use aviary_protocol::ServerMessage;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub type SubscriberId = u64;

/// The set of currently connected subscribers.
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: HashMap<SubscriberId, mpsc::UnboundedSender<Arc<str>>>,
    next_id: SubscriberId,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber; returns its id and the frame receiver
    /// the connection task drains.
    pub fn subscribe(&mut self) -> (SubscriberId, mpsc::UnboundedReceiver<Arc<str>>) {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx);
        debug!(
            event = "server.broadcast.subscribed",
            subscriber_id = id,
            count = self.subscribers.len(),
        );
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.remove(&id);
        debug!(
            event = "server.broadcast.unsubscribed",
            subscriber_id = id,
            count = self.subscribers.len(),
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Serialize once and send to every open subscriber. Closed channels
    /// are removed.
    pub fn broadcast(&mut self, msg: &ServerMessage) {
        if self.subscribers.is_empty() {
            return;
        }
        let frame: Arc<str> = match serde_json::to_string(msg) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                warn!(event = "server.broadcast.serialize_failed", error = %e);
                return;
            }
        };
        self.subscribers
            .retain(|_, tx| tx.send(frame.clone()).is_ok());
    }

    /// Send to a single subscriber (request responses).
    pub fn send_to(&mut self, id: SubscriberId, msg: &ServerMessage) {
        let Some(tx) = self.subscribers.get(&id) else {
            return;
        };
        match serde_json::to_string(msg) {
            Ok(json) => {
                if tx.send(Arc::from(json)).is_err() {
                    self.subscribers.remove(&id);
                }
            }
            Err(e) => {
                warn!(event = "server.broadcast.serialize_failed", error = %e);
            }
        }
    }
}
