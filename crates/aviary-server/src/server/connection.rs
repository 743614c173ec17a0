//! Per-subscriber connection handling.
//!
//! On connect the subscriber immediately receives a `snapshot`; after
//! that, broadcast frames are forwarded as they arrive and requests are
//! answered in between. A subscriber that falls off simply stops
//! receiving — there is no buffering or replay.

use std::sync::Arc;

use aviary_protocol::{ClientMessage, ErrorCode, ServerMessage};
use tokio::io::BufReader;
use tokio::net::UnixStream;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec;
use crate::errors::ServerError;
use crate::state::AppState;

pub async fn handle_connection(
    stream: UnixStream,
    state: Arc<RwLock<AppState>>,
    shutdown: CancellationToken,
) {
    let (read_half, mut write_half) = stream.into_split();

    // Register as a subscriber and send the snapshot synchronously, so
    // everything broadcast after registration is also delivered.
    let (subscriber_id, mut frames) = {
        let mut state = state.write().await;
        state.broadcaster.subscribe()
    };
    let snapshot = {
        let state = state.read().await;
        state.snapshot_message()
    };
    if let Err(e) = codec::write_message(&mut write_half, &snapshot).await {
        debug!(event = "server.connection.snapshot_write_failed", error = %e);
        state.write().await.broadcaster.unsubscribe(subscriber_id);
        return;
    }

    debug!(
        event = "server.connection.subscribed",
        subscriber_id = subscriber_id,
    );

    // Requests are read in their own task; `read_line` is not
    // cancellation-safe inside a select arm. The task ends (dropping the
    // sender) on EOF or a read error.
    let (request_tx, mut requests) = mpsc::unbounded_channel::<Result<ClientMessage, ServerError>>();
    tokio::spawn(async move {
        let mut reader = BufReader::new(read_half);
        loop {
            match codec::read_message::<_, ClientMessage>(&mut reader).await {
                Ok(Some(msg)) => {
                    if request_tx.send(Ok(msg)).is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF
                Err(e @ ServerError::Protocol(_)) => {
                    // Malformed line: report it, keep reading.
                    if request_tx.send(Err(e)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = codec::write_frame(&mut write_half, &frame).await {
                    debug!(
                        event = "server.connection.write_failed",
                        subscriber_id = subscriber_id,
                        error = %e,
                    );
                    break;
                }
            }

            request = requests.recv() => {
                let response = match request {
                    Some(Ok(msg)) => dispatch(msg, &state).await,
                    Some(Err(e)) => {
                        warn!(
                            event = "server.connection.bad_request",
                            subscriber_id = subscriber_id,
                            error = %e,
                        );
                        ServerMessage::Error {
                            id: String::new(),
                            code: ErrorCode::ProtocolError,
                            message: e.to_string(),
                        }
                    }
                    None => break, // client hung up
                };
                if codec::write_message(&mut write_half, &response).await.is_err() {
                    break;
                }
            }
        }
    }

    state.write().await.broadcaster.unsubscribe(subscriber_id);
    debug!(
        event = "server.connection.closed",
        subscriber_id = subscriber_id,
    );
}

async fn dispatch(msg: ClientMessage, state: &Arc<RwLock<AppState>>) -> ServerMessage {
    match msg {
        ClientMessage::Ping { id } => ServerMessage::Pong { id },
        ClientMessage::GetAgentContext { id, agent_id } => {
            let state = state.read().await;
            state.agent_context(&id, &agent_id)
        }
        ClientMessage::PostInbox {
            id,
            team,
            member,
            from,
            text,
        } => {
            let mut state = state.write().await;
            state.post_inbox(&id, &team, &member, &from, &text)
        }
        _ => ServerMessage::Error {
            id: msg.id().to_string(),
            code: ErrorCode::ProtocolError,
            message: "unsupported message type".to_string(),
        },
    }
}
