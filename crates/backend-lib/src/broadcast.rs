// ============================
// vview-backend-lib/src/broadcast.rs
// ============================
//! Fan-out of events to a session's current membership.
//!
//! Delivery is fire-and-forget and at-most-once: a failed send means the
//! target connection is gone and the event is dropped. Per-connection
//! channels preserve ordering within one session's membership.

use tracing::{debug, warn};
use vview_common::{ConnectionId, ServerEvent, Session};

use crate::AppState;

/// Send one event to one connection. Returns false when the connection is
/// not live; the event is silently dropped in that case.
pub async fn send_to(state: &AppState, connection_id: ConnectionId, event: ServerEvent) -> bool {
    let Some(tx) = state
        .connections
        .get(&connection_id)
        .map(|entry| entry.clone())
    else {
        debug!(connection_id = %connection_id, "dropping event for dead connection");
        return false;
    };
    if tx.send(event).await.is_err() {
        debug!(connection_id = %connection_id, "dropping event for closing connection");
        return false;
    }
    true
}

/// Broadcast to every member of `session`, optionally skipping one
/// connection (the pointer event skips the host itself).
pub async fn session_broadcast(
    state: &AppState,
    session: &Session,
    event: &ServerEvent,
    skip: Option<ConnectionId>,
) {
    let mut failed = 0usize;
    for participant in &session.participants {
        if skip == Some(participant.connection_id) {
            continue;
        }
        if !send_to(state, participant.connection_id, event.clone()).await {
            failed += 1;
        }
    }
    if failed > 0 {
        warn!(
            session_id = %session.id,
            failed,
            "some members missed a broadcast"
        );
    }
}
