// ============================
// vview-backend-lib/src/lifecycle.rs
// ============================
//! Session lifecycle state machine: Open -> Closed.
//!
//! A session is opened by create-session and closed exactly once, either by
//! an explicit end-session from the host or by the host's connection
//! dropping. A non-host departure only shrinks the membership. The manager
//! mutates state through the registry contract and returns structured
//! outcomes; notifying the affected connections is the gateway's job.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use vview_common::{ConnectionId, Participant, Session, SessionId};

use crate::error::AppError;
use crate::registry::{AddOutcome, SessionDescriptor, SessionRegistry};

/// One effect of a connection leaving or dropping. A single connection can
/// belong to several sessions at once (create-session always succeeds), so
/// one departure can produce several of these.
#[derive(Debug)]
pub enum DepartureOutcome {
    /// A non-host member left; the host should be notified
    ParticipantLeft {
        session: Session,
        participant: Participant,
    },
    /// The host left; every member should receive the final broadcast.
    /// `session` is the membership at the instant of closing.
    SessionClosed { session: Session },
}

pub struct LifecycleManager {
    registry: Arc<SessionRegistry>,
}

impl LifecycleManager {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Open a new session with the descriptor's host as sole participant.
    pub fn create_session(&self, descriptor: SessionDescriptor) -> Session {
        let session = self.registry.create(descriptor);
        info!(session_id = %session.id, property_id = session.property_id, "session created");
        session
    }

    /// Validate and append a participant, returning the updated session.
    /// The registry applies the activity and uniqueness guards under its
    /// entry lock, so a join racing an end-session on another task can
    /// never land in a closed session.
    pub fn join_session(
        &self,
        session_id: SessionId,
        connection_id: ConnectionId,
        user_id: Option<i64>,
        name: String,
    ) -> Result<(Session, Participant), AppError> {
        let participant = Participant {
            connection_id,
            user_id,
            name,
            joined: Utc::now(),
        };
        match self.registry.add_participant(session_id, participant.clone()) {
            AddOutcome::Added(session) => {
                info!(session_id = %session_id, connection_id = %connection_id, "participant joined");
                Ok((session, participant))
            },
            AddOutcome::Duplicate => Err(AppError::MalformedInput(
                "connection already joined this session".to_string(),
            )),
            AddOutcome::Inactive => Err(AppError::SessionInactive),
            AddOutcome::Absent => Err(AppError::SessionNotFound),
        }
    }

    /// Explicit host-initiated end. The caller must already have checked the
    /// sender against `host_connection_id`.
    pub fn end_session(&self, session_id: SessionId) -> Result<Session, AppError> {
        let session = self
            .registry
            .get(session_id)
            .ok_or(AppError::SessionNotFound)?;
        if !session.active {
            return Err(AppError::SessionInactive);
        }
        self.registry.deactivate(session_id);
        info!(session_id = %session_id, "session ended by host");

        let mut closed = session;
        closed.active = false;
        Ok(closed)
    }

    /// Handle a leave-session event or a dropped connection. Every session
    /// the connection belongs to is affected: each hosted session closes,
    /// each plain membership is removed. Idempotent: calling it twice for
    /// the same connection yields nothing the second time.
    pub fn depart(&self, connection_id: ConnectionId) -> Vec<DepartureOutcome> {
        let mut outcomes = Vec::new();
        for session in self.registry.list_active() {
            if session.is_host(connection_id) {
                self.registry.deactivate(session.id);
                info!(session_id = %session.id, "session closed on host departure");
                let mut closed = session;
                closed.active = false;
                outcomes.push(DepartureOutcome::SessionClosed { session: closed });
            } else if session.participant(connection_id).is_some() {
                if let Some(participant) =
                    self.registry.remove_participant(session.id, connection_id)
                {
                    let session = self.registry.get(session.id).unwrap_or(session);
                    info!(
                        session_id = %session.id,
                        connection_id = %connection_id,
                        "participant departed"
                    );
                    outcomes.push(DepartureOutcome::ParticipantLeft {
                        session,
                        participant,
                    });
                }
            }
        }
        outcomes
    }
}
