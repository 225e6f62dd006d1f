// ============================
// vview-backend-lib/src/registry.rs
// ============================
//! Authoritative in-process store of viewing-session state.
//!
//! Single shared mutable resource of the signaling core. Every mutation goes
//! through this contract; no lookup ever creates a session as a side effect.
//! The map is process-local: a multi-instance deployment would substitute a
//! shared, externally consistent store behind the same contract.

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;
use vview_common::{ConnectionId, HostType, Participant, Session, SessionId};

/// Everything needed to allocate a session; the host becomes participant[0].
#[derive(Debug, Clone)]
pub struct SessionDescriptor {
    pub host_connection_id: ConnectionId,
    pub host_type: HostType,
    pub host_id: i64,
    pub property_id: i64,
    pub host_name: String,
}

/// Result of [`SessionRegistry::add_participant`]. The check and the append
/// happen under one entry guard, so a concurrent deactivate cannot slip a
/// participant into a session that has already ended.
#[derive(Debug)]
pub enum AddOutcome {
    /// Appended; carries the membership as of this append.
    Added(Session),
    /// The connection is already a member; membership untouched.
    Duplicate,
    /// The session has ended.
    Inactive,
    /// No such session.
    Absent,
}

/// Process-wide session registry. Created once at gateway startup and
/// injected into the lifecycle manager, never accessed as an ambient global.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Allocate a fresh session with a unique id and store it.
    pub fn create(&self, descriptor: SessionDescriptor) -> Session {
        let now = Utc::now();
        let host = Participant {
            connection_id: descriptor.host_connection_id,
            user_id: Some(descriptor.host_id),
            name: descriptor.host_name,
            joined: now,
        };
        let session = Session {
            id: Uuid::new_v4(),
            host_connection_id: descriptor.host_connection_id,
            host_type: descriptor.host_type,
            host_id: descriptor.host_id,
            property_id: descriptor.property_id,
            participants: vec![host],
            created: now,
            active: true,
        };
        self.sessions.insert(session.id, session.clone());
        session
    }

    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.get(&id).map(|s| s.clone())
    }

    /// Append a participant, guarding activity and uniqueness atomically.
    pub fn add_participant(&self, id: SessionId, participant: Participant) -> AddOutcome {
        match self.sessions.get_mut(&id) {
            Some(mut session) => {
                if !session.active {
                    return AddOutcome::Inactive;
                }
                if session
                    .participants
                    .iter()
                    .any(|p| p.connection_id == participant.connection_id)
                {
                    return AddOutcome::Duplicate;
                }
                session.participants.push(participant);
                AddOutcome::Added(session.clone())
            },
            None => AddOutcome::Absent,
        }
    }

    /// Remove and return the participant with `connection_id`, if present.
    pub fn remove_participant(
        &self,
        id: SessionId,
        connection_id: ConnectionId,
    ) -> Option<Participant> {
        let mut session = self.sessions.get_mut(&id)?;
        let idx = session
            .participants
            .iter()
            .position(|p| p.connection_id == connection_id)?;
        Some(session.participants.remove(idx))
    }

    /// Mark a session inactive. Idempotent; the entry stays in the registry
    /// for inspection but is excluded from `list_active`.
    pub fn deactivate(&self, id: SessionId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(mut session) => {
                session.active = false;
                true
            },
            None => false,
        }
    }

    pub fn list_active(&self) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|s| s.active)
            .map(|s| s.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
