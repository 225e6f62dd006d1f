// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between viewing clients and the signaling server.
//! This module defines the WebSocket event protocol and supporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned to every WebSocket connection by the gateway.
/// Used as the addressing unit for signal relay and host identity.
pub type ConnectionId = Uuid;

/// Identifier of a viewing session.
pub type SessionId = Uuid;

/// Kind of account hosting a viewing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    Landlord,
    Agent,
}

/// One connection joined to a session. The host is a participant too.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Gateway-assigned connection identifier, unique within a session
    pub connection_id: ConnectionId,
    /// External user reference, absent for anonymous joiners
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Display name supplied at join time, not validated for uniqueness
    pub name: String,
    /// Join timestamp
    pub joined: DateTime<Utc>,
}

/// One active or ended virtual viewing.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique, never reused
    pub id: SessionId,
    /// Connection that created the session; immutable once set
    pub host_connection_id: ConnectionId,
    pub host_type: HostType,
    /// External references, opaque to the signaling core
    pub host_id: i64,
    pub property_id: i64,
    /// Ordered membership, host first at creation time
    pub participants: Vec<Participant>,
    pub created: DateTime<Utc>,
    /// Set to false exactly once, never back to true
    pub active: bool,
}

impl Session {
    /// Whether `connection_id` is the host of this session.
    pub fn is_host(&self, connection_id: ConnectionId) -> bool {
        self.host_connection_id == connection_id
    }

    pub fn participant(&self, connection_id: ConnectionId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.connection_id == connection_id)
    }
}

/// Chat message attribution, echoed back to every member verbatim.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatSender {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub is_host: bool,
}

/// Pointer position inside the shared video surface, relative coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

/// Events sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Open a new viewing session with the sender as host
    #[serde(rename_all = "camelCase")]
    CreateSession {
        host_type: HostType,
        host_id: i64,
        property_id: i64,
        host_name: String,
    },
    /// Join an existing session by id
    #[serde(rename_all = "camelCase")]
    JoinSession {
        session_id: SessionId,
        #[serde(default)]
        user_id: Option<i64>,
        name: String,
    },
    /// Opaque peer-descriptor relay; the server never inspects `signal`
    Signal {
        to: ConnectionId,
        from: ConnectionId,
        signal: serde_json::Value,
    },
    /// Voluntary departure; equivalent to dropping the connection
    LeaveSession,
    /// Host-only: close the session for everyone
    #[serde(rename_all = "camelCase")]
    EndSession { session_id: SessionId },
    /// Chat fan-out to the session's current membership
    #[serde(rename_all = "camelCase")]
    ViewingChatMessage {
        session_id: SessionId,
        message: String,
        sender: ChatSender,
    },
    /// Host-only: flip the client-local recording flag for all members
    #[serde(rename_all = "camelCase")]
    ToggleRecording {
        session_id: SessionId,
        is_recording: bool,
    },
    /// Host-only: share the host's pointer with the other members
    #[serde(rename_all = "camelCase")]
    VirtualPointer {
        session_id: SessionId,
        position: PointerPosition,
    },
}

/// Events sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Reply to the creating host only
    #[serde(rename_all = "camelCase")]
    SessionCreated {
        session_id: SessionId,
        session: Session,
    },
    /// Reply to a successful joiner only
    #[serde(rename_all = "camelCase")]
    SessionJoined {
        session_id: SessionId,
        host_connection_id: ConnectionId,
        participants: Vec<Participant>,
    },
    /// Reply to a failed joiner only
    JoinError { message: String },
    /// Host notification that someone joined
    #[serde(rename_all = "camelCase")]
    ParticipantJoined {
        connection_id: ConnectionId,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<i64>,
        name: String,
        joined: DateTime<Utc>,
    },
    /// Host notification that a non-host member left or dropped
    #[serde(rename_all = "camelCase")]
    ParticipantLeft {
        connection_id: ConnectionId,
        name: String,
    },
    /// Relayed peer descriptor, forwarded unmodified
    Signal {
        from: ConnectionId,
        signal: serde_json::Value,
    },
    /// Chat broadcast, stamped with a server-side timestamp
    #[serde(rename_all = "camelCase")]
    ViewingChatMessage {
        message: String,
        sender: ChatSender,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    RecordingToggled {
        is_recording: bool,
        timestamp: DateTime<Utc>,
    },
    VirtualPointer { position: PointerPosition },
    /// Final broadcast on explicit end or host disconnect
    ViewingSessionEnded,
    /// Request-scoped failure, sent only to the offending connection
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_wire_names_are_kebab_case() {
        let create = ClientEvent::CreateSession {
            host_type: HostType::Landlord,
            host_id: 7,
            property_id: 42,
            host_name: "Sam".to_string(),
        };
        let json = serde_json::to_value(&create).unwrap();
        assert_eq!(json["type"], "create-session");
        assert_eq!(json["hostType"], "landlord");
        assert_eq!(json["propertyId"], 42);

        let parsed: ClientEvent = serde_json::from_value(json).unwrap();
        match parsed {
            ClientEvent::CreateSession { property_id, .. } => assert_eq!(property_id, 42),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn join_event_allows_anonymous_user() {
        let session_id = Uuid::new_v4();
        let raw = serde_json::json!({
            "type": "join-session",
            "sessionId": session_id,
            "name": "Alice",
        });
        let parsed: ClientEvent = serde_json::from_value(raw).unwrap();
        match parsed {
            ClientEvent::JoinSession { user_id, name, .. } => {
                assert!(user_id.is_none());
                assert_eq!(name, "Alice");
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn signal_payload_round_trips_unmodified() {
        let payload = serde_json::json!({"sdp": "v=0...", "candidates": [1, 2, 3]});
        let event = ClientEvent::Signal {
            to: Uuid::new_v4(),
            from: Uuid::new_v4(),
            signal: payload.clone(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ClientEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            ClientEvent::Signal { signal, .. } => assert_eq!(signal, payload),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let raw = serde_json::json!({
            "type": "viewing-chat-message",
            "sessionId": Uuid::new_v4(),
            // no message, no sender
        });
        assert!(serde_json::from_value::<ClientEvent>(raw).is_err());
    }
}
