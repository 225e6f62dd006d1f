// ==================
// crates/backend-lib/src/gateway.rs
// ==================
//! Signaling Gateway event handling.
//!
//! One `ConnectionHandler` is instantiated per WebSocket connection and
//! processes that connection's events in arrival order. It decodes nothing
//! itself (the router does the JSON boundary work); it validates events
//! against the registry, applies the host-only authorization predicate, and
//! dispatches responses and broadcasts.
//!
//! Error surfacing: `not-found`, `inactive` and `unauthorized` go only to
//! the requesting connection, never broadcast. The *signal* relay is opaque
//! and best-effort: unknown targets are dropped without an error.

use chrono::Utc;
use metrics::counter;
use tracing::debug;
use uuid::Uuid;
use vview_common::{ClientEvent, ConnectionId, ServerEvent, Session, SessionId};

use crate::broadcast::{send_to, session_broadcast};
use crate::error::AppError;
use crate::lifecycle::DepartureOutcome;
use crate::metrics::{
    CHAT_MESSAGES, SESSION_CREATED, SESSION_ENDED, SESSION_JOINED, SIGNALS_DROPPED,
    SIGNALS_RELAYED,
};
use crate::registry::SessionDescriptor;
use crate::validation::{validate_chat_message, validate_display_name};
use crate::AppState;

/// Gateway-side handler for a single connection.
pub struct ConnectionHandler {
    state: AppState,
    connection_id: ConnectionId,
}

impl ConnectionHandler {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            connection_id: Uuid::new_v4(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Session lookup with the activity guard applied.
    fn active_session(&self, session_id: SessionId) -> Result<Session, AppError> {
        let session = self
            .state
            .registry()
            .get(session_id)
            .ok_or(AppError::SessionNotFound)?;
        if !session.active {
            return Err(AppError::SessionInactive);
        }
        Ok(session)
    }

    /// Host-only authorization predicate, evaluated once per incoming
    /// host-only event before any handler logic runs.
    fn host_session(&self, session_id: SessionId) -> Result<Session, AppError> {
        let session = self.active_session(session_id)?;
        if !session.is_host(self.connection_id) {
            return Err(AppError::Unauthorized);
        }
        Ok(session)
    }

    async fn reply(&self, event: ServerEvent) {
        send_to(&self.state, self.connection_id, event).await;
    }

    /// Handle one decoded client event. An `Err` is surfaced by the router
    /// to this connection only.
    pub async fn handle_event(&self, event: ClientEvent) -> Result<(), AppError> {
        match event {
            ClientEvent::CreateSession {
                host_type,
                host_id,
                property_id,
                host_name,
            } => {
                validate_display_name(&host_name, self.state.settings.name_max_len)?;

                let session = self.state.lifecycle.create_session(SessionDescriptor {
                    host_connection_id: self.connection_id,
                    host_type,
                    host_id,
                    property_id,
                    host_name,
                });
                counter!(SESSION_CREATED).increment(1);

                self.reply(ServerEvent::SessionCreated {
                    session_id: session.id,
                    session,
                })
                .await;
                Ok(())
            },

            ClientEvent::JoinSession {
                session_id,
                user_id,
                name,
            } => {
                validate_display_name(&name, self.state.settings.name_max_len)?;

                match self.state.lifecycle.join_session(
                    session_id,
                    self.connection_id,
                    user_id,
                    name,
                ) {
                    Ok((session, participant)) => {
                        counter!(SESSION_JOINED).increment(1);
                        self.reply(ServerEvent::SessionJoined {
                            session_id: session.id,
                            host_connection_id: session.host_connection_id,
                            participants: session.participants.clone(),
                        })
                        .await;
                        send_to(
                            &self.state,
                            session.host_connection_id,
                            ServerEvent::ParticipantJoined {
                                connection_id: participant.connection_id,
                                user_id: participant.user_id,
                                name: participant.name,
                                joined: participant.joined,
                            },
                        )
                        .await;
                        Ok(())
                    },
                    // join failures go back as a dedicated join-error event
                    Err(err) => {
                        self.reply(ServerEvent::JoinError {
                            message: err.to_string(),
                        })
                        .await;
                        Ok(())
                    },
                }
            },

            // Opaque relay: forwarded unmodified, at most once, no error on
            // a dead target.
            ClientEvent::Signal { to, from, signal } => {
                if send_to(&self.state, to, ServerEvent::Signal { from, signal }).await {
                    counter!(SIGNALS_RELAYED).increment(1);
                } else {
                    counter!(SIGNALS_DROPPED).increment(1);
                    debug!(to = %to, "signal target not live, dropped");
                }
                Ok(())
            },

            ClientEvent::LeaveSession => {
                self.handle_departure().await;
                Ok(())
            },

            ClientEvent::EndSession { session_id } => {
                self.host_session(session_id)?;
                let closed = self.state.lifecycle.end_session(session_id)?;
                counter!(SESSION_ENDED).increment(1);
                session_broadcast(&self.state, &closed, &ServerEvent::ViewingSessionEnded, None)
                    .await;
                Ok(())
            },

            ClientEvent::ViewingChatMessage {
                session_id,
                message,
                sender,
            } => {
                validate_chat_message(&message, self.state.settings.chat_max_len)?;
                let session = self.active_session(session_id)?;
                counter!(CHAT_MESSAGES).increment(1);
                session_broadcast(
                    &self.state,
                    &session,
                    &ServerEvent::ViewingChatMessage {
                        message,
                        sender,
                        timestamp: Utc::now(),
                    },
                    None,
                )
                .await;
                Ok(())
            },

            ClientEvent::ToggleRecording {
                session_id,
                is_recording,
            } => {
                let session = self.host_session(session_id)?;
                session_broadcast(
                    &self.state,
                    &session,
                    &ServerEvent::RecordingToggled {
                        is_recording,
                        timestamp: Utc::now(),
                    },
                    None,
                )
                .await;
                Ok(())
            },

            ClientEvent::VirtualPointer {
                session_id,
                position,
            } => {
                let session = self.host_session(session_id)?;
                // the host does not receive its own pointer back
                session_broadcast(
                    &self.state,
                    &session,
                    &ServerEvent::VirtualPointer { position },
                    Some(self.connection_id),
                )
                .await;
                Ok(())
            },
        }
    }

    /// Shared teardown path for leave-session and connection drop. One
    /// departure can touch several sessions (every hosted session closes,
    /// every plain membership is removed), so each outcome is fanned out in
    /// turn. Idempotent: a second invocation finds nothing to do.
    pub async fn handle_departure(&self) {
        for outcome in self.state.lifecycle.depart(self.connection_id) {
            match outcome {
                DepartureOutcome::ParticipantLeft {
                    session,
                    participant,
                } => {
                    send_to(
                        &self.state,
                        session.host_connection_id,
                        ServerEvent::ParticipantLeft {
                            connection_id: participant.connection_id,
                            name: participant.name,
                        },
                    )
                    .await;
                },
                DepartureOutcome::SessionClosed { session } => {
                    counter!(SESSION_ENDED).increment(1);
                    session_broadcast(
                        &self.state,
                        &session,
                        &ServerEvent::ViewingSessionEnded,
                        None,
                    )
                    .await;
                },
            }
        }
    }
}
