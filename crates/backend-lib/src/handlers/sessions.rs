// ============================
// vview-backend-lib/src/handlers/sessions.rs
// ============================
//! Administrative session endpoints.
//!
//! Finalizing a viewing crosses the single external system boundary of this
//! core: the viewing-request CRUD layer. A backend failure surfaces as an
//! HTTP error, it is never swallowed.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use vview_common::SessionId;

use crate::error::AppError;
use crate::viewing::ViewingCompletion;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionRequest {
    pub viewing_request_id: i64,
    /// Opaque recording-location string, client-produced
    pub recording_url: String,
}

/// `POST /sessions/{id}/complete`: mark the backing viewing request
/// completed, scheduled at the session's creation timestamp.
pub async fn complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(request): Json<CompleteSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let session = state
        .registry()
        .get(session_id)
        .ok_or(AppError::SessionNotFound)?;

    state
        .viewings
        .mark_completed(
            request.viewing_request_id,
            ViewingCompletion::new(request.recording_url, session.created),
        )
        .await?;

    Ok(Json(json!({ "status": "completed" })))
}
