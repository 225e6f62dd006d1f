// ============================
// vview-backend-lib/src/handlers/live.rs
// ============================
//! Liveness probe.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn live(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "activeSessions": state.registry().list_active().len(),
        "connections": state.connections.len(),
    }))
}
