// ============================
// vview-backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
use crate::gateway::ConnectionHandler;
use crate::handlers;
use crate::metrics::{WS_ACTIVE, WS_CONNECTION};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use vview_common::{ClientEvent, ServerEvent};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/livez", get(handlers::live::live))
        .route(
            "/sessions/{id}/complete",
            post(handlers::sessions::complete_session),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Handler for WebSocket connections
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    counter!(WS_CONNECTION).increment(1);
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Per-connection outbound channel; a single forwarding task keeps
    // delivery in send order.
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.settings.channel_capacity);

    let handler = ConnectionHandler::new(state.clone());
    let connection_id = handler.connection_id();
    state.connections.insert(connection_id, tx.clone());
    gauge!(WS_ACTIVE).increment(1.0);
    debug!(connection_id = %connection_id, "connection established");

    // Forward server events to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Process incoming events in arrival order, one at a time
    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if let Err(err) = handler.handle_event(event).await {
                        // request-scoped errors go only to this connection
                        if tx.send(err.to_event()).await.is_err() {
                            break;
                        }
                    }
                },
                Err(err) => {
                    // rejected before the registry is ever touched
                    warn!(connection_id = %connection_id, error = %err, "malformed event");
                    let malformed = ServerEvent::Error {
                        code: "malformed-input".to_string(),
                        message: err.to_string(),
                    };
                    if tx.send(malformed).await.is_err() {
                        break;
                    }
                },
            },
            Message::Close(_) => break,
            _ => {},
        }
    }

    // Cleanup: the departure path is shared with leave-session and must stay
    // idempotent.
    state.connections.remove(&connection_id);
    handler.handle_departure().await;
    gauge!(WS_ACTIVE).decrement(1.0);
    debug!(connection_id = %connection_id, "connection closed");

    send_task.abort();
}
