// ============================
// vview-backend-lib/src/viewing.rs
// ============================
//! External collaborator: the viewing-request CRUD layer.
//!
//! The signaling core crosses exactly one system boundary: marking a viewing
//! request as completed when a session is administratively finalized. The
//! call may fail independently of this core; failures are reported upward,
//! never swallowed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::AppError;

/// Payload of the completion call, issued against the session's creation
/// timestamp and an opaque recording-location string.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingCompletion {
    pub status: String,
    pub virtual_viewing_url: String,
    pub scheduled_at: DateTime<Utc>,
}

impl ViewingCompletion {
    pub fn new(virtual_viewing_url: String, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            status: "completed".to_string(),
            virtual_viewing_url,
            scheduled_at,
        }
    }
}

/// Trait for viewing-request backends
#[async_trait]
pub trait ViewingRequests: Send + Sync {
    async fn mark_completed(
        &self,
        viewing_request_id: i64,
        completion: ViewingCompletion,
    ) -> Result<(), AppError>;
}

/// Logging stand-in used when the CRUD layer is not wired up.
pub struct NoopViewingRequests;

#[async_trait]
impl ViewingRequests for NoopViewingRequests {
    async fn mark_completed(
        &self,
        viewing_request_id: i64,
        completion: ViewingCompletion,
    ) -> Result<(), AppError> {
        info!(
            viewing_request_id,
            url = %completion.virtual_viewing_url,
            "viewing request marked completed (noop backend)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_payload_shape() {
        let completion =
            ViewingCompletion::new("https://cdn.example/rec/1.webm".to_string(), Utc::now());
        let json = serde_json::to_value(&completion).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["virtualViewingUrl"], "https://cdn.example/rec/1.webm");
        assert!(json.get("scheduledAt").is_some());
    }

    #[tokio::test]
    async fn noop_backend_accepts_calls() {
        let backend = NoopViewingRequests;
        let completion = ViewingCompletion::new("u".to_string(), Utc::now());
        assert!(backend.mark_completed(7, completion).await.is_ok());
    }
}
