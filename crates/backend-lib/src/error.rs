// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use vview_common::ServerEvent;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Session has ended")]
    SessionInactive,

    #[error("Only the session host may perform this action")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    MalformedInput(String),

    #[error("Viewing request update failed: {0}")]
    ViewingUpdate(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::SessionInactive => StatusCode::GONE,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::ViewingUpdate(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the wire error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::SessionNotFound => "not-found",
            AppError::SessionInactive => "inactive",
            AppError::Unauthorized => "unauthorized",
            AppError::MalformedInput(_) => "malformed-input",
            AppError::ViewingUpdate(_) => "viewing-update-failed",
            AppError::Internal(_) => "internal",
            AppError::Json(_) => "malformed-input",
        }
    }

    /// Error event sent only to the requesting connection, never broadcast.
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::Error {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AppError::Internal("Failed to send message".to_string())
    }
}
