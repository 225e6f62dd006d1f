// ============================
// vview-backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers outside the WebSocket surface.

pub mod live;
pub mod sessions;
