// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_ACTIVE: &str = "ws.active";
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_JOINED: &str = "session.joined";
pub const SESSION_ENDED: &str = "session.ended";
pub const CHAT_MESSAGES: &str = "chat.messages";
pub const SIGNALS_RELAYED: &str = "signal.relayed";
pub const SIGNALS_DROPPED: &str = "signal.dropped";
