// ============================
// vview-backend-lib/src/lib.rs
// ============================
//! Core library for the virtual-viewing signaling server.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod lifecycle;
pub mod metrics;
pub mod peer;
pub mod registry;
pub mod validation;
pub mod viewing;
pub mod ws_router;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use vview_common::{ConnectionId, ServerEvent};

use crate::config::Settings;
use crate::lifecycle::LifecycleManager;
use crate::registry::SessionRegistry;
use crate::viewing::{NoopViewingRequests, ViewingRequests};

/// Outbound channel of one connected client.
pub type ConnectionSender = mpsc::Sender<ServerEvent>;

/// Application state shared across all handlers.
///
/// Created once at startup and torn down with the process; all session state
/// lives behind the registry contract so a distributed store could be
/// substituted without touching the gateway or lifecycle manager.
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle manager over the process-wide registry
    pub lifecycle: Arc<LifecycleManager>,
    /// Live connections, addressable by connection id
    pub connections: Arc<DashMap<ConnectionId, ConnectionSender>>,
    /// Settings manager
    pub settings: Arc<Settings>,
    /// External viewing-request collaborator
    pub viewings: Arc<dyn ViewingRequests>,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings, viewings: Arc<dyn ViewingRequests>) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        Self {
            lifecycle: Arc::new(LifecycleManager::new(registry)),
            connections: Arc::new(DashMap::new()),
            settings: Arc::new(settings),
            viewings,
        }
    }

    /// Create a new application state with default settings and a no-op
    /// viewing-request backend
    pub fn new_default() -> Self {
        Self::new(Settings::default(), Arc::new(NoopViewingRequests))
    }

    pub fn registry(&self) -> &SessionRegistry {
        self.lifecycle.registry()
    }
}
