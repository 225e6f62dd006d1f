// ============================
// vview-backend-lib/src/peer.rs
// ============================
//! Client-side peer-link coordination.
//!
//! For every (host, participant) pair there is exactly one peer link, the
//! host always acting as initiator. The gateway is used purely as a relay:
//! each side sends one batched connection descriptor (candidates gathered in
//! full, not trickled), which trades slower initial setup for fewer relay
//! round-trips and fewer partial-state failure modes. That batching is a
//! deliberate design choice; incremental exchange would need re-validation
//! against restrictive network intermediaries first.
//!
//! Links live in an explicit arena keyed by the remote `connectionId`.
//! Every removal path disposes the link so transport/media resources are
//! never leaked, and a `connectionId` is never reused for a different
//! participant within the same session.

use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tracing::debug;
use vview_common::{ClientEvent, ConnectionId};

use crate::error::AppError;

/// One direct media link to a remote peer. The implementation wraps the
/// actual transport (RTCPeerConnection or equivalent); this core only
/// coordinates descriptor exchange and teardown.
pub trait PeerLink: Send {
    /// Gather and return the complete local connection descriptor as a
    /// single batched payload.
    fn local_descriptor(&mut self) -> Result<serde_json::Value, AppError>;

    /// Apply the remote side's batched descriptor.
    fn apply_remote_descriptor(&mut self, descriptor: serde_json::Value) -> Result<(), AppError>;

    /// Release the underlying transport/media resources. Must be safe to
    /// call exactly once per link; the arena guarantees it is.
    fn dispose(&mut self);
}

/// Produces links for new remote peers.
pub trait PeerLinkFactory: Send {
    fn create(&self, remote: ConnectionId, initiator: bool) -> Box<dyn PeerLink>;
}

/// Arena of live peer links keyed by remote connection id.
#[derive(Default)]
pub struct PeerArena {
    links: HashMap<ConnectionId, Box<dyn PeerLink>>,
    retired: HashSet<ConnectionId>,
}

impl PeerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a link. A connection id that was already used and released
    /// must not come back for a different participant.
    pub fn insert(&mut self, remote: ConnectionId, link: Box<dyn PeerLink>) -> Result<(), AppError> {
        if self.retired.contains(&remote) {
            return Err(AppError::Internal(format!(
                "connection id {remote} was already released in this session"
            )));
        }
        if self.links.contains_key(&remote) {
            return Err(AppError::Internal(format!(
                "duplicate peer link for connection id {remote}"
            )));
        }
        self.links.insert(remote, link);
        Ok(())
    }

    pub fn get_mut(&mut self, remote: ConnectionId) -> Option<&mut Box<dyn PeerLink>> {
        self.links.get_mut(&remote)
    }

    pub fn contains(&self, remote: ConnectionId) -> bool {
        self.links.contains_key(&remote)
    }

    /// Dispose and retire one link. Idempotent.
    pub fn remove(&mut self, remote: ConnectionId) {
        if let Some(mut link) = self.links.remove(&remote) {
            link.dispose();
            self.retired.insert(remote);
        }
    }

    /// Dispose and retire every link; used on session end.
    pub fn dispose_all(&mut self) {
        for (remote, mut link) in self.links.drain() {
            link.dispose();
            self.retired.insert(remote);
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Drop for PeerArena {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

/// Drives descriptor exchange for one participant's links.
///
/// On the host side, one link per joined participant; on a participant's
/// side, a single link back to the host created on the first inbound signal.
pub struct PeerCoordinator<F: PeerLinkFactory> {
    self_id: ConnectionId,
    factory: F,
    arena: PeerArena,
    /// Outbound path to the gateway relay
    signals: mpsc::UnboundedSender<ClientEvent>,
}

impl<F: PeerLinkFactory> PeerCoordinator<F> {
    pub fn new(
        self_id: ConnectionId,
        factory: F,
        signals: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            self_id,
            factory,
            arena: PeerArena::new(),
            signals,
        }
    }

    pub fn arena(&self) -> &PeerArena {
        &self.arena
    }

    fn send_signal(
        &self,
        to: ConnectionId,
        signal: serde_json::Value,
    ) -> Result<(), AppError> {
        self.signals
            .send(ClientEvent::Signal {
                to,
                from: self.self_id,
                signal,
            })
            .map_err(AppError::from)
    }

    /// Host side: a participant-joined notification creates the initiating
    /// link and sends its batched descriptor through the relay.
    pub fn on_participant_joined(&mut self, remote: ConnectionId) -> Result<(), AppError> {
        let mut link = self.factory.create(remote, true);
        let descriptor = link.local_descriptor()?;
        self.arena.insert(remote, link)?;
        self.send_signal(remote, descriptor)?;
        debug!(remote = %remote, "initiating peer link created");
        Ok(())
    }

    /// A relayed descriptor arrived. The initiator applies it as the answer;
    /// a non-initiator creates its link now and answers with its own
    /// descriptor, completing the one-batch-per-direction exchange.
    pub fn on_signal(
        &mut self,
        from: ConnectionId,
        signal: serde_json::Value,
    ) -> Result<(), AppError> {
        if let Some(link) = self.arena.get_mut(from) {
            return link.apply_remote_descriptor(signal);
        }

        let mut link = self.factory.create(from, false);
        link.apply_remote_descriptor(signal)?;
        let answer = link.local_descriptor()?;
        self.arena.insert(from, link)?;
        self.send_signal(from, answer)?;
        debug!(remote = %from, "answering peer link created");
        Ok(())
    }

    /// Tear down the link of a departed participant. Idempotent.
    pub fn on_participant_left(&mut self, remote: ConnectionId) {
        self.arena.remove(remote);
    }

    /// Tear down every link when the session ends.
    pub fn on_session_ended(&mut self) {
        self.arena.dispose_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    /// Test double: counts dispose calls and records applied descriptors.
    struct MockLink {
        remote: ConnectionId,
        initiator: bool,
        disposed: Arc<AtomicUsize>,
        applied: Vec<serde_json::Value>,
    }

    impl PeerLink for MockLink {
        fn local_descriptor(&mut self) -> Result<serde_json::Value, AppError> {
            Ok(serde_json::json!({
                "remote": self.remote.to_string(),
                "initiator": self.initiator,
            }))
        }

        fn apply_remote_descriptor(
            &mut self,
            descriptor: serde_json::Value,
        ) -> Result<(), AppError> {
            self.applied.push(descriptor);
            Ok(())
        }

        fn dispose(&mut self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockFactory {
        disposed: Arc<AtomicUsize>,
        created: Arc<AtomicUsize>,
    }

    impl MockFactory {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let disposed = Arc::new(AtomicUsize::new(0));
            let created = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    disposed: disposed.clone(),
                    created: created.clone(),
                },
                disposed,
                created,
            )
        }
    }

    impl PeerLinkFactory for MockFactory {
        fn create(&self, remote: ConnectionId, initiator: bool) -> Box<dyn PeerLink> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(MockLink {
                remote,
                initiator,
                disposed: self.disposed.clone(),
                applied: Vec::new(),
            })
        }
    }

    fn coordinator() -> (
        PeerCoordinator<MockFactory>,
        mpsc::UnboundedReceiver<ClientEvent>,
        Arc<AtomicUsize>,
        Arc<AtomicUsize>,
    ) {
        let (factory, disposed, created) = MockFactory::new();
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PeerCoordinator::new(Uuid::new_v4(), factory, tx),
            rx,
            disposed,
            created,
        )
    }

    #[test]
    fn host_initiates_one_link_per_join() {
        let (mut coordinator, mut rx, _disposed, created) = coordinator();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        coordinator.on_participant_joined(alice).unwrap();
        coordinator.on_participant_joined(bob).unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.arena().len(), 2);

        // each join produced exactly one batched descriptor to that peer
        for expected in [alice, bob] {
            match rx.try_recv().unwrap() {
                ClientEvent::Signal { to, signal, .. } => {
                    assert_eq!(to, expected);
                    assert_eq!(signal["initiator"], true);
                },
                other => panic!("Expected Signal, got {other:?}"),
            }
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn answer_side_creates_link_and_replies_once() {
        let (mut coordinator, mut rx, _disposed, created) = coordinator();
        let host = Uuid::new_v4();
        let offer = serde_json::json!({"sdp": "offer", "candidates": [1, 2]});

        coordinator.on_signal(host, offer).unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        match rx.try_recv().unwrap() {
            ClientEvent::Signal { to, signal, .. } => {
                assert_eq!(to, host);
                assert_eq!(signal["initiator"], false);
            },
            other => panic!("Expected Signal, got {other:?}"),
        }

        // the answer back from the initiator applies to the existing link,
        // no new link and no further outbound signal
        coordinator
            .on_signal(host, serde_json::json!({"sdp": "more"}))
            .unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn departure_disposes_exactly_once() {
        let (mut coordinator, _rx, disposed, _created) = coordinator();
        let alice = Uuid::new_v4();
        coordinator.on_participant_joined(alice).unwrap();

        coordinator.on_participant_left(alice);
        coordinator.on_participant_left(alice);

        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        assert!(coordinator.arena().is_empty());
    }

    #[test]
    fn released_connection_id_is_never_reused() {
        let (mut coordinator, _rx, _disposed, _created) = coordinator();
        let alice = Uuid::new_v4();
        coordinator.on_participant_joined(alice).unwrap();
        coordinator.on_participant_left(alice);

        let err = coordinator.on_participant_joined(alice).unwrap_err();
        assert!(err.to_string().contains("already released"));
        assert!(coordinator.arena().is_empty());
    }

    #[test]
    fn session_end_disposes_every_link() {
        let (mut coordinator, _rx, disposed, _created) = coordinator();
        for _ in 0..3 {
            coordinator.on_participant_joined(Uuid::new_v4()).unwrap();
        }

        coordinator.on_session_ended();

        assert_eq!(disposed.load(Ordering::SeqCst), 3);
        assert!(coordinator.arena().is_empty());
    }

    #[test]
    fn dropping_the_arena_disposes_outstanding_links() {
        let (factory, disposed, _created) = MockFactory::new();
        {
            let mut arena = PeerArena::new();
            arena
                .insert(Uuid::new_v4(), factory.create(Uuid::new_v4(), true))
                .unwrap();
        }
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }
}
