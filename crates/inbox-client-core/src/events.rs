//! Session event plumbing for the invocation gate
//!
//! The gate learns that the handshake settled through an event source owned
//! by whoever drives initialization, not through a process-wide singleton.
//! [`SessionEvents`] is that source: a broadcast channel the owner emits the
//! single `InitializeResolved` event on. The gate subscribes to it via
//! [`crate::gate::InvocationGate::attach`], which returns a
//! [`SubscriptionHandle`] owning the listener task.
//!
//! [`SessionEventHandler`] is the hook seam for code that wants to react to
//! the transition itself (cache priming, telemetry, UI state) independently
//! of the queued calls. Hooks run exactly once, before any deferred caller
//! sees a result.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::SessionInitCause;
use crate::session::Session;

/// How session initialization settled: exactly one of the two, by construction.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The handshake succeeded and produced a session
    Established(Session),
    /// The handshake failed; the cause is shared with every caller
    Failed(SessionInitCause),
}

/// Events delivered on the session event bus
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Session initialization settled. Fired once per gate lifetime.
    InitializeResolved(SessionOutcome),
}

/// Broadcast source for session events.
///
/// Owned and emitted on by the component that performs the handshake;
/// consumers subscribe before the outcome is emitted. The initialize-resolved
/// event is single-fire by contract with the emitter.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create an event source with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit the initialize-resolved event to all current subscribers
    pub fn notify_initialize_resolved(&self, outcome: SessionOutcome) {
        let receivers = self.tx.receiver_count();
        if let Err(e) = self.tx.send(SessionEvent::InitializeResolved(outcome)) {
            tracing::debug!("no subscribers for session resolution event: {}", e);
        } else {
            tracing::debug!(receivers, "session resolution event emitted");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Hooks invoked when the session transition occurs.
///
/// All methods have empty default bodies; implement only what you need.
#[async_trait]
pub trait SessionEventHandler: Send + Sync {
    /// Called once when the session is established, before queued calls run
    async fn on_session_established(&self, _session: &Session) {}

    /// Called once when initialization fails, before queued calls are rejected
    async fn on_session_failed(&self, _cause: &SessionInitCause) {}
}

/// No-op handler used when the gate owner installs no hooks
pub(crate) struct NoopSessionHandler;

#[async_trait]
impl SessionEventHandler for NoopSessionHandler {}

/// Owns the listener task created by [`crate::gate::InvocationGate::attach`].
///
/// Dropping the handle aborts the listener, so the subscription lives exactly
/// as long as the owner keeps the handle.
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// True once the listener has observed the outcome (or the source closed)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Tear the subscription down explicitly
    pub fn detach(self) {
        self.task.abort();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl NoopSessionHandler {
    pub(crate) fn shared() -> Arc<dyn SessionEventHandler> {
        Arc::new(NoopSessionHandler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_session() -> Session {
        Session {
            id: Uuid::new_v4(),
            subscriber_id: "subscriber-1".to_string(),
            token: "jwt-token".to_string(),
            unread_count: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_the_resolution_event() {
        let events = SessionEvents::default();
        let mut rx = events.subscribe();

        events.notify_initialize_resolved(SessionOutcome::Established(test_session()));

        match rx.recv().await.unwrap() {
            SessionEvent::InitializeResolved(SessionOutcome::Established(session)) => {
                assert_eq!(session.subscriber_id, "subscriber-1");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn emitting_without_subscribers_is_harmless() {
        let events = SessionEvents::new(4);
        events.notify_initialize_resolved(SessionOutcome::Established(test_session()));
    }
}
