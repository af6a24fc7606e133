//! Session-gated invocation dispatch
//!
//! [`InvocationGate`] is the entry point callers use to run operations that
//! require an established session. Calls issued while the handshake is still
//! in flight are queued and settled later, in arrival order, when the
//! handshake resolves; calls issued after a successful handshake pass
//! straight through; calls issued after a failed handshake are rejected
//! immediately with the remembered cause, without ever invoking the
//! operation.
//!
//! # Lifecycle
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use inbox_client_core::{InboxError, InvocationGate, SessionEvents};
//!
//! #[tokio::main]
//! async fn main() {
//!     let events = SessionEvents::default();
//!     let gate = Arc::new(InvocationGate::new());
//!
//!     // Keep the handle alive for as long as the gate should listen.
//!     let _subscription = gate.attach(&events);
//!
//!     // Callers may invoke immediately; the call is deferred until the
//!     // handshake settles.
//!     let gate_for_call = Arc::clone(&gate);
//!     let pending = tokio::spawn(async move {
//!         gate_for_call
//!             .run(|| async { Ok::<_, InboxError>("notifications".to_string()) })
//!             .await
//!     });
//!
//!     // ... the initializer eventually emits the outcome:
//!     // events.notify_initialize_resolved(SessionOutcome::Established(session));
//!     # drop(pending);
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, oneshot, Mutex};

use crate::error::{InboxError, InboxResult, SessionInitCause};
use crate::events::{
    NoopSessionHandler, SessionEvent, SessionEventHandler, SessionEvents, SessionOutcome,
    SubscriptionHandle,
};
use crate::session::{Session, SessionState};

/// How a queued invocation is settled when the handshake resolves
enum Disposition {
    /// Invoke the deferred operation and settle with its own result
    Invoke,
    /// Settle with the synthesized error; the operation is never invoked
    Reject(InboxError),
}

/// A deferred unit of work plus the settle side of its caller's handle.
///
/// The caller's result type is erased here: the closure captures both the
/// operation thunk and the oneshot sender, so the queue stores invocations of
/// arbitrary result types side by side. Each invocation is settled exactly
/// once and never re-enters the queue.
struct QueuedInvocation {
    dispatch: Box<dyn FnOnce(Disposition) -> BoxFuture<'static, ()> + Send>,
}

impl QueuedInvocation {
    fn new<T, F, Fut>(operation: F, settle: oneshot::Sender<InboxResult<T>>) -> Self
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = InboxResult<T>> + Send + 'static,
    {
        let dispatch = Box::new(move |disposition: Disposition| -> BoxFuture<'static, ()> {
            match disposition {
                Disposition::Invoke => {
                    // The thunk runs here, at dispatch time, so invocation
                    // order is exactly queue order.
                    let fut = operation();
                    Box::pin(async move {
                        // A caller that stopped awaiting its handle is fine.
                        let _ = settle.send(fut.await);
                    })
                }
                Disposition::Reject(err) => Box::pin(async move {
                    let _ = settle.send(Err(err));
                }),
            }
        });
        Self { dispatch }
    }
}

#[derive(Default)]
struct GateInner {
    state: SessionState,
    queue: Vec<QueuedInvocation>,
}

/// Defers operations until session initialization settles, then replays or
/// rejects them exactly once.
///
/// State machine per gate instance: pending, then either open (success) or
/// failed (failure). Both settled states are terminal; a duplicate
/// resolution is logged and ignored. Once an invocation is accepted by
/// [`run`](Self::run) it is guaranteed to be settled - with its own result,
/// with the synthesized initialization error, or (if the notification never
/// fires) left pending for the gate's lifetime. There is no cancellation and
/// no built-in timeout; callers wanting one race the returned future
/// externally.
pub struct InvocationGate {
    inner: Mutex<GateInner>,
    handler: Arc<dyn SessionEventHandler>,
}

impl InvocationGate {
    /// Create a gate in the pending state with no lifecycle hooks
    pub fn new() -> Self {
        Self::with_handler(NoopSessionHandler::shared())
    }

    /// Create a gate whose transition invokes the given hooks.
    ///
    /// The hook runs to completion before any queued caller observes a
    /// result, so handler-visible state is consistent by the time deferred
    /// calls settle.
    pub fn with_handler(handler: Arc<dyn SessionEventHandler>) -> Self {
        Self {
            inner: Mutex::new(GateInner::default()),
            handler,
        }
    }

    /// Run `operation` once the session allows it.
    ///
    /// * Gate open: the operation is invoked immediately and its result
    ///   returned unmodified.
    /// * Initialization failed: resolves with
    ///   [`InboxError::SessionInit`] wrapping the remembered cause; the
    ///   operation is never invoked.
    /// * Still pending: the call is queued in arrival order and the returned
    ///   future resolves when the handshake settles.
    ///
    /// Never blocks the caller and never panics; every outcome arrives
    /// through the returned future.
    pub async fn run<T, F, Fut>(&self, operation: F) -> InboxResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = InboxResult<T>> + Send + 'static,
    {
        let rx = {
            let mut inner = self.inner.lock().await;

            if inner.state.is_open() {
                // Steady state: straight pass-through, no queueing overhead.
                drop(inner);
                return operation().await;
            }
            if let Some(cause) = inner.state.last_failure() {
                return Err(InboxError::session_init(Arc::clone(cause)));
            }

            let (tx, rx) = oneshot::channel();
            inner.queue.push(QueuedInvocation::new(operation, tx));
            tracing::debug!(queued = inner.queue.len(), "session pending, invocation deferred");
            rx
        };

        rx.await.unwrap_or_else(|_| Err(InboxError::GateClosed))
    }

    /// Handle the one-time initialization outcome.
    ///
    /// Normally driven by the listener created by [`attach`](Self::attach);
    /// exposed for owners that deliver the outcome directly. The first call
    /// settles the gate permanently: the lifecycle hook runs, then every
    /// queued invocation is dispatched (success) or rejected (failure) in
    /// arrival order and the queue is cleared. Later calls are ignored with
    /// a warning.
    pub async fn handle_resolved(&self, outcome: SessionOutcome) {
        let drained = {
            let mut inner = self.inner.lock().await;
            if inner.state.is_settled() {
                tracing::warn!("duplicate session resolution ignored, gate already settled");
                return;
            }
            match &outcome {
                SessionOutcome::Established(session) => inner.state.mark_open(session.clone()),
                SessionOutcome::Failed(cause) => inner.state.mark_failed(Arc::clone(cause)),
            }
            std::mem::take(&mut inner.queue)
        };

        match outcome {
            SessionOutcome::Established(session) => {
                tracing::info!(
                    queued = drained.len(),
                    session_id = %session.id,
                    "session established, dispatching deferred invocations"
                );
                self.handler.on_session_established(&session).await;
                for invocation in drained {
                    // Spawned in queue order; each handle settles with its
                    // own operation's result as it completes.
                    tokio::spawn((invocation.dispatch)(Disposition::Invoke));
                }
            }
            SessionOutcome::Failed(cause) => {
                tracing::warn!(
                    queued = drained.len(),
                    error = %cause,
                    "session initialization failed, rejecting deferred invocations"
                );
                self.handler.on_session_failed(&cause).await;
                for invocation in drained {
                    let err = InboxError::session_init(Arc::clone(&cause));
                    (invocation.dispatch)(Disposition::Reject(err)).await;
                }
            }
        }
    }

    /// Subscribe this gate to a session event source.
    ///
    /// The listener forwards the first `InitializeResolved` event to
    /// [`handle_resolved`](Self::handle_resolved) and then exits. The
    /// returned handle owns the listener task; keep it alive for as long as
    /// the gate should listen, and drop it to tear the subscription down.
    pub fn attach(self: &Arc<Self>, events: &SessionEvents) -> SubscriptionHandle {
        let mut rx = events.subscribe();
        let gate = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SessionEvent::InitializeResolved(outcome)) => {
                        gate.handle_resolved(outcome).await;
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        SubscriptionHandle::new(task)
    }

    /// True only after the session was established
    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.state.is_open()
    }

    /// The remembered initialization failure, if any
    pub async fn last_failure(&self) -> Option<SessionInitCause> {
        self.inner.lock().await.state.last_failure().map(Arc::clone)
    }

    /// The established session, if any
    pub async fn session(&self) -> Option<Session> {
        self.inner.lock().await.state.session().cloned()
    }
}

impl Default for InvocationGate {
    fn default() -> Self {
        Self::new()
    }
}
