//! # Inbox Client Core - Session-Gated Call Coordination
//!
//! This crate provides the coordination layer inbox client applications use
//! to call their backend immediately after construction, without waiting for
//! the asynchronous session handshake that completes out-of-band:
//!
//! - **[`InvocationGate`]**: accepts operations at any time; defers them
//!   while the handshake is in flight, replays them in arrival order on
//!   success, and rejects them uniformly on failure
//! - **[`SessionState`]**: tracks whether initialization resolved and
//!   remembers a failure cause permanently
//! - **[`SessionEvents`]**: the owner-injected event source that announces
//!   the handshake outcome (no process-wide singletons)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use inbox_client_core::{InboxError, InvocationGate, SessionEvents};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let events = SessionEvents::default();
//!     let gate = Arc::new(InvocationGate::new());
//!     let _subscription = gate.attach(&events);
//!
//!     // Callers never see the handshake: this resolves once the session
//!     // settles, with the operation's own result or a uniform error.
//!     let unread = gate
//!         .run(|| async { Ok::<u64, InboxError>(42) })
//!         .await?;
//!     println!("unread: {unread}");
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Calls queued before the outcome are dispatched strictly in arrival
//!   order; calls after a successful open pass straight through
//! - After a failed handshake no operation is ever invoked again; every
//!   caller receives the same remembered cause, uniformly wrapped
//! - The gate never panics and never rejects outside the returned future

#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod gate;
pub mod session;

// Re-export main types
pub use error::{InboxError, InboxResult, SessionInitCause};
pub use events::{
    SessionEvent, SessionEventHandler, SessionEvents, SessionOutcome, SubscriptionHandle,
};
pub use gate::InvocationGate;
pub use session::{Session, SessionState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
