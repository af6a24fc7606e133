//! Session state tracking for the invocation gate
//!
//! [`SessionState`] is the single source of truth for "has the gate opened,
//! and if it failed, why". It holds one of three phases: pending, open with
//! the established [`Session`], or failed with the remembered cause. Both
//! settled phases are terminal; the transition methods are crate-private so
//! only the gate can flip them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionInitCause;

/// Session data delivered by the backend once the handshake completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier of this session
    pub id: Uuid,
    /// The subscriber this session was established for
    pub subscriber_id: String,
    /// Bearer token for subsequent API calls
    pub token: String,
    /// Unread notification count at handshake time
    pub unread_count: u64,
    /// When the backend created the session
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
enum SessionPhase {
    #[default]
    Pending,
    Open(Session),
    Failed(SessionInitCause),
}

/// Tracks whether session initialization has resolved, and how.
///
/// Failure is permanent: once `mark_failed` has run, the state reports the
/// remembered cause forever and never reports open.
#[derive(Debug, Default)]
pub struct SessionState {
    phase: SessionPhase,
}

impl SessionState {
    /// Create a new state in the pending phase
    pub fn new() -> Self {
        Self::default()
    }

    /// True only after a successful transition
    pub fn is_open(&self) -> bool {
        matches!(self.phase, SessionPhase::Open(_))
    }

    /// True once either terminal transition has occurred
    pub fn is_settled(&self) -> bool {
        !matches!(self.phase, SessionPhase::Pending)
    }

    /// The remembered failure cause, if initialization failed
    pub fn last_failure(&self) -> Option<&SessionInitCause> {
        match &self.phase {
            SessionPhase::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    /// The established session, if initialization succeeded
    pub fn session(&self) -> Option<&Session> {
        match &self.phase {
            SessionPhase::Open(session) => Some(session),
            _ => None,
        }
    }

    /// Transition to open. Only meaningful from the pending phase; the gate
    /// checks `is_settled` before calling.
    pub(crate) fn mark_open(&mut self, session: Session) {
        debug_assert!(!self.is_settled(), "session state settled twice");
        self.phase = SessionPhase::Open(session);
    }

    /// Transition to failed, remembering the cause permanently.
    pub(crate) fn mark_failed(&mut self, cause: SessionInitCause) {
        debug_assert!(!self.is_settled(), "session state settled twice");
        self.phase = SessionPhase::Failed(cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_session() -> Session {
        Session {
            id: Uuid::new_v4(),
            subscriber_id: "subscriber-1".to_string(),
            token: "jwt-token".to_string(),
            unread_count: 3,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn starts_pending() {
        let state = SessionState::new();
        assert!(!state.is_open());
        assert!(!state.is_settled());
        assert!(state.last_failure().is_none());
        assert!(state.session().is_none());
    }

    #[test]
    fn open_is_terminal_and_exposes_the_session() {
        let mut state = SessionState::new();
        state.mark_open(test_session());

        assert!(state.is_open());
        assert!(state.is_settled());
        assert!(state.last_failure().is_none());
        assert_eq!(state.session().unwrap().subscriber_id, "subscriber-1");
    }

    #[test]
    fn failure_remembers_the_same_cause_instance() {
        let cause: SessionInitCause =
            Arc::new(std::io::Error::new(std::io::ErrorKind::Other, "network down"));
        let mut state = SessionState::new();
        state.mark_failed(Arc::clone(&cause));

        assert!(!state.is_open());
        assert!(state.is_settled());
        assert!(Arc::ptr_eq(state.last_failure().unwrap(), &cause));
    }

    #[test]
    fn session_payload_round_trips_through_json() {
        let json = r#"{
            "id": "7f2c1e84-9c4b-4f4e-8d8a-2b6f4a6c9e01",
            "subscriber_id": "subscriber-42",
            "token": "jwt-token",
            "unread_count": 7,
            "created_at": "2026-08-25T12:00:00Z"
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.subscriber_id, "subscriber-42");
        assert_eq!(session.unread_count, 7);
    }
}
