//! Error types for the inbox client coordination layer
//!
//! Every outcome the gate produces - operation success, operation failure,
//! or initialization failure - is delivered through the returned future's
//! normal `Result` channel. The gate itself never panics and never surfaces
//! an error anywhere except the `Err` arm of [`InboxResult`].

use std::sync::Arc;

use thiserror::Error;

/// Result type for inbox client operations
pub type InboxResult<T> = Result<T, InboxError>;

/// The remembered cause of a failed session handshake.
///
/// Reference-counted so that every caller - whether its call was queued
/// before the failure or issued long after - receives the same underlying
/// cause instance, not a copy.
pub type SessionInitCause = Arc<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in the inbox client
#[derive(Debug, Error, Clone)]
pub enum InboxError {
    /// The session handshake failed; the cause is remembered for the
    /// lifetime of the gate and re-surfaced to every caller.
    #[error("failed to initialize session, please contact support")]
    SessionInit {
        /// The original handshake failure, shared across all callers.
        #[source]
        cause: SessionInitCause,
    },

    /// The invocation gate was dropped while calls were still queued
    #[error("invocation gate dropped before the session resolved")]
    GateClosed,

    /// API request error
    #[error("API request failed: {message}")]
    Api {
        /// Human-readable description of the API failure
        message: String,
    },

    /// Network error
    #[error("network error: {message}")]
    Network {
        /// Human-readable description of the network failure
        message: String,
    },

    /// Invalid state error
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the state violation
        message: String,
    },

    /// Internal error
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal failure
        message: String,
    },
}

impl InboxError {
    /// Wrap a remembered handshake failure
    pub fn session_init(cause: SessionInitCause) -> Self {
        Self::SessionInit { cause }
    }

    /// Create an API request error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The shared handshake failure cause, if this error wraps one
    pub fn session_init_cause(&self) -> Option<&SessionInitCause> {
        match self {
            Self::SessionInit { cause } => Some(cause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_init_keeps_the_shared_cause() {
        let cause: SessionInitCause =
            Arc::new(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = InboxError::session_init(Arc::clone(&cause));

        let kept = err.session_init_cause().unwrap();
        assert!(Arc::ptr_eq(kept, &cause));
        assert_eq!(
            err.to_string(),
            "failed to initialize session, please contact support"
        );
    }

    #[test]
    fn non_init_errors_expose_no_cause() {
        assert!(InboxError::api("404").session_init_cause().is_none());
        assert!(InboxError::GateClosed.session_init_cause().is_none());
    }
}
