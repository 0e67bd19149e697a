//! Errors raised while talking to the applications backend.
//!
//! Messages sent by the backend are carried verbatim so they can be shown
//! to the operator unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend refused the stage transition (unknown application,
    /// application already closed, stage mismatch). Never retried.
    #[error("{message}")]
    InvalidTransition { status: u16, message: String },

    /// A read request was refused by the backend.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The backend answered with a status that usually clears on its own
    /// (408, 429, 502, 503, 504).
    #[error("{message}")]
    Transient { status: u16, message: String },

    /// Connection, DNS or timeout failure below HTTP.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to parse backend response: {0}")]
    Decode(String),

    /// The backend answered a transition with 2xx but its reply could not
    /// be read, so the transition may or may not have been applied.
    #[error("the server answered (status {status}) but its reply could not be read: {reason}")]
    OutcomeUnknown { status: u16, reason: String },

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("not signed in: no session credential available")]
    Unauthenticated,
}

impl GatewayError {
    /// Whether the operator may reasonably repeat the same action.
    ///
    /// The gateway itself never repeats a request.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transient { .. } | GatewayError::Network(_))
    }

    /// HTTP status reported by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::InvalidTransition { status, .. }
            | GatewayError::Api { status, .. }
            | GatewayError::Transient { status, .. }
            | GatewayError::OutcomeUnknown { status, .. } => Some(*status),
            GatewayError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_display_is_server_message() {
        let err = GatewayError::InvalidTransition {
            status: 400,
            message: "Application is already in a terminal stage".into(),
        };
        assert_eq!(err.to_string(), "Application is already in a terminal stage");
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn transient_display() {
        let err = GatewayError::Transient {
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "maintenance");
        assert!(err.is_transient());
    }

    #[test]
    fn outcome_unknown_is_not_transient() {
        let err = GatewayError::OutcomeUnknown {
            status: 200,
            reason: "missing field `timestamp`".into(),
        };
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn unauthenticated_is_not_transient() {
        assert!(!GatewayError::Unauthenticated.is_transient());
        assert_eq!(GatewayError::Unauthenticated.status(), None);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GatewayError>();
    }
}
