//! Error types used throughout the application

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ChallengeHint, EventStatus};

/// Main error type for RingRelay
///
/// Every variant keeps its kind intact across crate boundaries so the
/// invocation boundary can decide whether to redeliver, alert, or drop.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum RelayError {
    /// Network failure or 5xx response that survived the retry budget.
    #[error("Transient error: {0}")]
    Transient(String),

    /// The OAuth endpoint answered HTTP 412 and wants a 2FA code.
    #[error("Two-factor challenge required ({})", .0.describe())]
    ChallengeRequired(ChallengeHint),

    /// Non-retryable 4xx response or a response body that failed to decode.
    #[error("Client error{}: {message}", status_suffix(.status))]
    Client { status: Option<u16>, message: String },

    /// A conditional write on the event record was rejected.
    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    /// The remote store itself is failing.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The account layout or request is outside what the relay handles.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl RelayError {
    /// Shorthand for a client error without an HTTP status.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client { status: None, message: message.into() }
    }

    /// Whether redelivering the same event later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::StoreUnavailable(_))
    }

    /// Whether this is a rejected conditional write.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Stable label suitable for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::ChallengeRequired(_) => "challenge_required",
            Self::Client { .. } => "client",
            Self::Conflict(_) => "conflict",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Config(_) => "config",
            Self::InvalidEnvelope(_) => "invalid_envelope",
            Self::NotFound(_) => "not_found",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

/// Why a conditional transition on an event record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ConflictReason {
    /// Same event, but another invocation already moved it past the expected
    /// status.
    AlreadyOwned { status: EventStatus },

    /// A different event occupies the record; this one must wait until that
    /// event reaches `processed`.
    Blocked { current_uuid: String, status: EventStatus },

    /// No record exists for the principal.
    Missing,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOwned { status } => {
                write!(f, "event already handled by another invocation (status {status})")
            }
            Self::Blocked { current_uuid, status } => {
                write!(f, "record occupied by event {current_uuid} (status {status})")
            }
            Self::Missing => write!(f, "no event record for principal"),
        }
    }
}

/// Result type alias for RingRelay operations
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_and_store_errors_are_retryable() {
        assert!(RelayError::Transient("503".into()).is_retryable());
        assert!(RelayError::StoreUnavailable("pool".into()).is_retryable());
        assert!(!RelayError::client("bad request").is_retryable());
        assert!(!RelayError::Conflict(ConflictReason::Missing).is_retryable());
        assert!(!RelayError::ChallengeRequired(ChallengeHint::default()).is_retryable());
    }

    #[test]
    fn client_error_display_includes_status() {
        let err = RelayError::Client { status: Some(401), message: "unauthorized".into() };
        assert_eq!(err.to_string(), "Client error (HTTP 401): unauthorized");
        assert_eq!(RelayError::client("malformed").to_string(), "Client error: malformed");
    }

    #[test]
    fn conflict_serializes_with_reason_tag() {
        let err = RelayError::Conflict(ConflictReason::Blocked {
            current_uuid: "A".into(),
            status: EventStatus::Processing,
        });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Conflict");
        assert_eq!(json["detail"]["reason"], "blocked");
        assert_eq!(json["detail"]["current_uuid"], "A");
        assert_eq!(err.kind(), "conflict");
    }
}
