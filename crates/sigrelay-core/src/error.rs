//! Shared error type across sigrelay crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed or out-of-protocol request.
    BadMessage,
    /// Target user has no reachable session.
    NoSessionForUser,
    /// Auth failed.
    AuthFailed,
    /// Unsupported protocol or config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadMessage => "bad_message",
            ClientCode::NoSessionForUser => "no_session_for_user",
            ClientCode::AuthFailed => "auth_failed",
            ClientCode::UnsupportedVersion => "unsupported_version",
            ClientCode::Internal => "internal_error",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SigRelayError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum SigRelayError {
    #[error("bad message: {0}")]
    BadMessage(String),
    #[error("no session for user: {0}")]
    NoSessionForUser(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl SigRelayError {
    /// Shorthand for [`SigRelayError::BadMessage`].
    pub fn bad(msg: impl Into<String>) -> Self {
        SigRelayError::BadMessage(msg.into())
    }

    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SigRelayError::BadMessage(_) => ClientCode::BadMessage,
            SigRelayError::NoSessionForUser(_) => ClientCode::NoSessionForUser,
            SigRelayError::AuthFailed => ClientCode::AuthFailed,
            SigRelayError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            SigRelayError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Text sent to clients. Internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            SigRelayError::BadMessage(m) | SigRelayError::NoSessionForUser(m) => m.clone(),
            SigRelayError::Internal(_) => "internal error".into(),
            other => other.to_string(),
        }
    }
}
