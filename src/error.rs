//! Unified error model for the session guard.
//! Every failure in this subsystem is resolved locally (the guard renders,
//! redirects, or shows a loading state); this enum exists so internal plumbing
//! can classify failures consistently before they are swallowed or logged.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed configuration (e.g. no authority base URL).
    Config { code: String, message: String },
    /// Transport-level failure talking to the authority: connect, timeout, 5xx.
    Network { code: String, message: String },
    /// Anything else; should not escape this crate.
    Internal { code: String, message: String },
}

impl AuthError {
    pub fn code_str(&self) -> &str {
        match self {
            AuthError::Config { code, .. }
            | AuthError::Network { code, .. }
            | AuthError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::Config { message, .. }
            | AuthError::Network { message, .. }
            | AuthError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn config<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Config { code: code.into(), message: msg.into() } }
    pub fn network<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Network { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Internal { code: code.into(), message: msg.into() } }

    /// Transient failures never invalidate a cached session; callers keep
    /// trusting local state and retry on a later navigation.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Network { .. })
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AuthError {}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connect"
        } else {
            "http"
        };
        AuthError::Network { code: code.into(), message: err.to_string() }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Internal { code: "internal".into(), message: err.to_string() }
    }
}
