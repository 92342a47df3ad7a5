//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `SessionError`: Session lifecycle failures
//! - `LoginError`: Login failures, surfaced at the login boundary only

use smile_portal_client::{ClientError, CredentialError};
use std::fmt;

/// Errors from session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `initialize` was called while another bootstrap was still running.
    AlreadyInitializing,
    /// Persisted credentials could not be updated.
    Storage(CredentialError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitializing => {
                write!(f, "session initialization is already in progress")
            }
            Self::Storage(err) => write!(f, "session storage error: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CredentialError> for SessionError {
    fn from(err: CredentialError) -> Self {
        Self::Storage(err)
    }
}

/// Errors from the login flow.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginError {
    /// The server accepted the credentials but resolved no role.
    RoleMissing,
    /// The server rejected the username or password.
    InvalidCredentials,
    /// The login call failed for any other reason.
    Request(ClientError),
    /// The issued tokens could not be persisted.
    Storage(CredentialError),
}

impl LoginError {
    /// Returns the message to show the person signing in.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RoleMissing => "User role not found. Please contact admin.",
            Self::InvalidCredentials | Self::Request(_) | Self::Storage(_) => {
                "Invalid credentials or server error."
            }
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleMissing => write!(f, "login response did not include a role"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::Request(err) => write!(f, "login request failed: {err}"),
            Self::Storage(err) => write!(f, "failed to store login credentials: {err}"),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<CredentialError> for LoginError {
    fn from(err: CredentialError) -> Self {
        Self::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_display() {
        let err = SessionError::AlreadyInitializing;
        assert!(err.to_string().contains("already in progress"));

        let err = SessionError::Storage(CredentialError::StorageFailed {
            reason: "read-only file system".to_string(),
        });
        assert!(err.to_string().contains("read-only file system"));
    }

    #[test]
    fn login_error_display() {
        assert!(LoginError::RoleMissing.to_string().contains("role"));

        let err = LoginError::Request(ClientError::Network {
            reason: "connection refused".to_string(),
        });
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn user_messages() {
        assert_eq!(
            LoginError::RoleMissing.user_message(),
            "User role not found. Please contact admin."
        );
        assert_eq!(
            LoginError::InvalidCredentials.user_message(),
            "Invalid credentials or server error."
        );
    }
}
