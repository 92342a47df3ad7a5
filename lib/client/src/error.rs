//! Error types for the client crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `TransportError`: The wire failed before a response arrived
//! - `ClientError`: Outcome of an API call as seen by the caller
//! - `CredentialError`: Credential persistence failures
//! - `ResourceError`: Resource-level misuse wrapped around `ClientError`

use std::fmt;

/// Errors raised by a [`Transport`](crate::Transport) before any response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Connecting to the server failed.
    ConnectionFailed { reason: String },
    /// The request could not be built or sent.
    RequestFailed { reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::ConnectionFailed { reason } => write!(f, "connection failed: {reason}"),
            Self::RequestFailed { reason } => write!(f, "request failed: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors returned by [`ApiClient`](crate::ApiClient) calls.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// No response was received (connection failure, timeout).
    Network { reason: String },
    /// The server responded with a non-success status.
    Http {
        status: u16,
        body: serde_json::Value,
    },
    /// A 401 needed a refresh but no refresh token was stored.
    NoRefreshToken,
    /// The request body could not be encoded.
    Encode { reason: String },
    /// The response body did not match the expected shape.
    Decode { reason: String },
    /// Credential persistence failed while handling the call.
    Credential(CredentialError),
}

impl ClientError {
    /// Returns the HTTP status, if the server responded.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the server answered `401 Unauthorized`.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { reason } => write!(f, "network error: {reason}"),
            Self::Http { status, body } => {
                if body.is_null() {
                    write!(f, "server responded with status {status}")
                } else {
                    write!(f, "server responded with status {status}: {body}")
                }
            }
            Self::NoRefreshToken => write!(f, "no refresh token available"),
            Self::Encode { reason } => write!(f, "failed to encode request: {reason}"),
            Self::Decode { reason } => write!(f, "failed to decode response: {reason}"),
            Self::Credential(err) => write!(f, "credential store error: {err}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        Self::Network {
            reason: err.to_string(),
        }
    }
}

impl From<CredentialError> for ClientError {
    fn from(err: CredentialError) -> Self {
        Self::Credential(err)
    }
}

/// Errors from credential operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Reading persisted credentials failed.
    LoadFailed { reason: String },
    /// Writing persisted credentials failed.
    StorageFailed { reason: String },
    /// The persisted file is not a valid credential document.
    InvalidFormat { reason: String },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { reason } => write!(f, "failed to load credentials: {reason}"),
            Self::StorageFailed { reason } => {
                write!(f, "storage operation failed: {reason}")
            }
            Self::InvalidFormat { reason } => {
                write!(f, "invalid credential format: {reason}")
            }
        }
    }
}

impl std::error::Error for CredentialError {}

/// Errors from resource operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The resource does not accept writes.
    ReadOnly { resource: String },
    /// The resource cannot be addressed by record ID.
    NotAddressable { resource: String },
    /// The resource has no collection endpoint.
    NotListable { resource: String },
    /// The resource does not store an image.
    ImageNotSupported { resource: String },
    /// The underlying API call failed.
    Client(ClientError),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly { resource } => write!(f, "resource '{resource}' is read-only"),
            Self::NotAddressable { resource } => {
                write!(f, "resource '{resource}' has no per-record endpoint")
            }
            Self::NotListable { resource } => {
                write!(f, "resource '{resource}' has no collection endpoint")
            }
            Self::ImageNotSupported { resource } => {
                write!(f, "resource '{resource}' does not accept an image")
            }
            Self::Client(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ResourceError {}

impl From<ClientError> for ResourceError {
    fn from(err: ClientError) -> Self {
        Self::Client(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_becomes_network_error() {
        let err: ClientError = TransportError::Timeout.into();
        assert_eq!(
            err,
            ClientError::Network {
                reason: "request timed out".to_string()
            }
        );
        assert_eq!(err.status(), None);
    }

    #[test]
    fn http_error_display_includes_body() {
        let err = ClientError::Http {
            status: 403,
            body: serde_json::json!({"detail": "forbidden"}),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("forbidden"));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn http_error_without_body() {
        let err = ClientError::Http {
            status: 401,
            body: serde_json::Value::Null,
        };
        assert_eq!(err.to_string(), "server responded with status 401");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn no_refresh_token_display() {
        assert!(
            ClientError::NoRefreshToken
                .to_string()
                .contains("no refresh token")
        );
    }

    #[test]
    fn resource_error_read_only_display() {
        let err = ResourceError::ReadOnly {
            resource: "users".to_string(),
        };
        assert!(err.to_string().contains("users"));
        assert!(err.to_string().contains("read-only"));
    }
}
