//! Error contexts for the command-line front end.
//!
//! Library errors are wrapped with one of these contexts as they reach the
//! command layer, so the printed report says which step failed.

use std::fmt;

/// The command step that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config,
    /// The credential file could not be opened.
    Credentials,
    /// The HTTP transport could not be built.
    Transport,
    /// Session bootstrap or teardown failed.
    Session,
    /// Login failed.
    Login,
    /// A resource call failed.
    Resource,
    /// A command argument was invalid.
    InvalidInput { reason: String },
    /// Output could not be written.
    Output,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "failed to load configuration"),
            Self::Credentials => write!(f, "failed to open credential store"),
            Self::Transport => write!(f, "failed to set up HTTP client"),
            Self::Session => write!(f, "session operation failed"),
            Self::Login => write!(f, "login failed"),
            Self::Resource => write!(f, "resource request failed"),
            Self::InvalidInput { reason } => write!(f, "invalid input: {reason}"),
            Self::Output => write!(f, "failed to write output"),
        }
    }
}

impl std::error::Error for CliError {}
