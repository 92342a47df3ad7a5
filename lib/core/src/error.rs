//! Shared `Result` alias for the smile-portal crates.
//!
//! Errors are `rootcause` reports whose current context is the error type
//! of the layer that produced them: `ClientError` from the HTTP client,
//! `LoginError` and `SessionError` from the session layer, and `CliError`
//! from the front end. Callers branch on `current_context()` and attach
//! their own context with `.context()` before handing the report upward.

use rootcause::Report;

/// A `Result` whose error is a report carrying context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
