//! Navigation surface for a terminal session.

use smile_portal_client::{LOGIN_PATH, Navigator};
use tracing::warn;

/// Reports forced navigations on standard error.
///
/// A terminal has no screen to switch, so a redirect to login becomes a
/// prompt to sign in again.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn hard_redirect(&self, path: &str) {
        warn!(path, "forced navigation");
        if path == LOGIN_PATH {
            eprintln!("Your session has ended. Run `smile-portal login` to sign in again.");
        } else {
            eprintln!("Navigate to {path}");
        }
    }
}
