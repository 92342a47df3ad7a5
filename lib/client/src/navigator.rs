//! Navigation side effects.
//!
//! The client never renders anything. When a credential refresh fails for
//! good it asks a [`Navigator`] to leave the current screen for the login
//! screen; what that means is up to the front end.

/// Path of the login screen.
pub const LOGIN_PATH: &str = "/login";

/// Path of the application root.
pub const ROOT_PATH: &str = "/";

/// Performs hard navigations requested by the client.
pub trait Navigator: Send + Sync {
    /// Abandons the current view and navigates to `path`.
    fn hard_redirect(&self, path: &str);
}
