//! Session state for the signed-in user.
//!
//! A [`Session`] is an immutable snapshot: the identity of the signed-in
//! user (if any) and whether the initial profile fetch is still running.
//! The live state sits in a [`SessionHandle`] shared by the
//! [`SessionStore`], which drives its lifecycle, and the
//! [`SessionResetNavigator`], which signs the user out when the API client
//! gives up on their credentials.

use crate::error::SessionError;
use crate::identity::Identity;
use crate::role::Role;
use serde::Serialize;
use smile_portal_client::{ApiClient, LOGIN_PATH, Navigator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

/// Path of the profile endpoint.
pub const PROFILE_PATH: &str = "/user/profile/";

/// Snapshot of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    identity: Option<Identity>,
    loading: bool,
}

impl Session {
    /// A session whose identity has not been resolved yet.
    #[must_use]
    pub fn bootstrapping() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }

    /// A resolved session with nobody signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            identity: None,
            loading: false,
        }
    }

    /// A resolved session for `identity`.
    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            loading: false,
        }
    }

    /// Returns the signed-in identity.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns true while the identity is not yet authoritative.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the derived role, `Role::None` when nobody is signed in.
    #[must_use]
    pub fn role(&self) -> Role {
        self.identity.as_ref().map_or(Role::None, Identity::role)
    }

    /// Returns the signed-in username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::bootstrapping()
    }
}

/// Shared, mutable session state.
///
/// Cloning the handle shares the state. Readers only ever see whole
/// snapshots.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    state: Arc<RwLock<Session>>,
}

impl SessionHandle {
    /// Creates a handle in the bootstrapping state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut Session)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    fn replace(&self, session: Session) {
        self.update(|state| *state = session);
    }
}

/// Navigator that signs the user out before a hard redirect to login.
pub struct SessionResetNavigator {
    inner: Arc<dyn Navigator>,
    session: SessionHandle,
}

impl SessionResetNavigator {
    /// Wraps `inner`, resetting `session` whenever it is sent to login.
    #[must_use]
    pub fn new(inner: Arc<dyn Navigator>, session: SessionHandle) -> Self {
        Self { inner, session }
    }
}

impl std::fmt::Debug for SessionResetNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResetNavigator")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Navigator for SessionResetNavigator {
    fn hard_redirect(&self, path: &str) {
        if path == LOGIN_PATH {
            debug!("credentials revoked, resetting session");
            self.session.replace(Session::signed_out());
        }
        self.inner.hard_redirect(path);
    }
}

/// Clears the in-flight flag when an initialization ends or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of the session lifecycle.
#[derive(Debug)]
pub struct SessionStore {
    client: Arc<ApiClient>,
    session: SessionHandle,
    initializing: AtomicBool,
}

impl SessionStore {
    /// Creates a store over `client`, publishing into `session`.
    ///
    /// `session` should be the same handle given to the
    /// [`SessionResetNavigator`] installed in `client`.
    #[must_use]
    pub fn new(client: Arc<ApiClient>, session: SessionHandle) -> Self {
        Self {
            client,
            session,
            initializing: AtomicBool::new(false),
        }
    }

    /// Returns the API client.
    #[must_use]
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Returns the shared session handle.
    #[must_use]
    pub fn handle(&self) -> &SessionHandle {
        &self.session
    }

    /// Returns true if a usable access token is stored.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.client.credentials().has_access_token()
    }

    /// Resolves the signed-in identity from stored credentials.
    ///
    /// Without an access token the session resolves to signed out without
    /// any network call. Otherwise the profile endpoint decides: on any
    /// failure the credentials are cleared and the session resolves to
    /// signed out. Profile failures are not reported as errors.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyInitializing` if another call is still
    /// in flight.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Session, SessionError> {
        if self.initializing.swap(true, Ordering::AcqRel) {
            return Err(SessionError::AlreadyInitializing);
        }
        let _in_flight = InFlight(&self.initializing);

        self.session.update(|state| state.loading = true);

        if !self.has_access_token() {
            debug!("no access token stored, skipping profile fetch");
            self.session.replace(Session::signed_out());
            return Ok(self.snapshot());
        }

        match self.client.get::<Identity>(PROFILE_PATH).await {
            Ok(identity) => {
                info!(username = %identity.username, role = %identity.role(), "session restored");
                self.session.replace(Session::signed_in(identity));
            }
            Err(err) => {
                warn!(error = %err, "profile fetch failed, signing out");
                if let Err(err) = self.client.credentials().clear() {
                    warn!(error = %err, "failed to clear credentials");
                }
                self.session.replace(Session::signed_out());
            }
        }
        Ok(self.snapshot())
    }

    /// Replaces the signed-in identity. The loading flag is left as is.
    pub fn set_identity(&self, identity: Option<Identity>) {
        self.session.update(|state| state.identity = identity);
    }

    /// Publishes a freshly authenticated identity as a resolved session.
    pub(crate) fn sign_in(&self, identity: Identity) -> Session {
        let session = Session::signed_in(identity);
        self.session.replace(session.clone());
        session
    }

    /// Returns the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }

    /// Signs the user out locally.
    ///
    /// The identity is dropped even if the persisted credentials cannot be
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the credentials could not be
    /// removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.set_identity(None);
        self.client.credentials().clear()?;
        Ok(())
    }

    /// Signs the user out and returns the screen to show next.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the credentials could not be
    /// removed.
    pub fn logout(&self) -> Result<&'static str, SessionError> {
        self.clear()?;
        info!("signed out");
        Ok(LOGIN_PATH)
    }
}
