//! Username/password login.

use crate::error::LoginError;
use crate::identity::Identity;
use crate::session::{Session, SessionStore};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use smile_portal_client::{ApiRequest, ClientError, CredentialKey, CredentialWrite, Method};
use smile_portal_core::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Path of the token endpoint.
pub const LOGIN_TOKEN_PATH: &str = "/token/";

/// Validation message the token endpoint returns for a user with no group.
const ROLE_NOT_FOUND: &str = "User role not found";

fn reports_missing_role(body: &JsonValue) -> bool {
    match body {
        JsonValue::String(message) => message.contains(ROLE_NOT_FOUND),
        JsonValue::Array(items) => items.iter().any(reports_missing_role),
        JsonValue::Object(fields) => fields.values().any(reports_missing_role),
        _ => false,
    }
}

fn classify_rejection(err: ClientError) -> LoginError {
    match err {
        ClientError::Http { status: 400, ref body } if reports_missing_role(body) => {
            warn!("token endpoint reported no role for this account");
            LoginError::RoleMissing
        }
        ClientError::Http { status: 400 | 401, .. } => LoginError::InvalidCredentials,
        other => LoginError::Request(other),
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    groups: BTreeSet<String>,
    #[serde(default)]
    is_superuser: bool,
}

/// Exchanges a username and password for a session.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    store: Arc<SessionStore>,
}

impl LoginFlow {
    /// Creates a login flow publishing into `store`.
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Signs in with a username and password.
    ///
    /// On success the access token, refresh token, and role are persisted
    /// together and the new session is returned. The token call bypasses
    /// the refresh interceptor, so a rejected password never touches the
    /// stored credentials.
    ///
    /// # Errors
    ///
    /// - `LoginError::InvalidCredentials` if the server rejects the pair
    /// - `LoginError::RoleMissing` if the server resolves no role, either in
    ///   the token response or as a validation error; nothing is persisted
    ///   in that case
    /// - `LoginError::Request` for any other failed call
    /// - `LoginError::Storage` if the tokens cannot be persisted
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, LoginError> {
        let client = self.store.client();
        let request = ApiRequest::new(Method::Post, LOGIN_TOKEN_PATH)
            .with_json(json!({ "username": username, "password": password }));

        let response = client
            .send_unauthenticated(request)
            .await
            .map_err(classify_rejection)?;

        let issued: LoginResponse = serde_json::from_value(response.body).map_err(|e| {
            LoginError::Request(ClientError::Decode {
                reason: e.to_string(),
            })
        })?;

        let Some(role) = issued.role.filter(|r| !r.trim().is_empty()) else {
            warn!("login succeeded but no role was resolved");
            return Err(LoginError::RoleMissing.into());
        };

        client.credentials().write(vec![
            CredentialWrite::Set(CredentialKey::Access, issued.access),
            CredentialWrite::Set(CredentialKey::Refresh, issued.refresh),
            CredentialWrite::Set(CredentialKey::Role, role),
        ])
        .map_err(LoginError::from)?;

        let identity = Identity {
            username: issued.username.unwrap_or_else(|| username.to_string()),
            email: None,
            is_superuser: issued.is_superuser,
            groups: issued.groups,
        };
        let session = self.store.sign_in(identity);
        info!(role = %session.role(), "signed in");
        Ok(session)
    }
}
