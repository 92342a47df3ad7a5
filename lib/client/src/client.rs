//! API client with bearer-token injection and refresh-on-401.
//!
//! Every call passes through two interceptors:
//!
//! 1. **Outbound**: attaches `Authorization: Bearer <access>` when a
//!    non-empty access token is stored, and strips the header otherwise.
//! 2. **Inbound**: when a first attempt fails with `401`, the refresh token
//!    is exchanged for a new access token and the request is replayed once.
//!    If there is no refresh token, or the exchange fails, all credentials
//!    are cleared and the front end is sent to the login screen.
//!
//! Every other failure, including a `401` on the replay, reaches the caller
//! unchanged.

use crate::config::ClientConfig;
use crate::credential::{CredentialKey, CredentialStore};
use crate::error::ClientError;
use crate::navigator::{LOGIN_PATH, Navigator};
use crate::request::{ApiRequest, ApiResponse, Attempt, Method, MultipartForm, PendingRequest};
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/token/refresh/";

const AUTHORIZATION: &str = "authorization";

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<JsonValue, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::Encode {
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(body: JsonValue) -> Result<T, ClientError> {
    serde_json::from_value(body).map_err(|e| ClientError::Decode {
        reason: e.to_string(),
    })
}

fn check_status(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Http {
            status: response.status,
            body: response.body,
        })
    }
}

/// HTTP client shared by every screen of the dashboard.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    /// Headers merged into every authenticated request.
    default_headers: RwLock<BTreeMap<String, String>>,
    /// Serializes refresh calls when `coalesce_refresh` is enabled and
    /// holds the outcome of the last one.
    refresh_gate: tokio::sync::Mutex<Option<Result<String, ClientError>>>,
    /// Bumped under `refresh_gate` each time a refresh completes.
    refresh_generation: AtomicU64,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
            navigator,
            default_headers: RwLock::new(BTreeMap::new()),
            refresh_gate: tokio::sync::Mutex::new(None),
            refresh_generation: AtomicU64::new(0),
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the credential store the client reads tokens from.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Returns a default header value.
    #[must_use]
    pub fn default_header(&self, name: &str) -> Option<String> {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Sends a GET request and decodes the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.call(ApiRequest::new(Method::Get, path)).await
    }

    /// Sends a JSON POST request and decodes the response body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = ApiRequest::new(Method::Post, path).with_json(encode(body)?);
        self.call(request).await
    }

    /// Sends a JSON PUT request and decodes the response body.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = ApiRequest::new(Method::Put, path).with_json(encode(body)?);
        self.call(request).await
    }

    /// Sends a JSON PATCH request and decodes the response body.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = ApiRequest::new(Method::Patch, path).with_json(encode(body)?);
        self.call(request).await
    }

    /// Sends a DELETE request and decodes the response body.
    ///
    /// An empty `204` body decodes as `null`, so `()` and `serde_json::Value`
    /// are both valid targets.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.call(ApiRequest::new(Method::Delete, path)).await
    }

    /// Sends a multipart POST request and decodes the response body.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> Result<T, ClientError> {
        self.call(ApiRequest::new(Method::Post, path).with_multipart(form))
            .await
    }

    /// Sends a multipart PUT request and decodes the response body.
    pub async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> Result<T, ClientError> {
        self.call(ApiRequest::new(Method::Put, path).with_multipart(form))
            .await
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        decode(response.body)
    }

    /// Sends a request through both interceptors.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` for non-2xx answers that were not
    /// recovered by a refresh, `ClientError::Network` when no answer
    /// arrived, and `ClientError::NoRefreshToken` when a `401` could not be
    /// recovered because no refresh token was stored.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let pending = PendingRequest::new(request);
        let generation = self.refresh_generation.load(Ordering::Acquire);
        let sent_with = self.credentials.access_token();

        match self.dispatch(&pending, sent_with.as_deref()).await {
            Err(err) if err.is_unauthorized() => {
                debug!("access token rejected, refreshing");
                let access = self.refresh_access_token(generation).await?;
                let replay = pending.into_replay();
                debug!(attempt = replay.attempt(), "replaying request");
                self.dispatch(&replay, Some(&access)).await
            }
            outcome => outcome,
        }
    }

    /// Sends a request without either interceptor.
    ///
    /// Used for the login and refresh endpoints, which must never carry a
    /// stale bearer token or trigger a refresh themselves.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` for non-2xx answers and
    /// `ClientError::Network` when no answer arrived.
    pub async fn send_unauthenticated(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, ClientError> {
        let response = self.transport.send(&request).await?;
        check_status(response)
    }

    async fn dispatch<A: Attempt>(
        &self,
        pending: &PendingRequest<A>,
        access: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let request = self.authorize(pending.request(), access);
        let response = self.transport.send(&request).await?;
        check_status(response)
    }

    /// Outbound interceptor.
    fn authorize(&self, request: &ApiRequest, access: Option<&str>) -> ApiRequest {
        let mut prepared = request.clone();
        {
            let defaults = self
                .default_headers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for (name, value) in defaults.iter() {
                prepared
                    .headers
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        match access.filter(|t| !t.is_empty()) {
            Some(token) => {
                prepared
                    .headers
                    .insert(AUTHORIZATION.to_string(), bearer(token));
            }
            None => {
                prepared.headers.remove(AUTHORIZATION);
            }
        }
        prepared
    }

    /// Obtains a fresh access token for a request dispatched while
    /// `generation` refreshes had completed.
    ///
    /// When coalescing, a caller that finds a newer generation behind the
    /// gate adopts that refresh's outcome, success or failure, instead of
    /// starting its own. Only the caller that ran the refresh ends the
    /// session on failure.
    async fn refresh_access_token(&self, generation: u64) -> Result<String, ClientError> {
        if !self.config.coalesce_refresh {
            return self.refresh_once().await;
        }

        let mut last = self.refresh_gate.lock().await;
        let superseded = self.refresh_generation.load(Ordering::Acquire) != generation;
        if let Some(outcome) = last.as_ref().filter(|_| superseded) {
            debug!(
                succeeded = outcome.is_ok(),
                "adopting outcome of a concurrent refresh"
            );
            return outcome.clone();
        }

        let outcome = self.refresh_once().await;
        *last = Some(outcome.clone());
        self.refresh_generation.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn refresh_once(&self) -> Result<String, ClientError> {
        let Some(refresh) = self.credentials.refresh_token() else {
            warn!("access token rejected and no refresh token is stored");
            self.end_session();
            return Err(ClientError::NoRefreshToken);
        };

        let request =
            ApiRequest::new(Method::Post, REFRESH_PATH).with_json(json!({ "refresh": refresh }));
        let refreshed = match self.send_unauthenticated(request).await {
            Ok(response) => decode::<RefreshResponse>(response.body).and_then(|r| {
                if r.access.is_empty() {
                    Err(ClientError::Decode {
                        reason: "refresh response carried an empty access token".to_string(),
                    })
                } else {
                    Ok(r.access)
                }
            }),
            Err(err) => Err(err),
        };

        let access = match refreshed {
            Ok(access) => access,
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                self.end_session();
                return Err(err);
            }
        };

        self.credentials.set(CredentialKey::Access, &access)?;
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(AUTHORIZATION.to_string(), bearer(&access));

        info!("access token refreshed");
        Ok(access)
    }

    /// Tears down every credential and sends the front end to login.
    fn end_session(&self) {
        if let Err(err) = self.credentials.clear() {
            warn!(error = %err, "failed to clear credentials");
        }
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(AUTHORIZATION);
        self.navigator.hard_redirect(LOGIN_PATH);
    }
}
