//! HTTP plumbing for the smile-portal dashboard client.
//!
//! This crate provides:
//!
//! - **Credential store**: persistence for the access/refresh token pair
//! - **API client**: bearer-token injection with a single refresh-and-replay
//!   on `401 Unauthorized`
//! - **Transport**: the seam between the client and the wire (`reqwest` in
//!   production, scripted fakes in tests)
//! - **Resource client**: CRUD calls against the dashboard's REST collections

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod navigator;
pub mod request;
pub mod resource;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ApiClient, REFRESH_PATH};
pub use config::ClientConfig;
pub use credential::{
    CredentialKey, CredentialStore, CredentialWrite, Credentials, FileCredentialStore,
    MemoryCredentialStore,
};
pub use error::{ClientError, CredentialError, ResourceError, TransportError};
pub use navigator::{LOGIN_PATH, Navigator, ROOT_PATH};
pub use request::{
    ApiRequest, ApiResponse, Attempt, FilePart, FirstAttempt, Method, MultipartForm,
    PendingRequest, Replay, RequestBody,
};
pub use resource::{IMAGE_FIELD, Resource, ResourceClient};
pub use transport::{ReqwestTransport, Transport};
