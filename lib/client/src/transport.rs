//! The seam between [`ApiClient`](crate::ApiClient) and the wire.
//!
//! A transport sends exactly what it is given: no auth headers are added
//! and no retries happen here.

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::request::{ApiRequest, ApiResponse, Method, MultipartForm, RequestBody};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value as JsonValue;

/// Trait for sending API requests.
///
/// This abstraction allows the client to be tested without a server while
/// still supporting the real HTTP implementation in production.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and returns whatever the server answered.
    ///
    /// Non-2xx statuses are responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    /// Creates a transport for the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(default_headers())
            .build()
            .map_err(|e| TransportError::RequestFailed {
                reason: format!("HTTP client error: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// Returns the transport configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Headers sent on every request unless the request sets its own.
///
/// Multipart bodies replace `Content-Type` with their boundary-carrying value.
fn default_headers() -> HeaderMap {
    let json = HeaderValue::from_static("application/json");
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, json.clone());
    headers.insert(CONTENT_TYPE, json);
    headers
}

fn wire_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn wire_form(form: &MultipartForm) -> Result<reqwest::multipart::Form, TransportError> {
    let mut wire = reqwest::multipart::Form::new();
    for (name, value) in form.fields() {
        wire = wire.text(name.clone(), value.clone());
    }
    for (name, file) in form.files() {
        let part = reqwest::multipart::Part::bytes(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| TransportError::RequestFailed {
                reason: format!("invalid MIME type '{}': {e}", file.mime_type),
            })?;
        wire = wire.part(name.clone(), part);
    }
    Ok(wire)
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::ConnectionFailed {
            reason: err.to_string(),
        }
    } else {
        TransportError::RequestFailed {
            reason: err.to_string(),
        }
    }
}

/// Decodes a response body: empty is `null`, non-JSON text is kept as a string.
fn decode_body(bytes: &[u8]) -> JsonValue {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return JsonValue::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(bytes).into_owned()))
}

impl ReqwestTransport {
    fn wire_request(&self, request: &ApiRequest) -> Result<reqwest::Request, TransportError> {
        let url = self.config.url_for(&request.path);
        let mut builder = self.http.request(wire_method(request.method), url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(form) => builder.multipart(wire_form(form)?),
        };

        builder.build().map_err(|e| classify(&e))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let wire = self.wire_request(request)?;
        let response = self.http.execute(wire).await.map_err(|e| classify(&e))?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| classify(&e))?;

        tracing::trace!(status, len = bytes.len(), "response received");

        Ok(ApiResponse::new(status, decode_body(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FilePart;
    use serde_json::json;

    #[test]
    fn empty_body_decodes_as_null() {
        assert_eq!(decode_body(b""), JsonValue::Null);
        assert_eq!(decode_body(b"  \n"), JsonValue::Null);
    }

    #[test]
    fn json_body_decodes() {
        assert_eq!(
            decode_body(br#"{"access": "abc"}"#),
            json!({"access": "abc"})
        );
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        assert_eq!(
            decode_body(b"<h1>Server Error</h1>"),
            JsonValue::String("<h1>Server Error</h1>".to_string())
        );
    }

    #[test]
    fn wire_form_rejects_bad_mime_type() {
        let form = MultipartForm::new().file(
            "photo",
            FilePart {
                file_name: "photo.png".to_string(),
                mime_type: "not a mime".to_string(),
                content: vec![0],
            },
        );
        let err = wire_form(&form).unwrap_err();
        assert!(err.to_string().contains("not a mime"));
    }

    #[test]
    fn defaults_declare_json() {
        let headers = default_headers();
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn multipart_body_sets_its_own_content_type() {
        let transport = ReqwestTransport::new(ClientConfig::new("http://localhost/api/")).unwrap();
        let form = MultipartForm::new().text("name", "Amina");
        let wire = transport
            .wire_request(&ApiRequest::new(Method::Post, "/children/").with_multipart(form))
            .unwrap();

        let content_type = wire.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn json_body_sets_json_content_type() {
        let transport = ReqwestTransport::new(ClientConfig::new("http://localhost/api/")).unwrap();
        let wire = transport
            .wire_request(
                &ApiRequest::new(Method::Post, "/token/").with_json(json!({"username": "x"})),
            )
            .unwrap();

        assert_eq!(wire.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(wire.url().as_str(), "http://localhost/api/token/");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let transport =
            ReqwestTransport::new(ClientConfig::new("http://127.0.0.1:9/api/")).unwrap();
        let err = transport
            .send(&ApiRequest::new(Method::Get, "/children/"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::ConnectionFailed { .. }
                | TransportError::RequestFailed { .. }
                | TransportError::Timeout
        ));
    }
}
