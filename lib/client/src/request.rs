//! Request and response descriptions.
//!
//! An [`ApiRequest`] is a plain value describing an outbound call. It is
//! kept separate from any wire representation so the same call can be sent
//! again after a credential refresh.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file attached to a multipart form.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Name of the file as reported to the server.
    pub file_name: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// A multipart form description.
///
/// Unlike a wire-level form this can be cloned, so an upload can be
/// replayed with an identical payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, FilePart)>,
}

impl MultipartForm {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Adds a file field.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, part: FilePart) -> Self {
        self.files.push((name.into(), part));
        self
    }

    /// Builds a form from the top-level fields of a JSON object.
    ///
    /// Strings are sent as-is, `null` fields are skipped, and every other
    /// value is sent as its JSON text.
    #[must_use]
    pub fn from_json_object(value: &JsonValue) -> Self {
        let mut form = Self::new();
        if let Some(object) = value.as_object() {
            for (name, field) in object {
                match field {
                    JsonValue::Null => {}
                    JsonValue::String(s) => form = form.text(name, s),
                    other => form = form.text(name, other.to_string()),
                }
            }
        }
        form
    }

    /// Returns the text fields.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Returns the file fields.
    #[must_use]
    pub fn files(&self) -> &[(String, FilePart)] {
        &self.files
    }
}

/// Body of an outbound request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document.
    Json(JsonValue),
    /// A multipart form (records carrying an image).
    Multipart(MultipartForm),
}

/// Description of an outbound API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API base URL (e.g. `/children/`).
    pub path: String,
    /// Request body.
    pub body: RequestBody,
    /// Headers to send, keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
}

impl ApiRequest {
    /// Creates a request with no body and no headers.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            headers: BTreeMap::new(),
        }
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: JsonValue) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Sets a multipart body.
    #[must_use]
    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// A response received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body (`null` when the body was empty).
    pub body: JsonValue,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Marker for how many times a request has been sent.
pub trait Attempt: sealed::Sealed {
    /// One-based attempt number.
    const NUMBER: u8;
}

/// The request has not been replayed; a `401` may trigger a refresh.
#[derive(Debug)]
pub struct FirstAttempt;

/// The request is being replayed after a refresh; it will not be refreshed again.
#[derive(Debug)]
pub struct Replay;

impl sealed::Sealed for FirstAttempt {}
impl sealed::Sealed for Replay {}

impl Attempt for FirstAttempt {
    const NUMBER: u8 = 1;
}

impl Attempt for Replay {
    const NUMBER: u8 = 2;
}

/// An in-flight call together with its attempt count.
///
/// Only a `PendingRequest<FirstAttempt>` can be turned into a replay, and
/// doing so consumes it, so a request is replayed at most once.
#[derive(Debug)]
pub struct PendingRequest<A: Attempt> {
    request: ApiRequest,
    _attempt: PhantomData<A>,
}

impl PendingRequest<FirstAttempt> {
    /// Wraps a request for its first attempt.
    #[must_use]
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            _attempt: PhantomData,
        }
    }

    /// Converts this request into its single replay.
    #[must_use]
    pub fn into_replay(self) -> PendingRequest<Replay> {
        PendingRequest {
            request: self.request,
            _attempt: PhantomData,
        }
    }
}

impl<A: Attempt> PendingRequest<A> {
    /// Returns the request description.
    #[must_use]
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Returns the one-based attempt number.
    #[must_use]
    pub fn attempt(&self) -> u8 {
        A::NUMBER
    }
}
