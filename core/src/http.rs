//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `TypesenseClient::build` produces
//! an `HttpRequest`, a `Transport` (or the caller) performs the round trip,
//! and `TypesenseClient::parse` consumes the resulting `HttpResponse`.
//! Keeping the wire types free of any HTTP library lets tests feed canned
//! responses straight into the decoder.

use std::fmt;

/// Header carrying the API key on every request.
pub const HEADER_API_KEY: &str = "X-TYPESENSE-API-KEY";

/// Content type attached when a request carries a body.
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

pub const MEDIA_TYPE_JSON: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved HTTP request described as plain data.
///
/// `url` is absolute (base URL, path and query string). `body` is `None`
/// exactly when no `Content-Type` header was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The body is kept as raw bytes so pass-through targets can copy it
/// without any JSON interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Only 200 and 201 count as success; everything else is an API error.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}
