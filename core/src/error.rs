//! Error types for the Typesense client.
//!
//! # Design
//! Every call yields at most one `Error`. The variants follow where the call
//! stopped: the request could not be built, the round trip never completed,
//! the caller's context ended, the server answered with a non-success
//! status, or the server answered but the payload did not match the
//! expected shape. API errors and decode errors stay separate so callers can
//! tell "the server said no" from "the server said something unexpected".

use std::fmt;

use thiserror::Error;

use crate::context::ContextError;
use crate::http::HttpMethod;

/// Boxed error produced by a `Transport` implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `TypesenseClient`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The request never completed: connection refused, timeout, TLS, ...
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    /// The API error carried by this value, if any.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        self.as_api().map(|err| err.status)
    }
}

/// The outbound request could not be constructed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Query options must flatten to scalars; nested objects have no wire form.
    #[error("query option {0:?} is not a scalar or list of scalars")]
    UnsupportedOption(String),
}

/// The server answered with a success status but the payload did not match
/// the requested shape.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode response body: {0}")]
    Json(#[source] serde_json::Error),

    /// A newline-delimited stream stopped parsing at `record` (1-based).
    #[error("newline-delimited stream truncated or corrupt at record {record}: {source}")]
    Stream {
        record: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("element matches neither a search result nor a search error")]
    Unmatched,

    #[error("failed to copy response body: {0}")]
    Write(#[source] std::io::Error),
}

/// A non-success HTTP status returned by the remote service.
///
/// `message` is taken from the `{"message": ...}` error body when the body
/// parses; otherwise it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub method: HttpMethod,
    pub url: String,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.method, self.url, self.status)?;
        if !self.message.is_empty() {
            write!(f, " {}", self.message)?;
        }
        Ok(())
    }
}
