//! Response decoding and API error extraction.
//!
//! # Design
//! The caller says how the body should be read with an explicit
//! `DecodeTarget` instead of the decoder guessing from the destination type:
//!
//! - `Object`: the whole body is one JSON value. An empty body leaves the
//!   destination untouched. Batched search results go through here; their
//!   elements carry their own success-or-error decoder.
//! - `Lines`: newline-delimited JSON, each value appended in order.
//! - `PassThrough`: bytes copied to a writer unmodified.
//! - `Discard`: body ignored.
//!
//! `extract_api_error` always runs first. When it yields an error the body
//! is never decoded.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, DecodeError};
use crate::http::{HttpRequest, HttpResponse};

/// Where and how a response body is decoded.
pub enum DecodeTarget<'a, T> {
    Object(&'a mut T),
    Lines(&'a mut Vec<T>),
    PassThrough(&'a mut dyn Write),
    Discard,
}

impl<'a> DecodeTarget<'a, ()> {
    pub fn pass_through(writer: &'a mut dyn Write) -> Self {
        DecodeTarget::PassThrough(writer)
    }

    pub fn discard() -> Self {
        DecodeTarget::Discard
    }
}

/// Decode `body` into `target`.
pub fn decode<T: DeserializeOwned>(body: &[u8], target: DecodeTarget<'_, T>) -> Result<(), DecodeError> {
    match target {
        DecodeTarget::Object(dest) => {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(());
            }
            *dest = serde_json::from_slice(body).map_err(DecodeError::Json)?;
            Ok(())
        }
        DecodeTarget::Lines(dest) => decode_lines(body, dest),
        DecodeTarget::PassThrough(writer) => writer.write_all(body).map_err(DecodeError::Write),
        DecodeTarget::Discard => Ok(()),
    }
}

/// Append each JSON value of a newline-delimited stream to `dest`.
///
/// Values may be separated by any JSON whitespace, so indented or blank
/// lines are accepted. The first malformed value aborts the whole decode;
/// values already appended stay in `dest`.
pub fn decode_lines<T: DeserializeOwned>(body: &[u8], dest: &mut Vec<T>) -> Result<(), DecodeError> {
    let stream = serde_json::Deserializer::from_slice(body).into_iter::<T>();
    for (index, item) in stream.enumerate() {
        let item = item.map_err(|source| DecodeError::Stream {
            record: index + 1,
            source,
        })?;
        dest.push(item);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Build an `ApiError` for any status outside {200, 201}.
///
/// The `{"message": ...}` body is parsed best-effort: a missing or
/// malformed body leaves `message` empty.
pub fn extract_api_error(request: &HttpRequest, response: &HttpResponse) -> Option<ApiError> {
    if response.is_success() {
        return None;
    }

    let body: ErrorBody = serde_json::from_slice(&response.body).unwrap_or_default();
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        status = response.status,
        message = %body.message,
        "api error response"
    );

    Some(ApiError {
        status: response.status,
        message: body.message,
        method: request.method,
        url: request.url.clone(),
    })
}
