//! Typed, synchronous client for the Typesense search HTTP API.
//!
//! # Overview
//! Each call is one blocking request/response round trip. The client
//! builds a plain-data `HttpRequest`, hands it to a `Transport`, extracts
//! API errors from non-success statuses and decodes the body into the
//! caller's destination according to an explicit `DecodeTarget`.
//!
//! # Design
//! - `TypesenseClient` carries no per-call state; base URL, API key and
//!   transport are fixed at construction.
//! - `build` / `parse` are public so a host can perform I/O itself.
//! - Bulk import and export use newline-delimited JSON in both directions.
//! - Batched search results are a sum type, `SearchResultOrError`, decoded
//!   by shape.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod aliases;
pub mod client;
pub mod collections;
pub mod config;
pub mod context;
pub mod decode;
pub mod documents;
pub mod error;
pub mod http;
pub mod keys;
pub mod multi_search;
pub mod operations;
pub mod overrides;
pub mod presets;
pub mod request;
pub mod synonyms;
pub mod transport;
pub mod types;

pub use client::TypesenseClient;
pub use config::ClientConfig;
pub use context::{Context, ContextError};
pub use decode::DecodeTarget;
pub use error::{ApiError, BuildError, DecodeError, Error, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multi_search::{
    MultiSearchCollectionParameters, MultiSearchParameters, MultiSearchResult, MultiSearchSearchesParameter,
    SearchError, SearchResultOrError,
};
pub use request::{ApiRequest, RequestBody};
pub use transport::{Transport, UreqTransport};
pub use types::*;
