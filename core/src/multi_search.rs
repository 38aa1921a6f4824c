//! Batched search: many queries in one request, one result per query.
//!
//! # Design
//! Each element of the `results` array is independently either a full
//! search result or a compact `{"code": int, "error": string}` object, and
//! nothing on the wire says which. `SearchResultOrError` sniffs the shape:
//! the error shape is tried first and only when `code` is an integer and
//! `error` is a string, so a result whose documents happen to contain a
//! `code` field is never mistaken for an error. A failed element does not
//! fail the batch; callers inspect each element on its own.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::{DecodeError, Error};
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::SearchResult;

/// Parameters shared by every search in the batch, sent as query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_multi_searches: Option<u32>,
}

/// One search inside the batch body. Unset fields fall back to the shared
/// `MultiSearchParameters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchCollectionParameters {
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_typesense_api_key: Option<String>,
}

impl MultiSearchCollectionParameters {
    pub fn new(collection: &str, q: &str) -> Self {
        Self {
            collection: collection.to_string(),
            q: Some(q.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchSearchesParameter {
    pub searches: Vec<MultiSearchCollectionParameters>,
}

/// Per-query failure inside a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchError {
    pub code: u32,
    pub error: String,
}

impl SearchError {
    /// `None` unless `value` has an integer `code` and a string `error`.
    /// A code that is negative or does not fit in `u32` is `Unmatched`.
    fn sniff(value: &Value) -> Option<Result<Self, DecodeError>> {
        let object = value.as_object()?;
        let code_is_int = object.get("code").is_some_and(|code| code.is_u64() || code.is_i64());
        let error_is_str = object.get("error").is_some_and(Value::is_string);
        if !(code_is_int && error_is_str) {
            return None;
        }
        Some(SearchError::deserialize(value).map_err(|_| DecodeError::Unmatched))
    }
}

/// Exactly one of a search result or a search error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchResultOrError {
    Result(Box<SearchResult>),
    Error(SearchError),
}

impl SearchResultOrError {
    pub fn is_error(&self) -> bool {
        matches!(self, SearchResultOrError::Error(_))
    }

    pub fn result(&self) -> Option<&SearchResult> {
        match self {
            SearchResultOrError::Result(result) => Some(result),
            SearchResultOrError::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            SearchResultOrError::Result(_) => None,
            SearchResultOrError::Error(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<SearchResult, SearchError> {
        match self {
            SearchResultOrError::Result(result) => Ok(*result),
            SearchResultOrError::Error(error) => Err(error),
        }
    }

    /// Disambiguate one raw batch element.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        if let Some(error) = SearchError::sniff(&value) {
            return error.map(SearchResultOrError::Error);
        }
        SearchResult::deserialize(value)
            .map(|result| SearchResultOrError::Result(Box::new(result)))
            .map_err(|_| DecodeError::Unmatched)
    }
}

impl<'de> Deserialize<'de> for SearchResultOrError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SearchResultOrError::from_value(value).map_err(de::Error::custom)
    }
}

/// Batched search response; `results[i]` answers `searches[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchResult {
    pub results: Vec<SearchResultOrError>,
}

impl<T: Transport> TypesenseClient<T> {
    /// Run several searches in one request. Per-search failures come back
    /// as `SearchResultOrError::Error` elements rather than as an `Error`.
    pub fn multi_search(
        &self,
        ctx: &Context,
        searches: &MultiSearchSearchesParameter,
        common: Option<&MultiSearchParameters>,
    ) -> Result<MultiSearchResult, Error> {
        let request = ApiRequest::post("/multi_search").json(searches)?.options(common)?;
        self.call(ctx, request)
    }
}
