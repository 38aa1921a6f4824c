//! Outbound request descriptors and body/query encoding.
//!
//! # Design
//! The body encoding is chosen by an explicit `RequestBody` tag rather than
//! by inspecting the value at runtime:
//!
//! - `Empty`: no body and no `Content-Type`.
//! - `Json`: one JSON value, serialized in its natural shape.
//! - `Lines`: one JSON value per line (bulk import wire format), never
//!   wrapped in an array.
//!
//! Query options are any `Serialize` struct. Fields that serialize to
//! `null` (unset `Option`s) are dropped, explicit zero values are kept.

use serde::Serialize;
use serde_json::Value;

use crate::error::BuildError;
use crate::http::HttpMethod;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Lines(Vec<Value>),
}

impl RequestBody {
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self, BuildError> {
        serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(BuildError::Serialize)
    }

    pub fn lines<B: Serialize>(records: &[B]) -> Result<Self, BuildError> {
        records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(RequestBody::Lines)
            .map_err(BuildError::Serialize)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Encode to the wire string. `None` for `Empty`.
    ///
    /// Every `Lines` record is terminated by `\n`, so N records give N lines.
    pub fn encode(&self) -> Result<Option<String>, BuildError> {
        match self {
            RequestBody::Empty => Ok(None),
            RequestBody::Json(value) => serde_json::to_string(value)
                .map(Some)
                .map_err(BuildError::Serialize),
            RequestBody::Lines(records) => {
                let mut out = String::new();
                for record in records {
                    out.push_str(&serde_json::to_string(record).map_err(BuildError::Serialize)?);
                    out.push('\n');
                }
                Ok(Some(out))
            }
        }
    }
}

/// One API call before it is resolved against the base URL.
///
/// `path` already has its path parameters substituted and starts with `/`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: RequestBody,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, BuildError> {
        Ok(self.body(RequestBody::json(body)?))
    }

    pub fn lines<B: Serialize>(self, records: &[B]) -> Result<Self, BuildError> {
        Ok(self.body(RequestBody::lines(records)?))
    }

    /// Append the flattened fields of `options`. `None` adds nothing.
    pub fn options<O: Serialize>(mut self, options: Option<&O>) -> Result<Self, BuildError> {
        if let Some(options) = options {
            self.query.extend(query_pairs(options)?);
        }
        Ok(self)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Flatten a serializable options struct into `(wire_name, value)` pairs.
///
/// Pairs come out sorted by key. Lists of scalars are comma-joined, which is
/// how the search API spells multi-valued parameters such as `query_by`.
pub fn query_pairs<O: Serialize + ?Sized>(options: &O) -> Result<Vec<(String, String)>, BuildError> {
    let fields = match serde_json::to_value(options).map_err(BuildError::Serialize)? {
        Value::Null => return Ok(Vec::new()),
        Value::Object(fields) => fields,
        _ => return Err(BuildError::UnsupportedOption("<root>".to_string())),
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        let encoded = match value {
            Value::Null => continue,
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(|item| scalar(item).ok_or_else(|| BuildError::UnsupportedOption(key.clone())))
                    .collect::<Result<Vec<_>, _>>()?;
                parts.join(",")
            }
            other => scalar(&other).ok_or_else(|| BuildError::UnsupportedOption(key.clone()))?,
        };
        pairs.push((key, encoded));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
