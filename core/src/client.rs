//! Request building, response parsing and the execute round trip.
//!
//! # Design
//! `TypesenseClient` holds only its base URL, API key and transport, all
//! fixed at construction, so one client can be shared across threads.
//! `build` produces an `HttpRequest` and `parse` consumes an `HttpResponse`;
//! either can be used on its own when the caller performs the I/O. `execute` composes them around a `Transport`.

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::decode::{self, DecodeTarget};
use crate::error::{BuildError, Error};
use crate::http::{HttpRequest, HttpResponse, HEADER_API_KEY, HEADER_CONTENT_TYPE, MEDIA_TYPE_JSON};
use crate::request::ApiRequest;
use crate::transport::{Transport, UreqTransport};

/// Typed client for the search service's HTTP API.
#[derive(Debug, Clone)]
pub struct TypesenseClient<T = UreqTransport> {
    base_url: String,
    api_key: String,
    transport: T,
}

impl TypesenseClient<UreqTransport> {
    /// Client using the default `ureq` transport with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> TypesenseClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, Error> {
        let config = ClientConfig::new(&config.base_url, &config.api_key);
        Url::parse(&config.base_url).map_err(|source| BuildError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            base_url: config.base_url,
            api_key: config.api_key,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve `request` into a complete `HttpRequest`.
    ///
    /// The API key header is always attached; `Content-Type` only when there
    /// is a body.
    pub fn build(&self, request: &ApiRequest) -> Result<HttpRequest, Error> {
        let raw = format!("{}{}", self.base_url, request.path);
        let mut url = Url::parse(&raw).map_err(|source| BuildError::InvalidUrl { url: raw, source })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        let body = request.body.encode()?;
        let mut headers = vec![(HEADER_API_KEY.to_string(), self.api_key.clone())];
        if body.is_some() {
            headers.push((HEADER_CONTENT_TYPE.to_string(), MEDIA_TYPE_JSON.to_string()));
        }

        Ok(HttpRequest {
            method: request.method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Run error extraction on `response`, then decode its body into
    /// `target` if the status was a success.
    pub fn parse<D: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
        target: DecodeTarget<'_, D>,
    ) -> Result<(), Error> {
        if let Some(err) = decode::extract_api_error(request, &response) {
            return Err(Error::Api(err));
        }
        decode::decode(&response.body, target)?;
        Ok(())
    }

    /// One synchronous round trip: context check, build, send, parse.
    ///
    /// An ended context fails before any I/O. If the context ends while the
    /// request is in flight, its error replaces whatever the transport
    /// returned, success included.
    pub fn execute<D: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: ApiRequest,
        target: DecodeTarget<'_, D>,
    ) -> Result<(), Error> {
        ctx.check()?;
        let http_request = self.build(&request)?;
        tracing::debug!(method = %http_request.method, url = %http_request.url, "sending request");

        let sent = self.transport.send(&http_request, ctx.remaining());
        if let Some(ctx_err) = ctx.err() {
            tracing::debug!(url = %http_request.url, error = %ctx_err, "context ended during request");
            return Err(ctx_err.into());
        }
        let response = sent.map_err(Error::Transport)?;

        self.parse(&http_request, response, target)
    }

    /// Execute and decode the whole body as one JSON value.
    pub(crate) fn call<D: DeserializeOwned + Default>(&self, ctx: &Context, request: ApiRequest) -> Result<D, Error> {
        let mut out = D::default();
        self.execute(ctx, request, DecodeTarget::Object(&mut out))?;
        Ok(out)
    }

    /// Execute and decode a newline-delimited body.
    pub(crate) fn call_lines<D: DeserializeOwned>(&self, ctx: &Context, request: ApiRequest) -> Result<Vec<D>, Error> {
        let mut out = Vec::new();
        self.execute(ctx, request, DecodeTarget::Lines(&mut out))?;
        Ok(out)
    }
}
