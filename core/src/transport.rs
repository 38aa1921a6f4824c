//! The network seam between the client and the HTTP stack.
//!
//! # Design
//! `Transport` executes one plain-data `HttpRequest` and returns the
//! complete `HttpResponse`. Status codes are data here, never errors: the
//! client's error extraction decides what a status means. The default
//! implementation wraps a `ureq::Agent`, which owns connection pooling;
//! nothing else is shared between calls.

use std::io::Read;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    /// Perform the round trip. `timeout` is the time left on the caller's
    /// context, if it has a deadline.
    fn send(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, TransportError> {
        (**self).send(request, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, TransportError> {
        (**self).send(request, timeout)
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Option<Duration>,
}

impl UreqTransport {
    /// `timeout` bounds every request made through this transport. A
    /// caller's deadline can only shorten it.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    /// Use a preconfigured agent. Its own timeouts apply unless a caller's
    /// deadline is shorter.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent, timeout: None }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// The tighter of the configured timeout and the time left on the caller's
/// context.
fn effective_timeout(configured: Option<Duration>, remaining: Option<Duration>) -> Option<Duration> {
    match (configured, remaining) {
        (Some(configured), Some(remaining)) => Some(configured.min(remaining)),
        (configured, remaining) => configured.or(remaining),
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Copy headers and the per-call timeout onto a ureq request builder.
fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
    timeout: Option<Duration>,
) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match timeout {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().map(str::as_bytes);
        let timeout = effective_timeout(self.timeout, timeout);

        let result = match request.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let builder = match request.method {
                    HttpMethod::Get => self.agent.get(url),
                    _ => self.agent.delete(url),
                };
                let builder = prepare(builder, request, timeout);
                match body {
                    Some(body) => builder.force_send_body().send(body),
                    None => builder.call(),
                }
            }
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
                let builder = match request.method {
                    HttpMethod::Post => self.agent.post(url),
                    HttpMethod::Put => self.agent.put(url),
                    _ => self.agent.patch(url),
                };
                let builder = prepare(builder, request, timeout);
                match body {
                    Some(body) => builder.send(body),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let mut body = Vec::new();
        if let Err(err) = response.body_mut().as_reader().read_to_end(&mut body) {
            // An unreadable error body still yields an API error, just
            // without a message.
            if matches!(status, 200 | 201) {
                return Err(Box::new(err));
            }
            tracing::warn!(status, error = %err, "failed to read error response body");
            body.clear();
        }

        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, headers, body })
    }
}
