//! Health and cluster operation endpoints.

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{HealthStatus, SnapshotParams, SuccessStatus};

impl<T: Transport> TypesenseClient<T> {
    pub fn health(&self, ctx: &Context) -> Result<HealthStatus, Error> {
        self.call(ctx, ApiRequest::get("/health"))
    }

    /// Ask the server to write a snapshot of its data to `snapshot_path`.
    pub fn snapshot(&self, ctx: &Context, params: &SnapshotParams) -> Result<SuccessStatus, Error> {
        self.call(ctx, ApiRequest::post("/operations/snapshot").options(Some(params))?)
    }
}
