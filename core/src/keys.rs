//! API key endpoints.

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{ApiKey, ApiKeyDeleteResponse, ApiKeySchema, ApiKeysResponse};

impl<T: Transport> TypesenseClient<T> {
    pub fn list_keys(&self, ctx: &Context) -> Result<Vec<ApiKey>, Error> {
        let response: ApiKeysResponse = self.call(ctx, ApiRequest::get("/keys"))?;
        Ok(response.keys)
    }

    /// The returned key carries the full `value`; it is not retrievable later.
    pub fn create_key(&self, ctx: &Context, schema: &ApiKeySchema) -> Result<ApiKey, Error> {
        self.call(ctx, ApiRequest::post("/keys").json(schema)?)
    }

    pub fn get_key(&self, ctx: &Context, id: i64) -> Result<ApiKey, Error> {
        self.call(ctx, ApiRequest::get(format!("/keys/{id}")))
    }

    pub fn delete_key(&self, ctx: &Context, id: i64) -> Result<ApiKeyDeleteResponse, Error> {
        self.call(ctx, ApiRequest::delete(format!("/keys/{id}")))
    }
}
