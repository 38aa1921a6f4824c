//! Collection management endpoints.

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{Collection, CollectionSchema, CollectionUpdateSchema};

impl<T: Transport> TypesenseClient<T> {
    pub fn list_collections(&self, ctx: &Context) -> Result<Vec<Collection>, Error> {
        self.call(ctx, ApiRequest::get("/collections"))
    }

    pub fn create_collection(&self, ctx: &Context, schema: &CollectionSchema) -> Result<Collection, Error> {
        self.call(ctx, ApiRequest::post("/collections").json(schema)?)
    }

    pub fn get_collection(&self, ctx: &Context, name: &str) -> Result<Collection, Error> {
        self.call(ctx, ApiRequest::get(format!("/collections/{name}")))
    }

    /// Add or drop fields. The server answers with the applied update, not
    /// the full collection.
    pub fn update_collection(
        &self,
        ctx: &Context,
        name: &str,
        update: &CollectionUpdateSchema,
    ) -> Result<CollectionUpdateSchema, Error> {
        self.call(ctx, ApiRequest::patch(format!("/collections/{name}")).json(update)?)
    }

    pub fn delete_collection(&self, ctx: &Context, name: &str) -> Result<Collection, Error> {
        self.call(ctx, ApiRequest::delete(format!("/collections/{name}")))
    }
}
