//! Collection alias endpoints.

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{CollectionAlias, CollectionAliasSchema, CollectionAliasesResponse};

impl<T: Transport> TypesenseClient<T> {
    pub fn list_aliases(&self, ctx: &Context) -> Result<Vec<CollectionAlias>, Error> {
        let response: CollectionAliasesResponse = self.call(ctx, ApiRequest::get("/aliases"))?;
        Ok(response.aliases)
    }

    /// Point `name` at a collection, replacing any previous target.
    pub fn upsert_alias(
        &self,
        ctx: &Context,
        name: &str,
        alias: &CollectionAliasSchema,
    ) -> Result<CollectionAlias, Error> {
        self.call(ctx, ApiRequest::put(format!("/aliases/{name}")).json(alias)?)
    }

    pub fn get_alias(&self, ctx: &Context, name: &str) -> Result<CollectionAlias, Error> {
        self.call(ctx, ApiRequest::get(format!("/aliases/{name}")))
    }

    pub fn delete_alias(&self, ctx: &Context, name: &str) -> Result<CollectionAlias, Error> {
        self.call(ctx, ApiRequest::delete(format!("/aliases/{name}")))
    }
}
