//! Per-collection curation rules: pin or hide documents for matching queries.

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{SearchOverride, SearchOverrideDeleteResponse, SearchOverrideSchema, SearchOverridesResponse};

fn override_path(collection: &str, id: &str) -> String {
    format!("/collections/{collection}/overrides/{id}")
}

impl<T: Transport> TypesenseClient<T> {
    pub fn list_overrides(&self, ctx: &Context, collection: &str) -> Result<Vec<SearchOverride>, Error> {
        let response: SearchOverridesResponse =
            self.call(ctx, ApiRequest::get(format!("/collections/{collection}/overrides")))?;
        Ok(response.overrides)
    }

    pub fn get_override(&self, ctx: &Context, collection: &str, id: &str) -> Result<SearchOverride, Error> {
        self.call(ctx, ApiRequest::get(override_path(collection, id)))
    }

    pub fn upsert_override(
        &self,
        ctx: &Context,
        collection: &str,
        id: &str,
        schema: &SearchOverrideSchema,
    ) -> Result<SearchOverride, Error> {
        self.call(ctx, ApiRequest::put(override_path(collection, id)).json(schema)?)
    }

    pub fn delete_override(
        &self,
        ctx: &Context,
        collection: &str,
        id: &str,
    ) -> Result<SearchOverrideDeleteResponse, Error> {
        self.call(ctx, ApiRequest::delete(override_path(collection, id)))
    }
}
