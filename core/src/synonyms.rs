//! Per-collection synonym endpoints.

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{SearchSynonym, SearchSynonymDeleteResponse, SearchSynonymSchema, SearchSynonymsResponse};

fn synonym_path(collection: &str, id: &str) -> String {
    format!("/collections/{collection}/synonyms/{id}")
}

impl<T: Transport> TypesenseClient<T> {
    pub fn list_synonyms(&self, ctx: &Context, collection: &str) -> Result<Vec<SearchSynonym>, Error> {
        let response: SearchSynonymsResponse =
            self.call(ctx, ApiRequest::get(format!("/collections/{collection}/synonyms")))?;
        Ok(response.synonyms)
    }

    pub fn get_synonym(&self, ctx: &Context, collection: &str, id: &str) -> Result<SearchSynonym, Error> {
        self.call(ctx, ApiRequest::get(synonym_path(collection, id)))
    }

    pub fn upsert_synonym(
        &self,
        ctx: &Context,
        collection: &str,
        id: &str,
        synonym: &SearchSynonymSchema,
    ) -> Result<SearchSynonym, Error> {
        self.call(ctx, ApiRequest::put(synonym_path(collection, id)).json(synonym)?)
    }

    pub fn delete_synonym(
        &self,
        ctx: &Context,
        collection: &str,
        id: &str,
    ) -> Result<SearchSynonymDeleteResponse, Error> {
        self.call(ctx, ApiRequest::delete(synonym_path(collection, id)))
    }
}
