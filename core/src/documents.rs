//! Document endpoints, including bulk import/export and search.
//!
//! # Design
//! Import sends newline-delimited JSON and reads one result line per input
//! record back; export reads newline-delimited documents, either decoded or
//! copied verbatim to a writer. Everything else is single-object JSON.

use std::io::Write;

use serde::Serialize;

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::decode::DecodeTarget;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{
    DeleteByQueryResponse, DeleteDocumentsParams, Document, ExportDocumentsParams, ImportDocumentResponse,
    ImportDocumentsParams, SearchParameters, SearchResult, UpdateByQueryResponse, UpdateDocumentsParams,
};

fn documents_path(collection: &str) -> String {
    format!("/collections/{collection}/documents")
}

fn document_path(collection: &str, id: &str) -> String {
    format!("/collections/{collection}/documents/{id}")
}

impl<T: Transport> TypesenseClient<T> {
    /// Index a new document. Fails with 409 if the id already exists.
    pub fn create_document<D: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        collection: &str,
        document: &D,
    ) -> Result<Document, Error> {
        self.call(ctx, ApiRequest::post(documents_path(collection)).json(document)?)
    }

    /// Create the document or replace the existing one with the same id.
    pub fn upsert_document<D: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        collection: &str,
        document: &D,
    ) -> Result<Document, Error> {
        let request = ApiRequest::post(documents_path(collection))
            .json(document)?
            .param("action", "upsert");
        self.call(ctx, request)
    }

    pub fn get_document(&self, ctx: &Context, collection: &str, id: &str) -> Result<Document, Error> {
        self.call(ctx, ApiRequest::get(document_path(collection, id)))
    }

    /// Partially update a document; only the supplied fields change.
    pub fn update_document<D: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        collection: &str,
        id: &str,
        fields: &D,
    ) -> Result<Document, Error> {
        self.call(ctx, ApiRequest::patch(document_path(collection, id)).json(fields)?)
    }

    pub fn delete_document(&self, ctx: &Context, collection: &str, id: &str) -> Result<Document, Error> {
        self.call(ctx, ApiRequest::delete(document_path(collection, id)))
    }

    pub fn update_documents_by_query<D: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        collection: &str,
        fields: &D,
        params: &UpdateDocumentsParams,
    ) -> Result<UpdateByQueryResponse, Error> {
        let request = ApiRequest::patch(documents_path(collection))
            .json(fields)?
            .options(Some(params))?;
        self.call(ctx, request)
    }

    pub fn delete_documents_by_query(
        &self,
        ctx: &Context,
        collection: &str,
        params: &DeleteDocumentsParams,
    ) -> Result<DeleteByQueryResponse, Error> {
        self.call(ctx, ApiRequest::delete(documents_path(collection)).options(Some(params))?)
    }

    /// Bulk import. `results[i]` reports on `documents[i]`; a failed line is
    /// data, not an `Error`.
    pub fn import_documents<D: Serialize>(
        &self,
        ctx: &Context,
        collection: &str,
        documents: &[D],
        params: Option<&ImportDocumentsParams>,
    ) -> Result<Vec<ImportDocumentResponse>, Error> {
        let request = ApiRequest::post(format!("{}/import", documents_path(collection)))
            .lines(documents)?
            .options(params)?;
        self.call_lines(ctx, request)
    }

    pub fn export_documents(
        &self,
        ctx: &Context,
        collection: &str,
        params: Option<&ExportDocumentsParams>,
    ) -> Result<Vec<Document>, Error> {
        let request = ApiRequest::get(format!("{}/export", documents_path(collection))).options(params)?;
        self.call_lines(ctx, request)
    }

    /// Stream the raw export body into `writer` without parsing it.
    pub fn export_documents_to(
        &self,
        ctx: &Context,
        collection: &str,
        params: Option<&ExportDocumentsParams>,
        writer: &mut dyn Write,
    ) -> Result<(), Error> {
        let request = ApiRequest::get(format!("{}/export", documents_path(collection))).options(params)?;
        self.execute(ctx, request, DecodeTarget::pass_through(writer))
    }

    pub fn search(&self, ctx: &Context, collection: &str, params: &SearchParameters) -> Result<SearchResult, Error> {
        let request = ApiRequest::get(format!("{}/search", documents_path(collection))).options(Some(params))?;
        self.call(ctx, request)
    }
}
