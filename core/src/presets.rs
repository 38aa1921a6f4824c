//! Named search-parameter presets shared across collections.

use crate::client::TypesenseClient;
use crate::context::Context;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::types::{Preset, PresetUpsertSchema, PresetValue, PresetsResponse};

fn preset_path(name: &str) -> String {
    format!("/presets/{name}")
}

impl<T: Transport> TypesenseClient<T> {
    pub fn list_presets(&self, ctx: &Context) -> Result<Vec<Preset>, Error> {
        let response: PresetsResponse = self.call(ctx, ApiRequest::get("/presets"))?;
        Ok(response.presets)
    }

    pub fn get_preset(&self, ctx: &Context, name: &str) -> Result<Preset, Error> {
        self.call(ctx, ApiRequest::get(preset_path(name)))
    }

    pub fn upsert_preset(&self, ctx: &Context, name: &str, value: PresetValue) -> Result<Preset, Error> {
        let schema = PresetUpsertSchema { value };
        self.call(ctx, ApiRequest::put(preset_path(name)).json(&schema)?)
    }

    /// The server answers with the preset as it was before removal.
    pub fn delete_preset(&self, ctx: &Context, name: &str) -> Result<Preset, Error> {
        self.call(ctx, ApiRequest::delete(preset_path(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchParameters;
    use serde_json::json;

    #[test]
    fn single_search_value_decodes_as_search() {
        let preset: Preset = serde_json::from_value(json!({
            "name": "listing",
            "value": { "q": "*", "query_by": "company_name", "per_page": 5 }
        }))
        .unwrap();

        match preset.value {
            PresetValue::Search(params) => {
                assert_eq!(params.query_by, "company_name");
                assert_eq!(params.per_page, Some(5));
            }
            other => panic!("expected search parameters, got {other:?}"),
        }
    }

    #[test]
    fn batch_value_decodes_as_multi_search() {
        let preset: Preset = serde_json::from_value(json!({
            "name": "dashboard",
            "value": { "searches": [{ "collection": "companies", "q": "*" }] }
        }))
        .unwrap();

        match preset.value {
            PresetValue::MultiSearch(batch) => assert_eq!(batch.searches.len(), 1),
            other => panic!("expected a batch, got {other:?}"),
        }
    }

    #[test]
    fn value_without_query_is_kept_raw() {
        let preset: Preset = serde_json::from_value(json!({
            "name": "sorted",
            "value": { "sort_by": "num_employees:desc" }
        }))
        .unwrap();
        assert_eq!(preset.value, PresetValue::Raw(json!({ "sort_by": "num_employees:desc" })));
    }

    #[test]
    fn upsert_body_wraps_value() {
        let value = PresetValue::Search(SearchParameters {
            q: "*".to_string(),
            query_by: "company_name".to_string(),
            ..Default::default()
        });
        let body = serde_json::to_value(PresetUpsertSchema { value }).unwrap();
        assert_eq!(body, json!({ "value": { "q": "*", "query_by": "company_name" } }));
    }
}
