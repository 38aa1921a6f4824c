//! Wire DTOs for the search API.
//!
//! # Design
//! These types are defined independently from the mock-server crate;
//! integration tests catch schema drift between the two. Optional fields
//! are `Option` and skipped when unset so request bodies and query strings
//! only carry what the caller supplied. Documents are schemaless JSON
//! objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::multi_search::MultiSearchSearchesParameter;

/// A schemaless document.
pub type Document = Map<String, Value>;

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// A field in a collection schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infix: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_dim: Option<u32>,
    /// Only meaningful in a schema update: drop this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<bool>,
}

impl Field {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            ..Default::default()
        }
    }

    pub fn facet(mut self) -> Self {
        self.facet = Some(true);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = Some(true);
        self
    }
}

/// Request payload for creating a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sorting_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_nested_fields: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols_to_index: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_separators: Vec<String>,
}

/// Request payload for altering a collection's fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionUpdateSchema {
    pub fields: Vec<Field>,
}

/// A collection as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sorting_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_nested_fields: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_documents: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols_to_index: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_separators: Vec<String>,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// How the server treats values that do not match the field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtyValues {
    CoerceOrDrop,
    CoerceOrReject,
    Drop,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportAction {
    Create,
    Upsert,
    Update,
    Emplace,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportDocumentsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ImportAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirty_values: Option<DirtyValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_embedding_batch_size: Option<u32>,
}

/// One line of a bulk import response; lines correspond to input records
/// by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportDocumentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportDocumentsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_fields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_fields: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDocumentsParams {
    pub filter_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirty_values: Option<DirtyValues>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateByQueryResponse {
    pub num_updated: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteDocumentsParams {
    pub filter_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteByQueryResponse {
    pub num_deleted: u64,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Query-string parameters for a single-collection search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub q: String,
    pub query_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_fields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_fields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_typos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetCount {
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_values: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetCounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub counts: Vec<FacetCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<FacetStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHighlight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snippets: Vec<String>,
    /// Highlighted values of an array field, one per matched element.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatchInfo {
    pub best_field_score: String,
    pub best_field_weight: i64,
    pub fields_matched: i64,
    pub score: String,
    pub tokens_matched: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<SearchHighlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_match: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_match_info: Option<TextMatchInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_distance_meters: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_distance: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchGroupedHit {
    pub group_key: Vec<Value>,
    pub hits: Vec<SearchResultHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequestParams {
    pub collection_name: String,
    pub per_page: u32,
    pub q: String,
}

/// A successful search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_counts: Option<Vec<FacetCounts>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<Vec<SearchResultHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouped_hits: Option<Vec<SearchGroupedHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_params: Option<SearchRequestParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_cutoff: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_time_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Aliases, keys, synonyms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAliasSchema {
    pub collection_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAlias {
    pub name: String,
    pub collection_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAliasesResponse {
    pub aliases: Vec<CollectionAlias>,
}

/// Request payload for creating an API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeySchema {
    pub actions: Vec<String>,
    pub collections: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Explicit key value; generated by the server when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// An API key. The full `value` is only returned on creation; later reads
/// carry `value_prefix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actions: Vec<String>,
    pub collections: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeysResponse {
    pub keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyDeleteResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSynonymSchema {
    /// Set for one-way synonyms: the words in `synonyms` map to `root`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSynonym {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSynonymsResponse {
    pub synonyms: Vec<SearchSynonym>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSynonymDeleteResponse {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideMatch {
    #[default]
    Exact,
    Contains,
}

/// Which queries an override applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOverrideRule {
    pub query: String,
    #[serde(rename = "match")]
    pub match_type: OverrideMatch,
}

/// Document pinned at a 1-based position in the results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOverrideInclude {
    pub id: String,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOverrideExclude {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOverrideSchema {
    pub rule: SearchOverrideRule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<SearchOverrideInclude>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<SearchOverrideExclude>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    /// Strip the rule's query tokens from the search query before matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_matched_tokens: Option<bool>,
}

impl SearchOverrideSchema {
    pub fn new(query: impl Into<String>, match_type: OverrideMatch) -> Self {
        Self {
            rule: SearchOverrideRule {
                query: query.into(),
                match_type,
            },
            ..Default::default()
        }
    }

    pub fn include(mut self, id: impl Into<String>, position: u32) -> Self {
        self.includes.push(SearchOverrideInclude { id: id.into(), position });
        self
    }

    pub fn exclude(mut self, id: impl Into<String>) -> Self {
        self.excludes.push(SearchOverrideExclude { id: id.into() });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOverride {
    pub id: String,
    #[serde(flatten)]
    pub schema: SearchOverrideSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOverridesResponse {
    pub overrides: Vec<SearchOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOverrideDeleteResponse {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Stored search parameters, either for a single search or a whole batch.
///
/// Shapes that fit neither are kept as raw JSON; presets routinely omit
/// `q`, which a `SearchParameters` requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetValue {
    MultiSearch(MultiSearchSearchesParameter),
    Search(SearchParameters),
    Raw(Value),
}

impl Default for PresetValue {
    fn default() -> Self {
        PresetValue::Raw(Value::Object(Map::new()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetUpsertSchema {
    pub value: PresetValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub value: PresetValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetsResponse {
    pub presets: Vec<Preset>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessStatus {
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotParams {
    /// Directory on the server where the snapshot is written.
    pub snapshot_path: String,
}
