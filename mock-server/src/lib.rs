use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-typesense-api-key";

/// One collection: its schema plus the documents, synonyms and overrides it owns.
#[derive(Debug, Clone)]
struct CollectionEntry {
    schema: Map<String, Value>,
    created_at: i64,
    documents: BTreeMap<String, Value>,
    synonyms: BTreeMap<String, Value>,
    overrides: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct Store {
    collections: BTreeMap<String, CollectionEntry>,
    aliases: BTreeMap<String, String>,
    keys: BTreeMap<i64, Value>,
    next_key_id: i64,
    presets: BTreeMap<String, Value>,
}

impl Store {
    /// Follow an alias to its collection name; plain names pass through.
    fn resolve(&self, name: &str) -> Option<String> {
        if self.collections.contains_key(name) {
            return Some(name.to_string());
        }
        self.aliases
            .get(name)
            .filter(|target| self.collections.contains_key(*target))
            .cloned()
    }

    fn collection(&self, name: &str) -> Result<&CollectionEntry, ApiFailure> {
        let resolved = self.resolve(name).ok_or_else(ApiFailure::not_found)?;
        self.collections.get(&resolved).ok_or_else(ApiFailure::not_found)
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut CollectionEntry, ApiFailure> {
        let resolved = self.resolve(name).ok_or_else(ApiFailure::not_found)?;
        self.collections.get_mut(&resolved).ok_or_else(ApiFailure::not_found)
    }
}

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

/// Error response in the service's `{"message": ...}` shape.
#[derive(Debug)]
struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiFailure>;

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        store: Arc::new(RwLock::new(Store::default())),
    };
    router(state)
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/{name}",
            get(get_collection).patch(update_collection).delete(delete_collection),
        )
        .route(
            "/collections/{name}/documents",
            post(create_document).patch(update_by_query).delete(delete_by_query),
        )
        .route("/collections/{name}/documents/import", post(import_documents))
        .route("/collections/{name}/documents/export", get(export_documents))
        .route("/collections/{name}/documents/search", get(search_collection))
        .route(
            "/collections/{name}/documents/{id}",
            get(get_document).patch(update_document).delete(delete_document),
        )
        .route("/collections/{name}/synonyms", get(list_synonyms))
        .route(
            "/collections/{name}/synonyms/{id}",
            get(get_synonym).put(upsert_synonym).delete(delete_synonym),
        )
        .route("/collections/{name}/overrides", get(list_overrides))
        .route(
            "/collections/{name}/overrides/{id}",
            get(get_override).put(upsert_override).delete(delete_override),
        )
        .route("/multi_search", post(multi_search))
        .route("/aliases", get(list_aliases))
        .route("/aliases/{name}", get(get_alias).put(upsert_alias).delete(delete_alias))
        .route("/presets", get(list_presets))
        .route("/presets/{name}", get(get_preset).put(upsert_preset).delete(delete_preset))
        .route("/keys", get(list_keys).post(create_key))
        .route("/keys/{id}", get(get_key).delete(delete_key))
        .route("/operations/snapshot", post(snapshot))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if supplied != Some(&*state.api_key) {
        return ApiFailure::new(
            StatusCode::UNAUTHORIZED,
            "Forbidden - a valid `x-typesense-api-key` header must be sent.",
        )
        .into_response();
    }
    next.run(request).await
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

fn collection_json(entry: &CollectionEntry) -> Value {
    let mut out = entry.schema.clone();
    out.insert("created_at".to_string(), json!(entry.created_at));
    out.insert("num_documents".to_string(), json!(entry.documents.len()));
    Value::Object(out)
}

/// Non-optional schema fields, excluding `id` and wildcard patterns.
fn required_fields(entry: &CollectionEntry) -> Vec<String> {
    entry
        .schema
        .get("fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter(|field| !field.get("optional").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|field| field.get("name").and_then(Value::as_str))
                .filter(|name| *name != "id" && !name.contains('*'))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

async fn list_collections(State(state): State<AppState>) -> Json<Vec<Value>> {
    let store = state.store.read().await;
    Json(store.collections.values().map(collection_json).collect())
}

async fn create_collection(
    State(state): State<AppState>,
    Json(schema): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Value::Object(schema) = schema else {
        return Err(ApiFailure::bad_request("Bad JSON."));
    };
    let name = schema
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiFailure::bad_request("Parameter `name` is required."))?
        .to_string();
    if !schema.get("fields").is_some_and(Value::is_array) {
        return Err(ApiFailure::bad_request("Parameter `fields` is required."));
    }

    let mut store = state.store.write().await;
    if store.collections.contains_key(&name) {
        return Err(ApiFailure::new(
            StatusCode::CONFLICT,
            format!("A collection with name `{name}` already exists."),
        ));
    }
    let entry = CollectionEntry {
        schema,
        created_at: now(),
        documents: BTreeMap::new(),
        synonyms: BTreeMap::new(),
        overrides: BTreeMap::new(),
    };
    let body = collection_json(&entry);
    store.collections.insert(name, entry);
    Ok((StatusCode::CREATED, Json(body)))
}

async fn get_collection(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    Ok(Json(collection_json(store.collection(&name)?)))
}

async fn update_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(update): Json<Value>,
) -> ApiResult<Json<Value>> {
    let changes = update
        .get("fields")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| ApiFailure::bad_request("Parameter `fields` is required."))?;

    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    let fields = entry
        .schema
        .entry("fields")
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or_else(|| ApiFailure::bad_request("Bad schema."))?;

    for change in changes {
        let field_name = change.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
        if change.get("drop").and_then(Value::as_bool).unwrap_or(false) {
            fields.retain(|f| f.get("name").and_then(Value::as_str) != Some(field_name.as_str()));
        } else {
            fields.push(change);
        }
    }
    Ok(Json(update))
}

async fn delete_collection(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let resolved = store.resolve(&name).ok_or_else(ApiFailure::not_found)?;
    let entry = store.collections.remove(&resolved).ok_or_else(ApiFailure::not_found)?;
    Ok(Json(collection_json(&entry)))
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct WriteQuery {
    action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FilterQuery {
    filter_by: Option<String>,
    include_fields: Option<String>,
    exclude_fields: Option<String>,
}

/// Outcome of writing one document, shared by the single and bulk paths.
fn write_document(entry: &mut CollectionEntry, document: Value, action: &str) -> Result<Value, ApiFailure> {
    let Value::Object(mut document) = document else {
        return Err(ApiFailure::bad_request("Bad JSON."));
    };

    let id = match document.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(_) => return Err(ApiFailure::bad_request("Document's `id` field should be a string.")),
        None => {
            let id = Uuid::new_v4().to_string();
            document.insert("id".to_string(), json!(id));
            id
        }
    };

    if action == "update" || action == "emplace" {
        if let Some(Value::Object(existing)) = entry.documents.get_mut(&id) {
            existing.extend(document);
            return Ok(Value::Object(existing.clone()));
        }
        if action == "update" {
            return Err(ApiFailure::not_found());
        }
    }

    if let Some(missing) = required_fields(entry).into_iter().find(|f| !document.contains_key(f)) {
        return Err(ApiFailure::bad_request(format!(
            "Field `{missing}` has been declared in the schema, but is not found in the document."
        )));
    }
    if action == "create" && entry.documents.contains_key(&id) {
        return Err(ApiFailure::new(
            StatusCode::CONFLICT,
            format!("A document with id {id} already exists."),
        ));
    }

    let document = Value::Object(document);
    entry.documents.insert(id, document.clone());
    Ok(document)
}

async fn create_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<WriteQuery>,
    Json(document): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let action = query.action.unwrap_or_else(|| "create".to_string());
    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    let document = write_document(entry, document, &action)?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn get_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let entry = store.collection(&name)?;
    entry.documents.get(&id).cloned().map(Json).ok_or_else(|| {
        ApiFailure::new(StatusCode::NOT_FOUND, format!("Could not find a document with id: {id}"))
    })
}

async fn update_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    Json(fields): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Value::Object(fields) = fields else {
        return Err(ApiFailure::bad_request("Bad JSON."));
    };
    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    let Some(Value::Object(existing)) = entry.documents.get_mut(&id) else {
        return Err(ApiFailure::new(
            StatusCode::NOT_FOUND,
            format!("Could not find a document with id: {id}"),
        ));
    };
    existing.extend(fields.clone());
    let mut partial = fields;
    partial.insert("id".to_string(), json!(id));
    Ok(Json(Value::Object(partial)))
}

async fn delete_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    entry.documents.remove(&id).map(Json).ok_or_else(|| {
        ApiFailure::new(StatusCode::NOT_FOUND, format!("Could not find a document with id: {id}"))
    })
}

async fn update_by_query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<FilterQuery>,
    Json(fields): Json<Value>,
) -> ApiResult<Json<Value>> {
    let filter = query
        .filter_by
        .ok_or_else(|| ApiFailure::bad_request("Parameter `filter_by` must be provided."))?;
    let Value::Object(fields) = fields else {
        return Err(ApiFailure::bad_request("Bad JSON."));
    };

    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    let mut num_updated = 0;
    for document in entry.documents.values_mut() {
        if matches_filter(document, &filter) {
            if let Value::Object(existing) = document {
                existing.extend(fields.clone());
                num_updated += 1;
            }
        }
    }
    Ok(Json(json!({ "num_updated": num_updated })))
}

async fn delete_by_query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<Value>> {
    let filter = query
        .filter_by
        .ok_or_else(|| ApiFailure::bad_request("Parameter `filter_by` must be provided."))?;

    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    let before = entry.documents.len();
    entry.documents.retain(|_, document| !matches_filter(document, &filter));
    Ok(Json(json!({ "num_deleted": before - entry.documents.len() })))
}

/// Bulk import: one JSON document per line in, one result per line out.
async fn import_documents(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<WriteQuery>,
    body: String,
) -> ApiResult<String> {
    let action = query.action.unwrap_or_else(|| "create".to_string());
    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;

    let mut results = Vec::new();
    for line in body.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let outcome = serde_json::from_str::<Value>(line)
            .map_err(|_| ApiFailure::bad_request("Bad JSON."))
            .and_then(|document| write_document(entry, document, &action));
        let result = match outcome {
            Ok(_) => json!({ "success": true }),
            Err(failure) => json!({
                "code": failure.status.as_u16(),
                "document": line,
                "error": failure.message,
                "success": false,
            }),
        };
        results.push(result.to_string());
    }
    Ok(results.join("\n"))
}

fn project(document: &Value, include: Option<&str>, exclude: Option<&str>) -> Value {
    let Value::Object(fields) = document else {
        return document.clone();
    };
    let split = |list: &str| list.split(',').map(|f| f.trim().to_string()).collect::<Vec<_>>();
    let include = include.map(split);
    let exclude = exclude.map(split).unwrap_or_default();
    let projected = fields
        .iter()
        .filter(|(key, _)| include.as_ref().map_or(true, |inc| inc.contains(key)))
        .filter(|(key, _)| !exclude.contains(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(projected)
}

async fn export_documents(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<String> {
    let store = state.store.read().await;
    let entry = store.collection(&name)?;
    let lines: Vec<String> = entry
        .documents
        .values()
        .filter(|document| query.filter_by.as_deref().map_or(true, |f| matches_filter(document, f)))
        .map(|document| {
            project(document, query.include_fields.as_deref(), query.exclude_fields.as_deref()).to_string()
        })
        .collect();
    Ok(lines.join("\n"))
}

// ---------------------------------------------------------------------------
// Filtering and search
// ---------------------------------------------------------------------------

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Evaluate a `&&`-joined filter of `field:=value`, `field:>n`, `field:>=n`,
/// `field:<n`, `field:<=n` and `field:=[lo..hi]` clauses.
pub fn matches_filter(document: &Value, filter: &str) -> bool {
    filter.split("&&").map(str::trim).all(|clause| {
        let Some((field, condition)) = clause.split_once(':') else {
            return false;
        };
        let Some(value) = document.get(field.trim()) else {
            return false;
        };
        let number = value.as_f64();

        let compare = |rest: &str, op: fn(f64, f64) -> bool| {
            match (number, rest.trim().parse::<f64>()) {
                (Some(lhs), Ok(rhs)) => op(lhs, rhs),
                _ => false,
            }
        };

        if let Some(rest) = condition.strip_prefix(">=") {
            compare(rest, |a, b| a >= b)
        } else if let Some(rest) = condition.strip_prefix("<=") {
            compare(rest, |a, b| a <= b)
        } else if let Some(rest) = condition.strip_prefix('>') {
            compare(rest, |a, b| a > b)
        } else if let Some(rest) = condition.strip_prefix('<') {
            compare(rest, |a, b| a < b)
        } else {
            let expected = condition.strip_prefix('=').unwrap_or(condition).trim();
            if let Some(range) = expected.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                if let Some((lo, hi)) = range.split_once("..") {
                    return match (number, lo.trim().parse::<f64>(), hi.trim().parse::<f64>()) {
                        (Some(n), Ok(lo), Ok(hi)) => lo <= n && n <= hi,
                        _ => false,
                    };
                }
            }
            field_text(value).is_some_and(|text| text == expected)
        }
    })
}

/// Parameters for one search, from the query string or a multi-search entry.
#[derive(Debug, Default, Clone, Deserialize)]
struct SearchQuery {
    q: Option<String>,
    query_by: Option<String>,
    filter_by: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

impl SearchQuery {
    fn or(self, fallback: &SearchQuery) -> SearchQuery {
        SearchQuery {
            q: self.q.or_else(|| fallback.q.clone()),
            query_by: self.query_by.or_else(|| fallback.query_by.clone()),
            filter_by: self.filter_by.or_else(|| fallback.filter_by.clone()),
            page: self.page.or(fallback.page),
            per_page: self.per_page.or(fallback.per_page),
        }
    }
}

fn run_search(collection_name: &str, entry: &CollectionEntry, query: &SearchQuery) -> ApiResult<Value> {
    let q = query
        .q
        .as_deref()
        .ok_or_else(|| ApiFailure::bad_request("Parameter `q` is required."))?;
    let query_by: Vec<&str> = query
        .query_by
        .as_deref()
        .ok_or_else(|| ApiFailure::bad_request("Parameter `query_by` is required."))?
        .split(',')
        .map(str::trim)
        .collect();
    let needle = q.to_lowercase();

    let matched: Vec<&Value> = entry
        .documents
        .values()
        .filter(|document| query.filter_by.as_deref().map_or(true, |f| matches_filter(document, f)))
        .filter(|document| {
            q == "*"
                || query_by.iter().any(|field| {
                    document
                        .get(*field)
                        .and_then(field_text)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
        })
        .collect();

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10);
    let hits: Vec<Value> = matched
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|document| json!({ "document": document, "highlights": [], "text_match": 100 }))
        .collect();

    Ok(json!({
        "facet_counts": [],
        "found": matched.len(),
        "hits": hits,
        "out_of": entry.documents.len(),
        "page": page,
        "request_params": { "collection_name": collection_name, "per_page": per_page, "q": q },
        "search_cutoff": false,
        "search_time_ms": 0,
    }))
}

async fn search_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let entry = store.collection(&name)?;
    run_search(&name, entry, &query).map(Json)
}

#[derive(Debug, Deserialize)]
struct MultiSearchBody {
    searches: Vec<MultiSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct MultiSearchEntry {
    collection: String,
    #[serde(flatten)]
    query: SearchQuery,
}

/// Each search succeeds or fails on its own; failures become
/// `{"code", "error"}` elements in place.
async fn multi_search(
    State(state): State<AppState>,
    Query(common): Query<SearchQuery>,
    Json(body): Json<MultiSearchBody>,
) -> Json<Value> {
    let store = state.store.read().await;
    let results: Vec<Value> = body
        .searches
        .into_iter()
        .map(|search| {
            let query = search.query.or(&common);
            store
                .collection(&search.collection)
                .map_err(|_| ApiFailure::new(StatusCode::NOT_FOUND, "Not found."))
                .and_then(|entry| run_search(&search.collection, entry, &query))
                .unwrap_or_else(|failure| json!({ "code": failure.status.as_u16(), "error": failure.message }))
        })
        .collect();
    Json(json!({ "results": results }))
}

// ---------------------------------------------------------------------------
// Synonyms
// ---------------------------------------------------------------------------

async fn list_synonyms(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let entry = store.collection(&name)?;
    let synonyms: Vec<&Value> = entry.synonyms.values().collect();
    Ok(Json(json!({ "synonyms": synonyms })))
}

async fn get_synonym(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let entry = store.collection(&name)?;
    entry.synonyms.get(&id).cloned().map(Json).ok_or_else(ApiFailure::not_found)
}

async fn upsert_synonym(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Value::Object(mut synonym) = body else {
        return Err(ApiFailure::bad_request("Bad JSON."));
    };
    if !synonym.get("synonyms").is_some_and(Value::is_array) {
        return Err(ApiFailure::bad_request("Could not find an array of `synonyms`"));
    }
    synonym.insert("id".to_string(), json!(id));

    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    let synonym = Value::Object(synonym);
    entry.synonyms.insert(id, synonym.clone());
    Ok(Json(synonym))
}

async fn delete_synonym(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    entry
        .synonyms
        .remove(&id)
        .map(|_| Json(json!({ "id": id })))
        .ok_or_else(ApiFailure::not_found)
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

async fn list_overrides(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let entry = store.collection(&name)?;
    let overrides: Vec<&Value> = entry.overrides.values().collect();
    Ok(Json(json!({ "overrides": overrides })))
}

async fn get_override(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let entry = store.collection(&name)?;
    entry.overrides.get(&id).cloned().map(Json).ok_or_else(ApiFailure::not_found)
}

async fn upsert_override(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Value::Object(mut rule) = body else {
        return Err(ApiFailure::bad_request("Bad JSON."));
    };
    let matches = rule
        .get("rule")
        .and_then(|r| r.get("match"))
        .and_then(Value::as_str);
    if !matches!(matches, Some("exact" | "contains")) {
        return Err(ApiFailure::bad_request(
            "The `rule` definition must contain a `match` of either `exact` or `contains`.",
        ));
    }
    rule.insert("id".to_string(), json!(id));

    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    let rule = Value::Object(rule);
    entry.overrides.insert(id, rule.clone());
    Ok(Json(rule))
}

async fn delete_override(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let entry = store.collection_mut(&name)?;
    entry
        .overrides
        .remove(&id)
        .map(|_| Json(json!({ "id": id })))
        .ok_or_else(ApiFailure::not_found)
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

async fn list_presets(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let presets: Vec<&Value> = store.presets.values().collect();
    Json(json!({ "presets": presets }))
}

async fn get_preset(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    store.presets.get(&name).cloned().map(Json).ok_or_else(ApiFailure::not_found)
}

async fn upsert_preset(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let value = body
        .get("value")
        .filter(|v| v.is_object())
        .cloned()
        .ok_or_else(|| ApiFailure::bad_request("Parameter `value` is required."))?;
    let preset = json!({ "name": name, "value": value });

    let mut store = state.store.write().await;
    store.presets.insert(name, preset.clone());
    Ok(Json(preset))
}

async fn delete_preset(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    store.presets.remove(&name).map(Json).ok_or_else(ApiFailure::not_found)
}

// ---------------------------------------------------------------------------
// Aliases
// ---------------------------------------------------------------------------

fn alias_json(name: &str, collection_name: &str) -> Value {
    json!({ "name": name, "collection_name": collection_name })
}

async fn list_aliases(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let aliases: Vec<Value> = store
        .aliases
        .iter()
        .map(|(name, target)| alias_json(name, target))
        .collect();
    Json(json!({ "aliases": aliases }))
}

#[derive(Debug, Deserialize)]
struct AliasBody {
    collection_name: String,
}

async fn upsert_alias(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<AliasBody>,
) -> Json<Value> {
    let mut store = state.store.write().await;
    store.aliases.insert(name.clone(), body.collection_name.clone());
    Json(alias_json(&name, &body.collection_name))
}

async fn get_alias(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    store
        .aliases
        .get(&name)
        .map(|target| Json(alias_json(&name, target)))
        .ok_or_else(ApiFailure::not_found)
}

async fn delete_alias(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    store
        .aliases
        .remove(&name)
        .map(|target| Json(alias_json(&name, &target)))
        .ok_or_else(ApiFailure::not_found)
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Stored keys keep their full value; reads only expose a prefix.
fn redacted_key(key: &Value) -> Value {
    let mut out = key.clone();
    if let Value::Object(fields) = &mut out {
        if let Some(Value::String(value)) = fields.remove("value") {
            let prefix: String = value.chars().take(4).collect();
            fields.insert("value_prefix".to_string(), json!(prefix));
        }
    }
    out
}

async fn list_keys(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let keys: Vec<Value> = store.keys.values().map(redacted_key).collect();
    Json(json!({ "keys": keys }))
}

async fn create_key(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Value::Object(mut key) = body else {
        return Err(ApiFailure::bad_request("Bad JSON."));
    };
    if !key.get("actions").is_some_and(Value::is_array) {
        return Err(ApiFailure::bad_request("Could not find a `actions` array."));
    }
    if !key.get("collections").is_some_and(Value::is_array) {
        return Err(ApiFailure::bad_request("Could not find a `collections` array."));
    }

    let mut store = state.store.write().await;
    store.next_key_id += 1;
    let id = store.next_key_id;
    key.insert("id".to_string(), json!(id));
    if !key.get("value").is_some_and(Value::is_string) {
        key.insert("value".to_string(), json!(Uuid::new_v4().simple().to_string()));
    }
    let key = Value::Object(key);
    store.keys.insert(id, key.clone());
    Ok((StatusCode::CREATED, Json(key)))
}

async fn get_key(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    store
        .keys
        .get(&id)
        .map(|key| Json(redacted_key(key)))
        .ok_or_else(|| ApiFailure::new(StatusCode::NOT_FOUND, "Key not found."))
}

async fn delete_key(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    store
        .keys
        .remove(&id)
        .map(|_| Json(json!({ "id": id })))
        .ok_or_else(|| ApiFailure::new(StatusCode::NOT_FOUND, "Key not found."))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn snapshot(Query(params): Query<HashMap<String, String>>) -> ApiResult<Json<Value>> {
    match params.get("snapshot_path") {
        Some(path) if !path.is_empty() => {
            tracing::info!(%path, "snapshot requested");
            Ok(Json(json!({ "success": true })))
        }
        _ => Err(ApiFailure::bad_request("Parameter `snapshot_path` is required.")),
    }
}
