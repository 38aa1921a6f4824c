//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port and drives it
//! through `TypesenseClient` with the default `ureq` transport, so request
//! building, error extraction and every decode mode run over real HTTP.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use typesense_core::{
    ApiKeySchema, ClientConfig, CollectionAliasSchema, CollectionSchema, CollectionUpdateSchema, Context,
    ContextError, DeleteDocumentsParams, Error, ExportDocumentsParams, Field, ImportAction, ImportDocumentsParams,
    MultiSearchCollectionParameters, MultiSearchParameters, MultiSearchSearchesParameter, OverrideMatch,
    PresetValue, SearchOverrideSchema, SearchParameters, SearchSynonymSchema, SnapshotParams, TypesenseClient,
    UpdateDocumentsParams,
};

const API_KEY: &str = "integration-key";

/// Start the mock server on an ephemeral port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, API_KEY).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> TypesenseClient {
    let config = ClientConfig::new(base_url, API_KEY).with_timeout(Duration::from_secs(5));
    TypesenseClient::new(config).unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Company {
    id: String,
    company_name: String,
    num_employees: i64,
    country: String,
}

fn company(id: &str, name: &str, employees: i64, country: &str) -> Company {
    Company {
        id: id.to_string(),
        company_name: name.to_string(),
        num_employees: employees,
        country: country.to_string(),
    }
}

fn companies_schema() -> CollectionSchema {
    CollectionSchema {
        name: "companies".to_string(),
        fields: vec![
            Field::new("company_name", "string"),
            Field::new("num_employees", "int32"),
            Field::new("country", "string").facet(),
        ],
        default_sorting_field: Some("num_employees".to_string()),
        ..Default::default()
    }
}

fn seeded(base_url: &str) -> TypesenseClient {
    let client = client(base_url);
    let ctx = Context::background();
    client.create_collection(&ctx, &companies_schema()).unwrap();
    let docs = vec![
        company("1", "Stark Industries", 5215, "USA"),
        company("2", "Acme Corp", 120, "USA"),
        company("3", "Wayne Enterprises", 9000, "UK"),
    ];
    let results = client.import_documents(&ctx, "companies", &docs, None).unwrap();
    assert!(results.iter().all(|r| r.success));
    client
}

#[test]
fn collection_lifecycle() {
    let client = client(&start_server());
    let ctx = Context::background();

    // Fresh server: `[]` decodes to an empty list.
    assert!(client.list_collections(&ctx).unwrap().is_empty());

    let created = client.create_collection(&ctx, &companies_schema()).unwrap();
    assert_eq!(created.name, "companies");
    assert_eq!(created.num_documents, Some(0));
    assert_eq!(created.fields.len(), 3);

    let fetched = client.get_collection(&ctx, "companies").unwrap();
    assert_eq!(fetched.default_sorting_field.as_deref(), Some("num_employees"));

    let update = CollectionUpdateSchema {
        fields: vec![Field::new("city", "string").optional()],
    };
    let updated = client.update_collection(&ctx, "companies", &update).unwrap();
    assert_eq!(updated.fields[0].name, "city");
    assert_eq!(client.get_collection(&ctx, "companies").unwrap().fields.len(), 4);

    let deleted = client.delete_collection(&ctx, "companies").unwrap();
    assert_eq!(deleted.name, "companies");

    let err = client.get_collection(&ctx, "companies").unwrap_err();
    let api = err.as_api().expect("expected an API error");
    assert_eq!(api.status, 404);
    assert_eq!(api.message, "Not Found");
    assert!(api.is_not_found());
}

#[test]
fn duplicate_collection_is_conflict() {
    let base = start_server();
    let client = seeded(&base);
    let err = client
        .create_collection(&Context::background(), &companies_schema())
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[test]
fn document_crud() {
    let client = client(&start_server());
    let ctx = Context::background();
    client.create_collection(&ctx, &companies_schema()).unwrap();

    let stark = company("124", "Stark Industries", 5215, "USA");
    let created = client.create_document(&ctx, "companies", &stark).unwrap();
    assert_eq!(created["company_name"], "Stark Industries");

    let err = client.create_document(&ctx, "companies", &stark).unwrap_err();
    assert_eq!(err.status(), Some(409));

    let upserted = client
        .upsert_document(&ctx, "companies", &company("124", "Stark Industries", 6000, "USA"))
        .unwrap();
    assert_eq!(upserted["num_employees"], 6000);

    let patched = client
        .update_document(&ctx, "companies", "124", &json!({ "country": "Canada" }))
        .unwrap();
    assert_eq!(patched["country"], "Canada");

    let fetched = client.get_document(&ctx, "companies", "124").unwrap();
    let fetched: Company = serde_json::from_value(serde_json::Value::Object(fetched)).unwrap();
    assert_eq!(fetched, company("124", "Stark Industries", 6000, "Canada"));

    client.delete_document(&ctx, "companies", "124").unwrap();
    let err = client.get_document(&ctx, "companies", "124").unwrap_err();
    assert!(err.as_api().is_some_and(|api| api.is_not_found()));
}

#[test]
fn import_reports_partial_failure_per_line() {
    let client = client(&start_server());
    let ctx = Context::background();
    client.create_collection(&ctx, &companies_schema()).unwrap();

    let docs = vec![
        json!({ "id": "1", "company_name": "Stark Industries", "num_employees": 5215, "country": "USA" }),
        json!({ "id": "2", "num_employees": 10, "country": "USA" }),
    ];
    let params = ImportDocumentsParams {
        action: Some(ImportAction::Upsert),
        ..Default::default()
    };
    let results = client.import_documents(&ctx, "companies", &docs, Some(&params)).unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].code, Some(400));
    assert!(results[1].error.as_deref().unwrap().contains("company_name"));
    assert!(results[1].document.as_deref().unwrap().contains(r#""id":"2""#));
}

#[test]
fn export_decodes_lines_and_passes_through_raw() {
    let base = start_server();
    let client = seeded(&base);
    let ctx = Context::background();

    let exported = client.export_documents(&ctx, "companies", None).unwrap();
    assert_eq!(exported.len(), 3);

    let params = ExportDocumentsParams {
        filter_by: Some("country:=USA".to_string()),
        include_fields: Some("id,company_name".to_string()),
        ..Default::default()
    };
    let filtered = client.export_documents(&ctx, "companies", Some(&params)).unwrap();
    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|doc| doc.len() == 2));

    let mut raw = Vec::new();
    client.export_documents_to(&ctx, "companies", None, &mut raw).unwrap();
    let text = String::from_utf8(raw).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.starts_with('{'));
}

#[test]
fn update_and_delete_by_query() {
    let base = start_server();
    let client = seeded(&base);
    let ctx = Context::background();

    let params = UpdateDocumentsParams {
        filter_by: "num_employees:>1000".to_string(),
        ..Default::default()
    };
    let updated = client
        .update_documents_by_query(&ctx, "companies", &json!({ "country": "Global" }), &params)
        .unwrap();
    assert_eq!(updated.num_updated, 2);

    let params = DeleteDocumentsParams {
        filter_by: "country:=Global".to_string(),
        batch_size: Some(100),
    };
    let deleted = client.delete_documents_by_query(&ctx, "companies", &params).unwrap();
    assert_eq!(deleted.num_deleted, 2);
    assert_eq!(client.export_documents(&ctx, "companies", None).unwrap().len(), 1);
}

#[test]
fn search_returns_hits() {
    let base = start_server();
    let client = seeded(&base);

    let params = SearchParameters {
        q: "stark".to_string(),
        query_by: "company_name".to_string(),
        ..Default::default()
    };
    let result = client.search(&Context::background(), "companies", &params).unwrap();

    assert_eq!(result.found, Some(1));
    assert_eq!(result.out_of, Some(3));
    let hits = result.hits.unwrap();
    let document = hits[0].document.as_ref().unwrap();
    assert_eq!(document["id"], "1");
    assert_eq!(result.request_params.unwrap().collection_name, "companies");
}

#[test]
fn multi_search_mixes_results_and_errors() {
    let base = start_server();
    let client = seeded(&base);

    let searches = MultiSearchSearchesParameter {
        searches: vec![
            MultiSearchCollectionParameters::new("companies", "*"),
            MultiSearchCollectionParameters::new("missing", "*"),
            MultiSearchCollectionParameters {
                filter_by: Some("country:=UK".to_string()),
                ..MultiSearchCollectionParameters::new("companies", "*")
            },
        ],
    };
    let common = MultiSearchParameters {
        query_by: Some("company_name".to_string()),
        ..Default::default()
    };
    let response = client
        .multi_search(&Context::background(), &searches, Some(&common))
        .unwrap();

    assert_eq!(response.results.len(), 3);
    assert_eq!(response.results[0].result().unwrap().found, Some(3));

    let error = response.results[1].error().expect("second search should fail");
    assert_eq!(error.code, 404);
    assert_eq!(error.error, "Not found.");

    let uk = response.results[2].clone().into_result().unwrap();
    assert_eq!(uk.found, Some(1));
}

#[test]
fn aliases_keys_and_synonyms() {
    let base = start_server();
    let client = seeded(&base);
    let ctx = Context::background();

    let alias = client
        .upsert_alias(
            &ctx,
            "firms",
            &CollectionAliasSchema {
                collection_name: "companies".to_string(),
            },
        )
        .unwrap();
    assert_eq!(alias.collection_name, "companies");
    assert_eq!(client.get_collection(&ctx, "firms").unwrap().name, "companies");
    assert_eq!(client.list_aliases(&ctx).unwrap().len(), 1);
    client.delete_alias(&ctx, "firms").unwrap();
    assert!(client.get_alias(&ctx, "firms").unwrap_err().as_api().is_some());

    let schema = ApiKeySchema {
        actions: vec!["documents:search".to_string()],
        collections: vec!["companies".to_string()],
        description: "search-only".to_string(),
        ..Default::default()
    };
    let key = client.create_key(&ctx, &schema).unwrap();
    let id = key.id.unwrap();
    let value = key.value.unwrap();
    let fetched = client.get_key(&ctx, id).unwrap();
    assert!(fetched.value.is_none());
    assert_eq!(fetched.value_prefix.as_deref(), Some(&value[..4]));
    assert_eq!(client.list_keys(&ctx).unwrap().len(), 1);
    assert_eq!(client.delete_key(&ctx, id).unwrap().id, id);

    let synonym = SearchSynonymSchema {
        root: None,
        synonyms: vec!["corp".to_string(), "corporation".to_string()],
    };
    let stored = client.upsert_synonym(&ctx, "companies", "corp", &synonym).unwrap();
    assert_eq!(stored.id, "corp");
    assert_eq!(client.list_synonyms(&ctx, "companies").unwrap().len(), 1);
    assert_eq!(client.get_synonym(&ctx, "companies", "corp").unwrap().synonyms.len(), 2);
    assert_eq!(client.delete_synonym(&ctx, "companies", "corp").unwrap().id, "corp");
}

#[test]
fn overrides_and_presets() {
    let base = start_server();
    let client = seeded(&base);
    let ctx = Context::background();

    let schema = SearchOverrideSchema::new("stark", OverrideMatch::Exact)
        .include("2", 1)
        .exclude("3");
    let stored = client.upsert_override(&ctx, "companies", "pin-orbit", &schema).unwrap();
    assert_eq!(stored.id, "pin-orbit");
    assert_eq!(stored.schema, schema);
    assert_eq!(client.list_overrides(&ctx, "companies").unwrap().len(), 1);
    let fetched = client.get_override(&ctx, "companies", "pin-orbit").unwrap();
    assert_eq!(fetched.schema.rule.match_type, OverrideMatch::Exact);
    assert_eq!(client.delete_override(&ctx, "companies", "pin-orbit").unwrap().id, "pin-orbit");
    assert_eq!(
        client.get_override(&ctx, "companies", "pin-orbit").unwrap_err().as_api().unwrap().status,
        404
    );

    let value = PresetValue::Search(SearchParameters {
        q: "*".to_string(),
        query_by: "company_name".to_string(),
        ..Default::default()
    });
    let preset = client.upsert_preset(&ctx, "listing", value.clone()).unwrap();
    assert_eq!(preset.name, "listing");
    assert_eq!(preset.value, value);
    assert_eq!(client.list_presets(&ctx).unwrap().len(), 1);
    assert_eq!(client.get_preset(&ctx, "listing").unwrap().value, value);
    assert_eq!(client.delete_preset(&ctx, "listing").unwrap().name, "listing");
    assert!(client.list_presets(&ctx).unwrap().is_empty());
}

#[test]
fn health_and_snapshot() {
    let client = client(&start_server());
    let ctx = Context::background();

    assert!(client.health(&ctx).unwrap().ok);
    let params = SnapshotParams {
        snapshot_path: "/tmp/typesense-snapshot".to_string(),
    };
    assert!(client.snapshot(&ctx, &params).unwrap().success);
}

#[test]
fn wrong_api_key_is_unauthorized() {
    let base = start_server();
    let client = TypesenseClient::new(ClientConfig::new(&base, "wrong")).unwrap();

    let err = client.list_collections(&Context::background()).unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.status, 401);
    assert!(api.message.contains("x-typesense-api-key"));
}

#[test]
fn ended_context_fails_before_sending() {
    let client = client(&start_server());

    let ctx = Context::background();
    ctx.cancel();
    let err = client.list_collections(&ctx).unwrap_err();
    assert!(matches!(err, Error::Context(ContextError::Cancelled)));

    let ctx = Context::with_timeout(Duration::ZERO);
    let err = client.health(&ctx).unwrap_err();
    assert!(matches!(err, Error::Context(ContextError::DeadlineExceeded)));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{addr}"));
    let err = client.health(&Context::background()).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn client_is_shared_across_threads() {
    let base = start_server();
    let client = seeded(&base);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let ctx = Context::background();
                let params = SearchParameters {
                    q: "*".to_string(),
                    query_by: "company_name".to_string(),
                    ..Default::default()
                };
                let result = client.search(&ctx, "companies", &params).unwrap();
                assert_eq!(result.found, Some(3));
            });
        }
    });
}

/// Accept connections and hold them open without ever answering.
fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            held.push(stream);
        }
    });
    format!("http://{addr}")
}

#[test]
fn configured_timeout_holds_under_a_longer_deadline() {
    let config = ClientConfig::new(&silent_server(), API_KEY).with_timeout(Duration::from_millis(300));
    let client = TypesenseClient::new(config).unwrap();

    let started = Instant::now();
    let err = client.health(&Context::with_timeout(Duration::from_secs(10))).unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    assert!(matches!(err, Error::Transport(_)), "{err}");
}

#[test]
fn deadline_shorter_than_configured_timeout_wins() {
    let config = ClientConfig::new(&silent_server(), API_KEY).with_timeout(Duration::from_secs(10));
    let client = TypesenseClient::new(config).unwrap();

    let started = Instant::now();
    let err = client.health(&Context::with_timeout(Duration::from_millis(300))).unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    assert!(matches!(err, Error::Context(ContextError::DeadlineExceeded)), "{err}");
}

#[test]
fn truncated_error_body_yields_empty_message() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\n{\"mess")
            .unwrap();
    });

    let client = client(&format!("http://{addr}"));
    let err = client.health(&Context::background()).unwrap_err();
    let api = err.as_api().unwrap_or_else(|| panic!("expected an API error, got {err}"));
    assert_eq!(api.status, 500);
    assert_eq!(api.message, "");
}
