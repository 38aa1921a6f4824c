//! Verify resource operations against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector describes an input, the request the client must send, a
//! simulated response, and either the decoded result or the API error.
//! A recording transport stands in for the network. Results are compared as
//! JSON subsets so server-side extras and unset optional fields never cause
//! false negatives.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use typesense_core::error::TransportError;
use typesense_core::{
    ClientConfig, CollectionSchema, Context, Error, ExportDocumentsParams, HttpMethod, HttpRequest, HttpResponse,
    ImportDocumentsParams, MultiSearchParameters, MultiSearchSearchesParameter, SearchParameters,
    SearchResultOrError, Transport, TypesenseClient,
};

const BASE_URL: &str = "http://localhost:8108";
const API_KEY: &str = "xyz";

/// Replays one canned response and keeps the request it was given.
struct Recorder {
    response: HttpResponse,
    sent: Mutex<Vec<HttpRequest>>,
}

impl Recorder {
    fn new(simulated: &Value) -> Self {
        let status = simulated["status"].as_u64().unwrap() as u16;
        let body = simulated["body"].as_str().unwrap();
        Self {
            response: HttpResponse::new(status, body),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> HttpRequest {
        let sent = self.sent.lock().unwrap();
        assert_eq!(sent.len(), 1, "expected exactly one request");
        sent[0].clone()
    }
}

impl Transport for Recorder {
    fn send(&self, request: &HttpRequest, _timeout: Option<Duration>) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

fn client(recorder: &Recorder) -> TypesenseClient<&Recorder> {
    TypesenseClient::with_transport(ClientConfig::new(BASE_URL, API_KEY), recorder).unwrap()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Every key of `expected` must be present in `actual` with a matching value.
fn assert_subset(name: &str, expected: &Value, actual: &Value) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, value) in exp {
                let got = act
                    .get(key)
                    .unwrap_or_else(|| panic!("{name}: missing key {key:?} in {actual}"));
                assert_subset(name, value, got);
            }
        }
        (Value::Array(exp), Value::Array(act)) => {
            assert_eq!(exp.len(), act.len(), "{name}: array length");
            for (e, a) in exp.iter().zip(act) {
                assert_subset(name, e, a);
            }
        }
        _ => assert_eq!(expected, actual, "{name}"),
    }
}

fn check_request(name: &str, expected: &Value, req: &HttpRequest) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(
        req.url,
        format!("{BASE_URL}{}", expected["url"].as_str().unwrap()),
        "{name}: url"
    );

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            (
                pair[0].as_str().unwrap().to_string(),
                pair[1].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    if let Some(lines) = expected.get("body_lines") {
        let body = req.body.as_deref().expect("NDJSON body");
        assert!(body.ends_with('\n'), "{name}: every record ends with a newline");
        let sent: Vec<Value> = body.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(&Value::Array(sent), lines, "{name}: body lines");
    } else if expected["body"].is_null() {
        assert!(req.body.is_none(), "{name}: expected no body");
    } else {
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, expected["body"], "{name}: body");
    }
}

fn check_error(name: &str, expected: &Value, err: Error) {
    let api = err.as_api().unwrap_or_else(|| panic!("{name}: expected API error, got {err}"));
    assert_eq!(api.status as u64, expected["status"].as_u64().unwrap(), "{name}: status");
    assert_eq!(api.message, expected["message"].as_str().unwrap(), "{name}: message");
}

/// Run one vector's operation and return its result as JSON.
fn run_operation(client: &TypesenseClient<&Recorder>, case: &Value) -> Result<Value, Error> {
    let ctx = Context::background();
    let input = &case["input"];
    match case["operation"].as_str().unwrap() {
        "list_collections" => client.list_collections(&ctx).map(to_json),
        "create_collection" => {
            let schema: CollectionSchema = serde_json::from_value(input.clone()).unwrap();
            client.create_collection(&ctx, &schema).map(to_json)
        }
        "get_collection" => client
            .get_collection(&ctx, input["name"].as_str().unwrap())
            .map(to_json),
        "import_documents" => {
            let documents = input["documents"].as_array().unwrap();
            let params: Option<ImportDocumentsParams> = serde_json::from_value(input["params"].clone()).unwrap();
            client
                .import_documents(&ctx, input["collection"].as_str().unwrap(), documents, params.as_ref())
                .map(to_json)
        }
        "export_documents" => {
            let params: Option<ExportDocumentsParams> = serde_json::from_value(input["params"].clone()).unwrap();
            client
                .export_documents(&ctx, input["collection"].as_str().unwrap(), params.as_ref())
                .map(to_json)
        }
        "search" => {
            let params: SearchParameters = serde_json::from_value(input["params"].clone()).unwrap();
            client
                .search(&ctx, input["collection"].as_str().unwrap(), &params)
                .map(to_json)
        }
        other => panic!("unknown operation: {other}"),
    }
}

fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap()
}

fn run_vectors(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let recorder = Recorder::new(&case["simulated_response"]);
        let outcome = run_operation(&client(&recorder), case);

        check_request(name, &case["expected_request"], &recorder.sent());
        match (case.get("expected_error"), outcome) {
            (Some(expected), Err(err)) => check_error(name, expected, err),
            (Some(_), Ok(result)) => panic!("{name}: expected an error, got {result}"),
            (None, Ok(result)) => assert_subset(name, &case["expected_result"], &result),
            (None, Err(err)) => panic!("{name}: unexpected error: {err}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[test]
fn collections_test_vectors() {
    run_vectors(include_str!("../../test-vectors/collections.json"));
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[test]
fn documents_test_vectors() {
    run_vectors(include_str!("../../test-vectors/documents.json"));
}

// ---------------------------------------------------------------------------
// Multi-search
// ---------------------------------------------------------------------------

#[test]
fn multi_search_test_vectors() {
    let raw = include_str!("../../test-vectors/multi_search.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let searches: MultiSearchSearchesParameter =
            serde_json::from_value(case["input"]["searches"].clone()).unwrap();
        let common: Option<MultiSearchParameters> = serde_json::from_value(case["input"]["common"].clone()).unwrap();

        let recorder = Recorder::new(&case["simulated_response"]);
        let outcome = client(&recorder).multi_search(&Context::background(), &searches, common.as_ref());
        check_request(name, &case["expected_request"], &recorder.sent());

        if let Some(expected) = case.get("expected_error") {
            check_error(name, expected, outcome.unwrap_err());
            continue;
        }

        let results = outcome.unwrap().results;
        let expected = case["expected_results"].as_array().unwrap();
        assert_eq!(results.len(), expected.len(), "{name}: result count");
        for (element, expected) in results.iter().zip(expected) {
            match (expected["kind"].as_str().unwrap(), element) {
                ("result", SearchResultOrError::Result(result)) => {
                    assert_eq!(result.found, expected["found"].as_u64(), "{name}: found");
                }
                ("error", SearchResultOrError::Error(error)) => {
                    assert_eq!(error.code as u64, expected["code"].as_u64().unwrap(), "{name}: code");
                    assert_eq!(error.error, expected["error"].as_str().unwrap(), "{name}: error");
                }
                (kind, other) => panic!("{name}: expected {kind}, got {other:?}"),
            }
        }
    }
}
