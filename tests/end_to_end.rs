//! End-to-end tests for pie
//!
//! These tests walk complete workflows from a file on disk through parsing,
//! scope resolution, request materialization and response processing, without
//! any network access.

use pie::config::{load_config, reset_config, PieConfig};
use pie::context::{RequestContext, ResolveError};
use pie::materializer::{build_request, build_request_with, BuildError};
use pie::models::{HttpMethod, HttpResponse};
use pie::parser::parse;
use pie::processor::{ProcessorError, ProcessorInput, ResponseProcessor};
use pie::source::read_source;
use serde_json::{json, Value};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CARGO_FILE: &str = r#"$ENV = "prod"
$captain = "mal reynolds"

@prod:
    Host: https://api.serenity.co
    $token = "shiny"

@staging:
    Host: http://localhost:8080

Authorization: Bearer $token

GET /crew/$captain
Accept: application/json

POST /cargo | stash
{
    "owner": "$captain",
    "items": ["bobble-headed geisha dolls"]
}

PROCESSOR stash ```
vars.cargoId = json.id;
```
"#;

/// Helper to create a temporary request file
fn create_temp_pie_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("cargo.pie");
    fs::write(&file_path, content).expect("Failed to write test file");
    (temp_dir, file_path)
}

#[test]
fn test_file_to_request_workflow() {
    let (_temp_dir, path) = create_temp_pie_file(CARGO_FILE);
    let source = read_source(&path).unwrap();
    let file = parse(&source).unwrap();

    let context = RequestContext::create(&file, 13).unwrap();
    let request = build_request_with(&context, &PieConfig::default()).unwrap();

    assert_eq!(request.method, HttpMethod::GET);
    assert_eq!(request.url, "https://api.serenity.co/crew/mal%20reynolds");
    assert_eq!(request.header("authorization"), Some("Bearer shiny"));
    assert_eq!(request.header("accept"), Some("application/json"));
    assert_eq!(request.header("host"), None);
    assert!(request.header("user-agent").unwrap().starts_with("pie/"));
}

#[test]
fn test_json_body_workflow() {
    let file = parse(CARGO_FILE).unwrap();

    for line in 16..=20 {
        let context = RequestContext::create(&file, line).unwrap();
        let request = build_request_with(&context, &PieConfig::default()).unwrap();

        assert_eq!(request.method, HttpMethod::POST, "line {}", line);
        assert_eq!(request.content_type(), Some("application/json"));
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["owner"], "mal reynolds");
    }
}

#[test]
fn test_descriptor_serializes_for_http_client() {
    let file = parse(CARGO_FILE).unwrap();
    let context = RequestContext::create(&file, 13).unwrap();
    let request = build_request_with(&context, &PieConfig::default()).unwrap();

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["method"], "GET");
    assert_eq!(json["url"], "https://api.serenity.co/crew/mal%20reynolds");
    assert_eq!(json["body"], Value::Null);
}

#[test]
fn test_processor_workflow() {
    let file = parse(CARGO_FILE).unwrap();
    let context = RequestContext::create(&file, 16).unwrap();
    assert_eq!(context.processor().unwrap().name, "stash");

    let mut response = HttpResponse::new(201, "Created");
    response.add_header("Content-Type", "application/json");
    response.set_body(r#"{"id": 42}"#);

    let processor = ResponseProcessor::new(
        |source: &str, input: &mut ProcessorInput| -> Result<(), ProcessorError> {
            assert_eq!(source, "vars.cargoId = json.id;");
            let id = input
                .json
                .as_ref()
                .map(|json| json["id"].clone())
                .unwrap_or(Value::Null);
            input.vars.insert("cargoId".to_string(), id);
            Ok(())
        },
    );

    let changed = processor.process(&context, &response).unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed["cargoId"], json!(42));
}

#[test]
fn test_line_outside_requests() {
    let file = parse(CARGO_FILE).unwrap();
    let context = RequestContext::create(&file, 15).unwrap();

    assert!(!context.has_request());
    assert_eq!(
        build_request_with(&context, &PieConfig::default()).unwrap_err(),
        BuildError::Resolve(ResolveError::NoRequest { line: 15 })
    );
}

#[test]
fn test_staging_without_host_value() {
    let source = CARGO_FILE.replace("$ENV = \"prod\"", "$ENV = \"qa\"");
    let file = parse(&source).unwrap();
    let context = RequestContext::create(&file, 13).unwrap();

    assert_eq!(
        build_request_with(&context, &PieConfig::default()).unwrap_err(),
        BuildError::Resolve(ResolveError::NoHost)
    );
}

#[test]
#[serial]
fn test_settings_drive_default_headers() {
    load_config(Some(json!({
        "pie": {
            "defaultHeaders": {
                "User-Agent": "firefly/2517",
                "X-Ship": "serenity"
            }
        }
    })))
    .unwrap();

    let file = parse(CARGO_FILE).unwrap();
    let context = RequestContext::create(&file, 13).unwrap();
    let request = build_request(&context).unwrap();

    assert_eq!(request.header("user-agent"), Some("firefly/2517"));
    assert_eq!(request.header("x-ship"), Some("serenity"));

    reset_config();
}
