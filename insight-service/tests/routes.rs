use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client, Request, StatusCode};
use insight_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, GenerationRequest, TextGenerator,
};
use insight_service::{Analyzer, serve_on};
use serde_json::{Value, json};

struct StaticGenerator {
    metadata: AdapterMetadata,
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl StaticGenerator {
    fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            metadata: AdapterMetadata::new("test", "static"),
            reply: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(reason: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            metadata: AdapterMetadata::new("test", "static"),
            reply: Err(reason.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn generate(&self, request: GenerationRequest) -> AdapterResult<String> {
        self.prompts.lock().unwrap().push(request.prompt().to_owned());
        self.reply
            .clone()
            .map_err(|reason| AdapterError::Response { reason })
    }
}

async fn spawn_service(generator: Arc<StaticGenerator>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let analyzer = Analyzer::new(generator);
    tokio::spawn(async move {
        serve_on(listener, analyzer, std::future::pending())
            .await
            .unwrap();
    });
    addr
}

async fn post_raw(addr: SocketAddr, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::post(format!("http://{addr}{path}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();

    let response = Client::new().request(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(addr: SocketAddr, path: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(addr, path, &body.to_string()).await
}

#[tokio::test]
async fn analyze_event_returns_extracted_fields() {
    let generator = StaticGenerator::new(
        r#"Here you go:
{"timestamp_fields": ["ts"], "de_duplication_key": "event_id", "pii_fields": ["email"]}"#,
    );
    let addr = spawn_service(Arc::clone(&generator)).await;

    let event = json!({"event_id": "e1", "ts": "2024-01-01T00:00:00Z", "email": "x@y.z"});
    let (status, body) = post_json(addr, "/api/analyze-event/", &event).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"timestamp_fields": ["ts"], "de_duplication_key": "event_id", "pii_fields": ["email"]})
    );

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"event_id\": \"e1\""));
}

#[tokio::test]
async fn analyze_event_rejects_non_object() {
    let generator = StaticGenerator::new("{}");
    let addr = spawn_service(Arc::clone(&generator)).await;

    let (status, body) = post_json(addr, "/api/analyze-event/", &json!("not an object")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid JSON input"}));
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let addr = spawn_service(StaticGenerator::new("{}")).await;

    for path in [
        "/api/analyze-event/",
        "/api/suggest-dataset-name/",
        "/api/suggest-druid-rollups/",
    ] {
        let (status, body) = post_raw(addr, path, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body, json!({"error": "Invalid JSON input"}));
    }
}

#[tokio::test]
async fn analyze_event_with_empty_object() {
    let generator = StaticGenerator::new("I could not find anything.");
    let addr = spawn_service(Arc::clone(&generator)).await;

    let (status, body) = post_json(addr, "/api/analyze-event/", &json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(generator.prompts()[0].contains("**Event Data:**\n{}\n"));
}

#[tokio::test]
async fn dataset_name_falls_back_to_default() {
    let addr = spawn_service(StaticGenerator::new("names: user_events, clicks")).await;

    let (status, body) =
        post_json(addr, "/api/suggest-dataset-name/", &json!({"user": "u1"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"dataset_names": ["Default_Dataset"]}));
}

#[tokio::test]
async fn dataset_name_accepts_any_json_value() {
    let reply = r#"{"dataset_names": ["a", "b", "c", "d", "e"]}"#;
    let addr = spawn_service(StaticGenerator::new(reply)).await;

    let (status, body) = post_json(addr, "/api/suggest-dataset-name", &json!([1, 2, 3])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dataset_names"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn rollups_return_ingestion_spec() {
    let reply = r#"Sure.
{
  "rollup_suggestions": ["hourly_rollup", "daily_rollup"],
  "druid_ingestion_spec": {
    "type": "index",
    "spec": {
      "dataSchema": {
        "dataSource": "orders",
        "timestampSpec": {"column": "ts", "format": "auto"},
        "dimensionsSpec": {"dimensions": ["country"]},
        "metricsSpec": [{"type": "doubleSum", "name": "amount", "fieldName": "amount"}],
        "granularitySpec": {"type": "uniform", "segmentGranularity": "hour", "queryGranularity": "none"}
      },
      "ioConfig": {"type": "index", "inputSource": {"type": "inline", "data": []}, "inputFormat": {"type": "json"}},
      "tuningConfig": {"type": "index", "maxRowsInMemory": 100000, "maxRowsPerSegment": 5000000}
    }
  }
}"#;
    let addr = spawn_service(StaticGenerator::new(reply)).await;

    let event = json!({"ts": "2024-01-01T00:00:00Z", "country": "NL", "amount": 3.5});
    let (status, body) = post_json(addr, "/api/suggest-druid-rollups/", &event).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["rollup_suggestions"].is_array());
    let schema = &body["druid_ingestion_spec"]["spec"]["dataSchema"];
    for key in [
        "dataSource",
        "timestampSpec",
        "dimensionsSpec",
        "metricsSpec",
        "granularitySpec",
    ] {
        assert!(schema.get(key).is_some(), "missing {key}");
    }
    let spec = &body["druid_ingestion_spec"]["spec"];
    assert!(spec.get("ioConfig").is_some());
    assert!(spec.get("tuningConfig").is_some());
}

#[tokio::test]
async fn provider_failure_is_reported_with_ok_status() {
    let addr = spawn_service(StaticGenerator::failing("401 Unauthorized")).await;

    let (status, body) =
        post_json(addr, "/api/suggest-druid-rollups/", &json!({"a": 1})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"error": "adapter response error: 401 Unauthorized"})
    );
}

#[tokio::test]
async fn provider_failure_is_not_replaced_by_dataset_fallback() {
    let addr = spawn_service(StaticGenerator::failing("quota exceeded")).await;

    let (status, body) =
        post_json(addr, "/api/suggest-dataset-name/", &json!({"a": 1})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "adapter response error: quota exceeded"}));
}

#[tokio::test]
async fn health_reports_model() {
    let addr = spawn_service(StaticGenerator::new("{}")).await;

    let response = Client::new()
        .get(format!("http://{addr}/healthz").parse().unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok", "model": "static"}));
}
