//! HTTP route tests (in-process, no socket)

use aero_common::{
    ComplianceRecorder, IntentClassifier, LoadedConfig, MemoryComplianceLog, PolicyMediator,
    SafetyConfig, TutorConfig,
};
use aerotutord::{router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tower::ServiceExt;

fn test_state(log: Arc<MemoryComplianceLog>) -> Arc<AppState> {
    let mediator = PolicyMediator::new(IntentClassifier::new(&SafetyConfig::default()).unwrap())
        .with_compliance(ComplianceRecorder::new(log));
    Arc::new(AppState::new(
        mediator,
        LoadedConfig::trusted(TutorConfig::default()),
    ))
}

async fn send(state: Arc<AppState>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn ask_conceptual() {
    let log = Arc::new(MemoryComplianceLog::new());
    let (status, body) = send(
        test_state(log.clone()),
        "POST",
        "/v1/ask",
        Some(json!({
            "question": "How does the main AC bus stay powered if one generator fails?",
            "system_focus": "electrical"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_redirected"], false);
    assert_eq!(body["system_focus"], "electrical");
    assert_eq!(body["classification"]["category"], "conceptual");
    assert!(body["answer"].as_str().unwrap().contains("educational and training purposes only"));
    assert!(log.is_empty());
}

#[tokio::test]
async fn ask_procedural_is_redirected() {
    let log = Arc::new(MemoryComplianceLog::new());
    let (status, body) = send(
        test_state(log.clone()),
        "POST",
        "/v1/ask",
        Some(json!({
            "question": "What steps should I follow to replace the generator?",
            "system_focus": "electrical"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_redirected"], true);
    assert_eq!(body["classification"]["category"], "procedural");
    let reasons: Vec<&str> = body["classification"]["reasons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert!(reasons.contains(&"blocked_verbs:replace"));
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn unknown_focus_is_rejected() {
    let (status, _) = send(
        test_state(Arc::new(MemoryComplianceLog::new())),
        "POST",
        "/v1/ask",
        Some(json!({"question": "Why?", "system_focus": "pneumatic"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn classify_route() {
    let log = Arc::new(MemoryComplianceLog::new());
    let (status, body) = send(
        test_state(log.clone()),
        "POST",
        "/v1/classify",
        Some(json!({"question": "Should I bleed the brakes?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "ambiguous");
    assert_eq!(body["reasons"], json!(["ambiguous_intent"]));
    // Classification alone is not a redirect
    assert!(log.is_empty());
}

#[tokio::test]
async fn health_route() {
    let (status, body) = send(
        test_state(Arc::new(MemoryComplianceLog::new())),
        "GET",
        "/v1/health",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["classifier_mode"], "normal");
    assert_eq!(body["documents"], 0);
    assert_eq!(body["audit_enabled"], true);
}

#[tokio::test]
async fn reindex_swaps_in_new_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("electrical");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("bus.md"), "Each generator powers its own AC bus.").unwrap();

    let mut config = TutorConfig::default();
    config.corpus.paths = vec![dir.path().to_path_buf()];
    let mediator = PolicyMediator::new(IntentClassifier::new(&config.safety).unwrap());
    let state = Arc::new(AppState::new(mediator, LoadedConfig::trusted(config)));

    let (status, body) = send(state.clone(), "POST", "/v1/corpus/reindex", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text_documents"], 1);

    let (_, health) = send(state, "GET", "/v1/health", None).await;
    assert_eq!(health["documents"], 1);
}
