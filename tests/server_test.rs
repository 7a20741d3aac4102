use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use emotion_classifier::server::router;
use emotion_classifier::{AnalysisContext, AppState, CategorySet, ClassifierError, EmotionOracle};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const EMOTIONS: [&str; 7] = ["anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise"];

enum Mode {
    Joyful,
    Broken,
    Panicking,
}

struct StubOracle {
    categories: CategorySet,
    mode: Mode,
    calls: AtomicUsize,
}

impl EmotionOracle for StubOracle {
    fn categories(&self) -> &CategorySet {
        &self.categories
    }

    fn classify(&self, _text: &str) -> Result<Vec<f32>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Mode::Joyful => Ok(vec![0.1, 0.01, 0.02, 5.0, 0.3, 0.05, 0.1]),
            Mode::Broken => Err(ClassifierError::ModelError("Failed to run model: bad input".into())),
            Mode::Panicking => panic!("index out of bounds"),
        }
    }
}

fn app(mode: Mode) -> (Router, Arc<StubOracle>) {
    let oracle = Arc::new(StubOracle {
        categories: CategorySet::new(EMOTIONS).unwrap(),
        mode,
        calls: AtomicUsize::new(0),
    });
    let state = AppState::new(AnalysisContext::new(oracle.clone()));
    (router(state), oracle)
}

fn analyze_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/emotion/analyze")
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app(Mode::Joyful);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, json!({ "status": "Emotion service running ✅" }));
}

#[tokio::test]
async fn test_analyze_success() {
    let (app, oracle) = app(Mode::Joyful);
    let payload = json!({ "text": "I am so happy today!" }).to_string();

    let response = app.oneshot(analyze_request(payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["label"], "Joy");

    let scores = body["scores"].as_object().expect("scores is an object");
    assert_eq!(scores.len(), 7);
    for name in ["Anger", "Disgust", "Fear", "Joy", "Neutral", "Sadness", "Surprise"] {
        assert!(scores.contains_key(name), "missing {}", name);
    }
    let total: f64 = scores.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-6);
    let joy = scores["Joy"].as_f64().unwrap();
    assert!(scores.values().all(|v| v.as_f64().unwrap() <= joy));
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_blank_text_is_bad_request() {
    let (app, oracle) = app(Mode::Joyful);
    let payload = json!({ "text": "   " }).to_string();

    let response = app.oneshot(analyze_request(payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "detail": "Text is required" }));
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_model_failure_is_server_error() {
    let (app, oracle) = app(Mode::Broken);
    let payload = json!({ "text": "whatever" }).to_string();

    let response = app.oneshot(analyze_request(payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Emotion analysis failed: "), "got {}", detail);
    assert!(detail.contains("bad input"));
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_model_panic_is_server_error() {
    let (app, oracle) = app(Mode::Panicking);
    let payload = json!({ "text": "whatever" }).to_string();

    let response = app.oneshot(analyze_request(payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Emotion analysis failed: "));
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_body_is_unprocessable() {
    for payload in [r#"{"text": 42}"#, r#"{"message": "hi"}"#, "not json"] {
        let (app, oracle) = app(Mode::Joyful);
        let response = app.oneshot(analyze_request(payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "payload {}", payload);
        let body = json_body(response).await;
        assert!(body["detail"].is_string());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_body_without_content_type_is_read_as_json() {
    let (app, oracle) = app(Mode::Joyful);
    let request = Request::builder()
        .method("POST")
        .uri("/api/emotion/analyze")
        .body(Body::from(json!({ "text": "I am so happy today!" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["label"], "Joy");
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_json_content_type_is_unprocessable() {
    let (app, oracle) = app(Mode::Joyful);
    let request = Request::builder()
        .method("POST")
        .uri("/api/emotion/analyze")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from(json!({ "text": "hello" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["detail"].is_string());
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = app(Mode::Joyful);
    let response = app
        .oneshot(Request::builder().uri("/api/emotion/logs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
