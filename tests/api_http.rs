// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /sessions (fixture analyzers, complete and failed)
// - POST /fuse (ok + 422)
// - GET /weights
// - GET /metrics

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use emotion_fusion::config::AppConfig;

const BODY_LIMIT: usize = 1024 * 1024;

/// Same Router the binary builds, with artifacts in a temp dir.
fn test_app(artifacts: &std::path::Path) -> Router {
    let mut cfg = AppConfig::default();
    cfg.artifacts.dir = artifacts.to_path_buf();
    emotion_fusion::app_with_config(&cfg).expect("build app")
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn health_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, bytes) = send(test_app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).unwrap().trim(), "ok");
}

#[tokio::test]
async fn sessions_returns_complete_report() {
    let dir = tempfile::tempdir().unwrap();
    let req = post_json("/sessions", json!({ "video": { "path": "rec.webm" } }));
    let (status, bytes) = send(test_app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_slice(&bytes).expect("report json");
    assert_eq!(v["status"], json!("complete"));
    assert_eq!(v["dominant_emotion"], json!("happy"));
    for key in ["session_id", "video", "speech", "text", "fused", "confidence"] {
        assert!(!v[key].is_null(), "missing '{key}'");
    }
    // fixture distributions with the 40/30/30 default policy
    let happy = v["fused"]["happy"].as_f64().unwrap();
    assert!((happy - (0.4 * 80.0 + 0.3 * 60.0 + 0.3 * 50.0)).abs() < 1e-9);
    assert!(v["visualization"].as_str().unwrap().ends_with("visualization.svg"));
}

#[tokio::test]
async fn sessions_rejects_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let req = post_json("/sessions", json!({ "audio": { "url": "http://x/a.wav" } }));
    let (status, _) = send(test_app(dir.path()), req).await;
    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn fuse_combines_posted_distributions() {
    let dir = tempfile::tempdir().unwrap();
    let req = post_json(
        "/fuse",
        json!({
            "video": { "angry": 90, "neutral": 10 },
            "text":  { "angry": 20, "happy": 80 }
        }),
    );
    let (status, bytes) = send(test_app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["dominant_emotion"], json!("angry"));
    assert_eq!(v["confidence"]["audio"], json!(0.0));
    let angry = v["fused"]["angry"].as_f64().unwrap();
    assert!((angry - (0.4 * 90.0 + 0.3 * 20.0)).abs() < 1e-9);
}

#[tokio::test]
async fn fuse_without_data_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let req = post_json("/fuse", json!({ "video": {}, "audio": null }));
    let (status, bytes) = send(test_app(dir.path()), req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert!(v["error"].as_str().unwrap().contains("fusion"), "{v}");
}

#[tokio::test]
async fn weights_reports_effective_policy() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::get("/weights").body(Body::empty()).unwrap();
    let (status, bytes) = send(test_app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v, json!({ "video": 0.4, "audio": 0.3, "text": 0.3 }));
}

#[tokio::test]
async fn metrics_exposes_session_series() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let req = post_json("/sessions", json!({ "video": { "path": "rec.webm" } }));
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::get("/metrics").body(Body::empty()).unwrap();
    let (status, bytes) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    for needle in ["sessions_total", "session_duration_ms", "fusion_weight"] {
        assert!(text.contains(needle), "missing series {needle}");
    }
}
