//! HttpClassifier against a local classifier stand-in

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use civic_core::IssueCategory;
use civic_service::{Classifier, ClassifierError, HttpClassifier};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn echo_analyze(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "trust_score": 64.5,
        "explanation": {
            "issue_type": params.get("issue_type"),
            "content_type": content_type,
            "bytes": body.len(),
        }
    }))
}

fn classifier(base: &str) -> HttpClassifier {
    HttpClassifier::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_posts_image_with_category() {
    let base = spawn(Router::new().route("/analyze", post(echo_analyze))).await;

    let result = classifier(&base)
        .classify(b"\x89PNGdata", IssueCategory::WaterLeak)
        .await
        .unwrap();

    assert_eq!(result.trust_score.value(), 64.5);
    let explanation = result.explanation.unwrap();
    assert_eq!(explanation["issue_type"], "water_leak");
    assert_eq!(explanation["content_type"], "application/octet-stream");
    assert_eq!(explanation["bytes"], 8);
}

#[tokio::test]
async fn test_error_status() {
    let base = spawn(Router::new().route(
        "/analyze",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
    ))
    .await;

    let err = classifier(&base)
        .classify(b"img", IssueCategory::Fire)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClassifierError::Status {
            status: 500,
            body: "model not loaded".to_string()
        }
    );
}

#[tokio::test]
async fn test_contract_violation() {
    let base = spawn(Router::new().route(
        "/analyze",
        post(|| async { Json(json!({ "trust_score": 140 })) }),
    ))
    .await;

    let err = classifier(&base)
        .classify(b"img", IssueCategory::Fire)
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifierError::Contract(_)));
}

#[tokio::test]
async fn test_unreachable() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = classifier(&base)
        .classify(b"img", IssueCategory::Fire)
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifierError::Transport(_)));
}
