//! `/metrics` with the recorder installed.
//!
//! The recorder is process-global, so this binary holds a single test.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bfhl_service::services::init_metrics;
use common::router;
use http_body_util::BodyExt;
use serde_json::json;
use tower::util::ServiceExt;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post_bfhl(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/bfhl")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn metrics_count_operations_by_outcome() {
    init_metrics().expect("Failed to initialize metrics");
    let app = router();

    let (status, _) = send(app.clone(), post_bfhl(json!({"lcm": [4, 6]}).to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(app.clone(), post_bfhl(json!({"hcf": []}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app.clone(), post_bfhl(json!({"factorial": 5}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, text) = send(
        app,
        Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert!(!text.contains("Metrics recorder not initialized"));
    assert!(text.contains("# TYPE bfhl_operations_total counter"));
    assert!(text.contains(r#"bfhl_operations_total{operation="lcm",outcome="success"} 1"#));
    assert!(text.contains(r#"bfhl_operations_total{operation="hcf",outcome="failure"} 1"#));
    assert!(text.contains(r#"bfhl_operations_total{operation="invalid",outcome="failure"} 1"#));
}
