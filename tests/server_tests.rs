//! HTTP surface: request validation, cache interplay, health and CORS

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::Router;
use kodegen_tools_authdetect::detector::{
    AuthComponent, ComponentDetails, ComponentType, DetectionMethod, DetectionResult, Detector,
};
use kodegen_tools_authdetect::server::{SERVICE_NAME, router};
use kodegen_tools_authdetect::AuthDetectService;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, Arc<AuthDetectService>) {
    let config = common::test_config();
    let detector = Detector::new(&config, None);
    let service = Arc::new(AuthDetectService::with_detector(config.clone(), detector));
    (router(Arc::clone(&service), &config), service)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(body: &str) -> Request<Body> {
    Request::post("/detect")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn seeded_result(url: &str) -> DetectionResult {
    DetectionResult::detected(
        url,
        vec![AuthComponent::new(ComponentType::Traditional, ComponentDetails::default())
            .with_snippet("<form></form>")],
        DetectionMethod::Ai,
    )
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (app, service) = app();
    let (status, body) = send(app, post_json("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(service.pool().launch_count(), 0);
}

#[tokio::test]
async fn test_missing_url_is_rejected() {
    let (app, _service) = app();
    let (status, body) = send(app.clone(), post_json("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required");

    let (status, body) = send(app, post_json(r#"{"url":"   "}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required");
}

#[tokio::test]
async fn test_invalid_url_is_rejected_without_browser() {
    let (app, service) = app();
    let (status, body) = send(app, post_json(r#"{"url":"ftp://example.com"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid URL"));
    assert_eq!(service.pool().launch_count(), 0);
}

#[tokio::test]
async fn test_cached_result_is_served_without_browser() {
    let (app, service) = app();
    assert!(service.cache().set("https://example.com/login", &seeded_result("https://example.com/login")));

    let (status, body) = send(
        app,
        post_json(r#"{"url":"https://www.example.com/login/?utm_campaign=spring"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["found"], true);
    assert_eq!(body["cached"], true);
    assert_eq!(body["detectionMethod"], "ai");
    assert_eq!(body["components"][0]["type"], "traditional");
    assert_eq!(body["components"][0]["snippet"], "<form></form>");
    assert_eq!(service.pool().launch_count(), 0);
}

#[tokio::test]
async fn test_health_probe() {
    let (app, _service) = app();
    let (status, body) = send(app, Request::get("/detect").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], SERVICE_NAME);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body.get("cache").is_none());
}

#[tokio::test]
async fn test_health_probe_with_stats() {
    let (app, service) = app();
    service.cache().set("https://a.test/", &seeded_result("https://a.test/"));
    service.cache().get("https://a.test/");

    let (status, body) = send(
        app,
        Request::get("/detect?stats=true").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"]["size"], 1);
    assert_eq!(body["cache"]["hits"], 1);
    assert_eq!(body["browser"]["healthy"], false);
    assert_eq!(body["browser"]["initializing"], false);
    assert_eq!(body["browser"]["activeContexts"], 0);
}

#[tokio::test]
async fn test_delete_invalidates_one_or_all() {
    let (app, service) = app();
    service.cache().set("https://a.test/x", &seeded_result("https://a.test/x"));
    service.cache().set("https://b.test/", &seeded_result("https://b.test/"));

    let (status, body) = send(
        app.clone(),
        Request::delete("/detect?url=https%3A%2F%2Fa.test%2Fx").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
    assert_eq!(service.cache().len(), 1);

    let (_, body) = send(
        app.clone(),
        Request::delete("/detect?url=https%3A%2F%2Fa.test%2Fx").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(body["deleted"], false);

    let (status, body) = send(app, Request::delete("/detect").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], true);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let (app, _service) = app();
    let response = app
        .oneshot(
            Request::options("/detect")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("POST") && methods.contains("DELETE"));
}

#[tokio::test]
async fn test_cors_omits_headers_for_unknown_origin() {
    let (app, _service) = app();
    let response = app
        .oneshot(
            Request::get("/detect")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
