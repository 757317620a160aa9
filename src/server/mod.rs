//! HTTP adapter
//!
//! `POST /detect` runs a detection, `GET /detect` is the health probe and
//! `DELETE /detect` invalidates cache entries. CORS is restricted to the
//! configured origin list.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::AuthDetectConfig;
use crate::service::AuthDetectService;

pub const SERVICE_NAME: &str = "auth-detect";

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub stats: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub url: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn cors_layer(config: &AuthDetectConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

pub fn router(service: Arc<AuthDetectService>, config: &AuthDetectConfig) -> Router {
    Router::new()
        .route("/detect", get(health).post(detect).delete(invalidate))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn detect(
    State(service): State<Arc<AuthDetectService>>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let Some(url) = request.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "URL is required");
    };

    match service.detect(&url).await {
        Ok(response) if response.result.success => (StatusCode::OK, Json(response)).into_response(),
        Ok(response) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "url": response.result.url,
                "error": response.result.error,
            })),
        )
            .into_response(),
        Err(e) if e.is_client_error() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn health(
    State(service): State<Arc<AuthDetectService>>,
    Query(query): Query<HealthQuery>,
) -> Json<Value> {
    let mut body = json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    });
    if query.stats.unwrap_or(false) {
        body["cache"] = json!(service.cache().stats());
        body["browser"] = json!(service.pool().health_check());
    }
    Json(body)
}

async fn invalidate(
    State(service): State<Arc<AuthDetectService>>,
    Query(query): Query<InvalidateQuery>,
) -> Json<Value> {
    match query.url.filter(|u| !u.trim().is_empty()) {
        Some(url) => Json(json!({ "deleted": service.cache().invalidate(&url) })),
        None => {
            service.cache().clear();
            Json(json!({ "cleared": true }))
        }
    }
}
