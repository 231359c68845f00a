use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_request_bytes);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Classification
        .route("/predict", post(handlers::predict).layer(upload_limit))
        // Analytics
        .route("/dashboard-data", get(handlers::dashboard_data))
        .route("/analytics/top", get(handlers::top_categories))
        .route("/analytics/daily", get(handlers::daily_counts))
        .route("/analytics/heatmap", get(handlers::daily_heatmap))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// CORS policy for the browser front end
///
/// `*` allows any origin; anything else must be a single valid origin.
pub fn cors_layer(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origin.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }

    let origin = HeaderValue::from_str(allowed_origin.trim().trim_end_matches('/'))?;
    Ok(layer.allow_origin(origin))
}
