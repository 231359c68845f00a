use axum::{extract::State, http::StatusCode, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{CategoryCount, DailyHeatmap, DailyMatrix, Dashboard},
    services::{
        analytics::{DEFAULT_TOP_K, DEFAULT_WINDOW_DAYS},
        ClassificationOutcome,
    },
};

use super::extract::{ApiJson, ApiQuery};
use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Base64 image, optionally as a `data:<mime>;base64,` URL
    pub img: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub top: Option<usize>,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<u32>,
}

/// Decodes the `img` payload into raw image bytes
pub fn decode_image_payload(payload: &str) -> AppResult<Vec<u8>> {
    let encoded = match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    };
    let encoded: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    if encoded.is_empty() {
        return Err(AppError::InvalidImage("No image provided".to_string()));
    }

    STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| AppError::InvalidImage(format!("Image is not valid base64: {}", e)))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Classify an uploaded face image
pub async fn predict(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PredictRequest>,
) -> AppResult<Json<ClassificationOutcome>> {
    let payload = request
        .img
        .filter(|img| !img.trim().is_empty())
        .ok_or_else(|| AppError::InvalidImage("No image provided".to_string()))?;

    let bytes = decode_image_payload(&payload)?;
    let outcome = state.classification.classify(bytes).await?;
    Ok(Json(outcome))
}

/// Top categories plus the trailing daily matrix
pub async fn dashboard_data(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DashboardQuery>,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state
        .analytics
        .dashboard(
            params.top.unwrap_or(DEFAULT_TOP_K),
            params.days.unwrap_or(DEFAULT_WINDOW_DAYS),
        )
        .await?;
    Ok(Json(dashboard))
}

/// Most frequent categories over all time
pub async fn top_categories(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TopQuery>,
) -> AppResult<Json<Vec<CategoryCount>>> {
    let top = state
        .analytics
        .top_k(params.k.unwrap_or(DEFAULT_TOP_K))
        .await?;
    Ok(Json(top))
}

/// Per-day counts over the trailing window
pub async fn daily_counts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WindowQuery>,
) -> AppResult<Json<DailyMatrix>> {
    let matrix = state
        .analytics
        .daily_matrix(params.days.unwrap_or(DEFAULT_WINDOW_DAYS))
        .await?;
    Ok(Json(matrix))
}

/// Dense category × date table for heatmaps
pub async fn daily_heatmap(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WindowQuery>,
) -> AppResult<Json<DailyHeatmap>> {
    let heatmap = state
        .analytics
        .daily_heatmap(params.days.unwrap_or(DEFAULT_WINDOW_DAYS))
        .await?;
    Ok(Json(heatmap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        assert_eq!(decode_image_payload("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_data_url() {
        let bytes = decode_image_payload("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        assert_eq!(decode_image_payload("aGVs\nbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode_image_payload("***"),
            Err(AppError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_data_url() {
        assert!(matches!(
            decode_image_payload("data:image/png;base64,"),
            Err(AppError::InvalidImage(_))
        ));
    }
}
