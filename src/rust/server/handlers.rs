//! Request handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::analysis::{AnalysisError, EmotionRequest, EmotionResult};

/// Health check body
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// GET /
pub async fn root(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.status_message.to_string(),
    })
}

/// Decodes the analyze body.
///
/// A missing content type is read as JSON; any other non-JSON media type is rejected.
pub fn parse_request(headers: &HeaderMap, body: &[u8]) -> Result<EmotionRequest, ApiError> {
    if let Some(value) = headers.get(CONTENT_TYPE) {
        let is_json = value
            .to_str()
            .map(|v| {
                let mime = v.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
            })
            .unwrap_or(false);
        if !is_json {
            return Err(ApiError::Unprocessable(
                "Expected request with `Content-Type: application/json`".to_string(),
            ));
        }
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::Unprocessable(format!("Failed to parse the request body: {}", e)))
}

/// POST /api/emotion/analyze
///
/// Inference is CPU-bound, so the pipeline runs on the blocking pool.
pub async fn analyze_emotion(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EmotionResult>, ApiError> {
    let request = parse_request(&headers, &body).map_err(|err| {
        log::warn!("Rejected analyze request body: {}", err);
        err
    })?;

    let context = state.analysis.clone();
    let outcome = tokio::task::spawn_blocking(move || context.analyze(&request.text))
        .await
        .unwrap_or_else(|e| Err(AnalysisError::Oracle(format!("inference task failed: {}", e))));

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(err @ AnalysisError::Validation(_)) => Err(err.into()),
        Err(err) => {
            log::error!("{}", err);
            Err(err.into())
        }
    }
}
