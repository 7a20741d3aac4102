//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::AnalysisError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Unusable input, e.g. blank text
    #[error("{0}")]
    BadRequest(String),

    /// The body is not a JSON object with a string `text` field
    #[error("{0}")]
    Unprocessable(String),

    /// The model call failed
    #[error("{0}")]
    Internal(String),
}

/// Error body, `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Validation(_) => ApiError::BadRequest(err.to_string()),
            AnalysisError::Oracle(_) => ApiError::Internal(err.to_string()),
        }
    }
}
