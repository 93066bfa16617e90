//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use indication_mapper_core::MappingError;
use indication_mapper_llm::{LlmError, ProgramError};
use serde_json::json;

const PROCESSING_ERROR: &str = "Error processing request";
const INTERNAL_ERROR: &str = "Internal error";

/// Error returned by request handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg,
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                INTERNAL_ERROR.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<MappingError> for ApiError {
    fn from(e: MappingError) -> Self {
        match e {
            MappingError::Validation(msg) => ApiError::BadRequest(msg),
            MappingError::NotFound(msg) => ApiError::NotFound(msg),
            MappingError::UpstreamFetch(_) | MappingError::MalformedDate(_) => {
                tracing::error!("Mapping processing error: {:?}", e);
                ApiError::BadRequest(PROCESSING_ERROR.into())
            }
            MappingError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ProgramError> for ApiError {
    fn from(e: ProgramError) -> Self {
        match e {
            ProgramError::InvalidDrugName(_) => ApiError::BadRequest(e.to_string()),
            ProgramError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ProgramError::Io(_) | ProgramError::Json(_) => {
                tracing::error!("Program inference error: {:?}", e);
                ApiError::BadRequest(format!("Failed to parse program information: {}", e))
            }
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        tracing::error!("Generation error: {:?}", e);
        ApiError::BadRequest(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Blocking task failed: {}", e))
    }
}
