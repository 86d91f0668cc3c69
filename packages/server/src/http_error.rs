//! HTTP error handling for the board API
//!
//! Every failing endpoint answers with the same JSON body:
//! `{ "message": ..., "code": ..., "details"?: ... }`. The status code is
//! derived from `code`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use boardspace_core::services::BoardServiceError;
use serde::{Deserialize, Serialize};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    /// Status code for this error's `code`
    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "BOARD_NOT_FOUND" | "PARENT_NOT_FOUND" | "INVALID_BOARD_ID" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "INVALID_INPUT" | "SELF_MOVE" | "CYCLE_DETECTED"
            | "DEPTH_EXCEEDED" | "MAX_DEPTH_EXCEEDED" | "FORBIDDEN_PARENT_EDIT" => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<BoardServiceError> for HttpError {
    fn from(err: BoardServiceError) -> Self {
        let code = match &err {
            BoardServiceError::NotFound { .. } => "BOARD_NOT_FOUND",
            BoardServiceError::ParentNotFound { .. } => "PARENT_NOT_FOUND",
            BoardServiceError::SelfMove { .. } => "SELF_MOVE",
            BoardServiceError::CycleDetected { .. } => "CYCLE_DETECTED",
            BoardServiceError::DepthExceeded { .. } => "DEPTH_EXCEEDED",
            BoardServiceError::MaxHierarchyDepthExceeded { .. } => "MAX_DEPTH_EXCEEDED",
            BoardServiceError::ForbiddenDirectParentEdit { .. } => "FORBIDDEN_PARENT_EDIT",
            BoardServiceError::ValidationFailed(_) => "VALIDATION_ERROR",
            BoardServiceError::StoreFault(db_err) => {
                tracing::error!("Board store fault: {}", db_err);
                return HttpError::with_details(
                    "Internal server error",
                    "DATABASE_ERROR",
                    db_err.to_string(),
                );
            }
        };

        HttpError::new(err.to_string(), code)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::with_details("Invalid request body", "INVALID_INPUT", rejection.body_text())
    }
}
