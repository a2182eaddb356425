// error.rs — HTTP error mapping.
//
// The router's typed outcomes carry the interesting states (blocked,
// pending); what lands here is the residue: validation failures, unknown
// approvals, invalid transitions, and operational errors. Messages stay
// generic for 5xx so internals never leak to callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use sb_approvals::ApprovalError;
use sb_model::ModelError;
use sb_router::RouterError;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip)]
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        status_code: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message, StatusCode::BAD_REQUEST)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message, StatusCode::NOT_FOUND)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", message, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

impl From<ModelError> for ApiError {
    fn from(error: ModelError) -> Self {
        ApiError::bad_request(error.to_string())
    }
}

impl From<RouterError> for ApiError {
    fn from(error: RouterError) -> Self {
        match &error {
            RouterError::Approval(ApprovalError::NotFound { .. }) => {
                ApiError::not_found("Approval request not found")
            }
            RouterError::Approval(ApprovalError::InvalidTransition { .. }) => {
                ApiError::bad_request(error.to_string())
            }
            _ => {
                tracing::error!(error = %error, "request failed");
                ApiError::internal("internal error")
            }
        }
    }
}
