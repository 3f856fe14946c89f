//! AppError -> HTTP response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pushbridge_core::AppError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl ApiError {
    /// 400: redelivering the same body cannot succeed.
    /// 503: engine side is down, redelivery may succeed later.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Engine(_) | AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match &self.0 {
            AppError::InvalidQueueName(_) => "InvalidQueueName",
            AppError::InvalidIdempotencyKey(_) => "InvalidIdempotencyKey",
            AppError::ResourceProvision { .. } => "ResourceProvisionError",
            AppError::Dispatch { .. } => "DispatchError",
            AppError::MalformedPayload(_) => "MalformedPayload",
            AppError::InvalidMessage(_) => "InvalidMessage",
            AppError::Engine(_) => "EngineError",
            AppError::Validation(_) => "ValidationError",
            AppError::Database(_) => "DatabaseError",
            AppError::Serialization(_) => "SerializationError",
            AppError::Config(_) => "ConfigError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "ok": false,
            "error": self.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
