use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use spimex_sdk::SpimexError;

/// Unified error type that renders as a JSON `{"error": "..."}` response
/// with an appropriate HTTP status code.
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SpimexError> for AppError {
    fn from(e: SpimexError) -> Self {
        let message = e.to_string();
        match e.root() {
            SpimexError::NotFound(_) | SpimexError::ReportNotFound { .. } => {
                AppError::not_found(message)
            }
            SpimexError::InvalidArgument(_) => AppError::bad_request(message),
            SpimexError::Layout(_) | SpimexError::Decode(_) | SpimexError::Network(_) => {
                AppError::bad_gateway(message)
            }
            _ => {
                tracing::error!(error = %message, "request failed");
                AppError::internal(message)
            }
        }
    }
}
