use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use prodex_core::error::AppError;

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            AppError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    message: None,
                },
            ),
            err => {
                tracing::error!(error = %err, "Error parsing product");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Failed to parse product".to_string(),
                        message: Some(err.to_string()),
                    },
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
