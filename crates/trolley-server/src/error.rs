//! API error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use trolley_core::error::TrolleyError;

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP-facing wrapper around the domain error type.
#[derive(Debug)]
pub struct ApiError(pub TrolleyError);

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            TrolleyError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            TrolleyError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            TrolleyError::Forbidden { message } => (StatusCode::FORBIDDEN, message),
            TrolleyError::Database(detail) | TrolleyError::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<TrolleyError> for ApiError {
    fn from(err: TrolleyError) -> Self {
        Self(err)
    }
}
