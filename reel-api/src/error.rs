use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reel_core::BookingError;
use serde_json::json;

#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::InsufficientSeats { .. } => StatusCode::CONFLICT,
            BookingError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();
        let error_message = match self.0 {
            BookingError::InvariantViolation(msg) => {
                // Already reported as a defect where it was detected.
                tracing::error!("Refusing request after invariant violation: {}", msg);
                "Internal Server Error".to_string()
            }
            err @ BookingError::StorageUnavailable(_) => {
                tracing::warn!("Storage unavailable: {}", err);
                "Storage temporarily unavailable, please retry".to_string()
            }
            err => err.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(BookingError::validation("body", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError(BookingError::validation("id", rejection.body_text()))
    }
}
