//! Maps service errors onto HTTP responses.

use super::metrics;
use crate::service_error::ServiceError;
use crate::user::RegistrationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ServiceError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, self.to_string()),
            ServiceError::Forbidden => error_response(StatusCode::FORBIDDEN, self.to_string()),
            ServiceError::PhotoStorage(_) | ServiceError::Store(_) => {
                error!("{}", self);
                metrics::record_error(self.label(), "service");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        match self {
            RegistrationError::Invalid(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            RegistrationError::Store(err) => {
                error!("Registration failed: {:#}", err);
                metrics::record_error("store_error", "register");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}
