//! Error to HTTP response mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use billet_db::{InvoiceError, ReferenceError};
use billet_shared::{AppError, FieldErrors};

const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
const INTERNAL_MESSAGE: &str = "the server encountered a problem and could not process your request";

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// Handler error; wraps the application taxonomy.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 404 for a path key that is not a number.
    #[must_use]
    pub fn not_found() -> Self {
        Self(AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))
    }

    /// 401 with `message`.
    #[must_use]
    pub fn unauthorized(message: &str) -> Self {
        Self(AppError::Unauthorized(message.to_string()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        Self(err.into())
    }
}

impl From<ReferenceError> for ApiError {
    fn from(err: ReferenceError) -> Self {
        Self(err.into())
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self(AppError::Validation(errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = err.error_code();

        if err.is_internal() {
            error!(error = %err, "Request failed");
        }

        let (message, fields) = match err {
            AppError::Validation(errors) => (
                "one or more fields are invalid".to_string(),
                Some(errors),
            ),
            AppError::NotFound(_) => (NOT_FOUND_MESSAGE.to_string(), None),
            AppError::Unauthorized(message) | AppError::Conflict(message) => (message, None),
            AppError::Timeout(_) | AppError::Database(_) | AppError::Internal(_) => {
                (INTERNAL_MESSAGE.to_string(), None)
            }
        };

        let body = ErrorResponse {
            error: code,
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
