//! API error types and JSON response formatting.

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::Error;
use crate::validate::ValidationError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details in the response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Request body or query could not be understood.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// No identity header on a request that needs one.
    pub fn unauthenticated(header: &str) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            format!("Missing identity header '{}'", header),
        )
        .with_details(serde_json::json!({ "header": header }))
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log server errors at error level, client errors at debug level
        if self.status.is_server_error() {
            error!(
                status = %self.status.as_u16(),
                code = %self.code,
                message = %self.message,
                "server error response"
            );
        } else if self.status.is_client_error() {
            debug!(
                status = %self.status.as_u16(),
                code = %self.code,
                message = %self.message,
                "client error response"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::NotFound {
                asset_type,
                asset_id,
                version,
            } => Self::new(StatusCode::NOT_FOUND, "ASSET_NOT_FOUND", message).with_details(
                serde_json::json!({ "type": asset_type, "id": asset_id, "version": version }),
            ),
            Error::Validation(ValidationError::MissingField { field }) => {
                Self::new(StatusCode::BAD_REQUEST, "MISSING_FIELD", message)
                    .with_details(serde_json::json!({ "field": field }))
            }
            Error::Validation(ValidationError::InvalidValue { field, value }) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_VALUE", message)
                    .with_details(serde_json::json!({ "field": field, "value": value }))
            }
            Error::ForbiddenType(asset_type) => {
                Self::new(StatusCode::FORBIDDEN, "FORBIDDEN_TYPE", message)
                    .with_details(serde_json::json!({ "type": asset_type }))
            }
            Error::AlreadyExists {
                asset_type,
                asset_id,
            } => Self::new(StatusCode::CONFLICT, "ASSET_EXISTS", message)
                .with_details(serde_json::json!({ "type": asset_type, "id": asset_id })),
            Error::Conflict {
                asset_type,
                asset_id,
                expected,
                actual,
            } => Self::new(StatusCode::CONFLICT, "VERSION_CONFLICT", message).with_details(
                serde_json::json!({
                    "type": asset_type,
                    "id": asset_id,
                    "expected": expected,
                    "actual": actual,
                }),
            ),
            Error::EmptyEdit => Self::new(StatusCode::BAD_REQUEST, "EMPTY_EDIT", message),
            Error::Ledger(crate::ledger::LedgerError::InvalidKey(_)) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_KEY", message)
            }
            Error::Ledger(_) => Self::internal(message),
        }
    }
}
