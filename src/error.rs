// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use utoipa::ToSchema;

use crate::{lifecycle::LifecycleError, store::StoreError};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username, stale event snapshot)
    Conflict(String),

    // 422 Unprocessable Entity: well-formed request refused by a lifecycle rule
    Rejected(String, Option<serde_json::Value>),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[schema(value_type = Option<Object>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::Rejected(msg, details) => (StatusCode::UNPROCESSABLE_ENTITY, msg, details),
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound("Event not found".to_string()),
            StoreError::Conflict { .. } => {
                tracing::warn!("{}", err);
                AppError::Conflict(
                    "The event was changed by someone else. Reload and try again.".to_string(),
                )
            }
            StoreError::DuplicateResponse { .. } => {
                AppError::Conflict("You have already submitted this exam.".to_string())
            }
            StoreError::Corrupt { .. } | StoreError::Database(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::InvalidInput(_)
            | LifecycleError::InvalidQuestion { .. }
            | LifecycleError::UnknownSubject(_) => AppError::BadRequest(message),
            LifecycleError::NotAccepting(status) => AppError::Rejected(
                message,
                Some(json!({ "status": status })),
            ),
            LifecycleError::Incomplete(shortfalls) => AppError::Rejected(
                message,
                Some(json!({ "incomplete_subjects": shortfalls })),
            ),
            LifecycleError::AlreadyPublished => AppError::Rejected(message, None),
        }
    }
}
