// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{
    services::{attempts::AttemptError, quizzes::QuizError},
    store::StoreError,
};

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

    // 404 Not Found (also used when the caller does not own the resource)
    NotFound(String),

    // 409 Conflict (e.g., duplicate username, second quiz attempt)
    Conflict(String),

    // 502 Bad Gateway: the AI service or document parser failed
    UpstreamFailure(String),
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
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::UpstreamFailure(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "The AI service could not complete the request. Please try again.".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => AppError::Conflict(format!("{} already exists", what)),
            StoreError::Database(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::Extraction(e) => AppError::BadRequest(e.to_string()),
            QuizError::Generation(e) => AppError::UpstreamFailure(e.to_string()),
            QuizError::NotFound => AppError::NotFound("Quiz not found".to_string()),
            QuizError::AlreadyAttempted => {
                AppError::Conflict("You have already completed this quiz".to_string())
            }
            QuizError::CodeSpaceExhausted => {
                AppError::InternalServerError("Could not allocate a unique quiz code".to_string())
            }
            QuizError::Store(e) => e.into(),
        }
    }
}

impl From<AttemptError> for AppError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::InvalidSubmission(msg) => AppError::BadRequest(msg),
            AttemptError::QuizUnavailable => {
                AppError::NotFound("Quiz not found or not available".to_string())
            }
            AttemptError::DuplicateSubmission => {
                AppError::Conflict("You have already completed this quiz".to_string())
            }
            AttemptError::NotFound => {
                AppError::NotFound("Attempt not found or not authorized".to_string())
            }
            AttemptError::Analysis(e) => AppError::UpstreamFailure(e.to_string()),
            AttemptError::Store(e) => e.into(),
        }
    }
}
