// src/handlers/attempts.rs

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::attempt::SubmitAttemptRequest,
    services::attempts,
    state::AppState,
    utils::jwt::Claims,
};

/// Submits a student's answers for a quiz.
///
/// * Rejects a second submission for the same quiz with 409.
/// * Grades the answers against the stored answer key.
/// * Attaches an AI performance analysis and stores the attempt.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SubmitAttemptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid submission: {}", e.body_text())))?;

    let attempt = attempts::submit_attempt(
        state.store.as_ref(),
        state.llm.as_ref(),
        claims.user_id()?,
        req,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Lists the calling student's attempts, newest first.
pub async fn list_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = attempts::list_student_attempts(state.store.as_ref(), claims.user_id()?).await?;
    Ok(Json(attempts))
}

/// Returns one of the calling student's attempts with the quiz questions.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = attempts::get_attempt_report(state.store.as_ref(), claims.user_id()?, id).await?;
    Ok(Json(report))
}
