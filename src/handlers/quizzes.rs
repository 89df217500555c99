// src/handlers/quizzes.rs

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::GenerateQuizRequest,
    services::quizzes,
    state::AppState,
    utils::jwt::Claims,
};

/// Generates a quiz from an uploaded PDF.
/// Teacher only.
///
/// * Extracts the PDF text.
/// * Asks the AI service for `numQuestions` questions (default 5, clamped to 1..=25).
/// * Stores the quiz under a fresh quiz code and returns it with answers.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<GenerateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    req.validate()?;

    let teacher_id = claims.user_id()?;
    let quiz =
        quizzes::create_quiz_from_pdf(state.store.as_ref(), state.llm.as_ref(), teacher_id, req)
            .await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Lists the calling teacher's quizzes, newest first.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = quizzes::list_teacher_quizzes(state.store.as_ref(), claims.user_id()?).await?;
    Ok(Json(quizzes))
}

/// Returns one of the calling teacher's quizzes, answer key included.
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = quizzes::get_teacher_quiz(state.store.as_ref(), claims.user_id()?, id).await?;
    Ok(Json(quiz))
}

/// Lists every attempt on one of the calling teacher's quizzes with aggregates.
pub async fn get_quiz_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = quizzes::quiz_attempts_report(state.store.as_ref(), claims.user_id()?, id).await?;
    Ok(Json(report))
}

/// Opens a published quiz by code for a student.
///
/// The answer key is stripped. Students who already submitted get 409.
pub async fn get_quiz_by_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz =
        quizzes::fetch_quiz_for_student(state.store.as_ref(), claims.user_id()?, &code).await?;
    Ok(Json(quiz))
}
