// src/services/attempts.rs

use std::collections::HashSet;

use crate::{
    models::attempt::{
        AttemptReport, AttemptSummary, NewAttempt, QuizAttempt, SubmitAttemptRequest,
    },
    services::{
        analyzer::{self, AnalysisError, AnalysisInput},
        grader,
        llm::LlmClient,
    },
    store::{AttemptStore, QuizStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("quiz does not exist or is not published")]
    QuizUnavailable,

    #[error("quiz already submitted by this student")]
    DuplicateSubmission,

    #[error("attempt not found")]
    NotFound,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        match err {
            // The unique (student, quiz) index lost a race to another submission.
            StoreError::Duplicate(_) => AttemptError::DuplicateSubmission,
            other => AttemptError::Store(other),
        }
    }
}

/// Grades, analyzes and stores a student's only attempt at a quiz.
///
/// Order: request validation, quiz lookup, prior-attempt check, grading,
/// analysis, insert. The insert is the authoritative duplicate guard.
pub async fn submit_attempt<S>(
    store: &S,
    llm: &dyn LlmClient,
    student_id: i64,
    request: SubmitAttemptRequest,
) -> Result<QuizAttempt, AttemptError>
where
    S: QuizStore + AttemptStore + ?Sized,
{
    let quiz_id = request
        .quiz_id
        .ok_or_else(|| AttemptError::InvalidSubmission("quizId is required".to_string()))?;
    let answers = request
        .answers
        .ok_or_else(|| AttemptError::InvalidSubmission("answers must be an array".to_string()))?;

    let mut seen = HashSet::new();
    if let Some(repeated) = answers.iter().find(|a| !seen.insert(a.question_id.as_str())) {
        return Err(AttemptError::InvalidSubmission(format!(
            "question '{}' is answered more than once",
            repeated.question_id
        )));
    }

    let quiz = store
        .find_quiz_by_id(quiz_id)
        .await?
        .filter(|q| q.published)
        .ok_or(AttemptError::QuizUnavailable)?;

    if store
        .find_attempt_by_student_and_quiz(student_id, quiz.id)
        .await?
        .is_some()
    {
        return Err(AttemptError::DuplicateSubmission);
    }

    let graded = grader::grade(&quiz.questions, &answers);

    let analysis = analyzer::analyze_attempt(
        llm,
        AnalysisInput {
            questions: &quiz.questions,
            graded: &graded,
            is_suspicious: request.is_suspicious,
            proctoring_events: &request.proctoring_events,
        },
    )
    .await?;

    let attempt = store
        .create_attempt(NewAttempt {
            student_id,
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            quiz_subject: quiz.subject.clone(),
            quiz_topic: quiz.topic.clone(),
            answers: graded.answers,
            score: graded.score,
            total_questions: graded.total_questions,
            percentage: graded.percentage,
            analysis,
            proctoring_events: request.proctoring_events,
            is_suspicious: request.is_suspicious,
        })
        .await?;

    tracing::info!(
        attempt_id = attempt.id,
        student_id,
        quiz_id = quiz.id,
        score = attempt.score,
        total = attempt.total_questions,
        "Quiz attempt submitted"
    );

    Ok(attempt)
}

/// A student's own attempt joined with the quiz questions.
pub async fn get_attempt_report<S>(
    store: &S,
    student_id: i64,
    attempt_id: i64,
) -> Result<AttemptReport, AttemptError>
where
    S: QuizStore + AttemptStore + ?Sized,
{
    let attempt = store
        .find_attempt_for_student(attempt_id, student_id)
        .await?
        .ok_or(AttemptError::NotFound)?;

    let questions = store
        .find_quiz_by_id(attempt.quiz_id)
        .await?
        .map(|quiz| quiz.questions.0)
        .unwrap_or_default();

    Ok(AttemptReport { attempt, questions })
}

pub async fn list_student_attempts<S>(
    store: &S,
    student_id: i64,
) -> Result<Vec<AttemptSummary>, AttemptError>
where
    S: AttemptStore + ?Sized,
{
    Ok(store.list_attempts_by_student(student_id).await?)
}
