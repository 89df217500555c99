// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use crate::models::{analysis::AttemptAnalysis, quiz::Question};

/// One answer as sent by the student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    /// `None` for an unanswered question.
    #[serde(default)]
    pub selected_option_id: Option<String>,
}

/// One graded answer, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question_id: String,
    pub selected_option_id: Option<String>,
    pub is_correct: bool,
}

/// Kinds of integrity signals the quiz page reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProctoringEventType {
    TabSwitch,
    WindowBlur,
    FullscreenExit,
    CopyAttempt,
    PasteAttempt,
    ContextMenu,
    #[serde(other)]
    Other,
}

impl ProctoringEventType {
    pub fn label(&self) -> &'static str {
        match self {
            ProctoringEventType::TabSwitch => "tab switch",
            ProctoringEventType::WindowBlur => "window lost focus",
            ProctoringEventType::FullscreenExit => "left fullscreen",
            ProctoringEventType::CopyAttempt => "copy attempt",
            ProctoringEventType::PasteAttempt => "paste attempt",
            ProctoringEventType::ContextMenu => "context menu opened",
            ProctoringEventType::Other => "other event",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctoringEvent {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: ProctoringEventType,
    #[serde(default)]
    pub description: String,
}

/// DTO for submitting a quiz attempt.
///
/// `quiz_id` and `answers` are optional at the serde level so that a
/// missing field is reported as an invalid submission rather than a
/// generic deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub quiz_id: Option<i64>,
    pub answers: Option<Vec<SubmittedAnswer>>,
    #[serde(default)]
    pub proctoring_events: Vec<ProctoringEvent>,
    #[serde(default)]
    pub is_suspicious: bool,
}

/// Represents the 'quiz_attempts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,

    // Captured at submission time.
    pub quiz_title: String,
    pub quiz_subject: Option<String>,
    pub quiz_topic: Option<String>,

    pub answers: Json<Vec<AnsweredQuestion>>,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,

    pub analysis: Json<AttemptAnalysis>,
    pub proctoring_events: Json<Vec<ProctoringEvent>>,
    pub is_suspicious: bool,
}

#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub student_id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub quiz_subject: Option<String>,
    pub quiz_topic: Option<String>,
    pub answers: Vec<AnsweredQuestion>,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub analysis: AttemptAnalysis,
    pub proctoring_events: Vec<ProctoringEvent>,
    pub is_suspicious: bool,
}

/// Row shape for a student's attempt history.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub quiz_subject: Option<String>,
    pub quiz_topic: Option<String>,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub is_suspicious: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<&QuizAttempt> for AttemptSummary {
    fn from(a: &QuizAttempt) -> Self {
        Self {
            id: a.id,
            quiz_id: a.quiz_id,
            quiz_title: a.quiz_title.clone(),
            quiz_subject: a.quiz_subject.clone(),
            quiz_topic: a.quiz_topic.clone(),
            score: a.score,
            total_questions: a.total_questions,
            percentage: a.percentage,
            is_suspicious: a.is_suspicious,
            submitted_at: a.submitted_at,
        }
    }
}

/// Attempt row joined with the student's username, for the owning teacher.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttemptEntry {
    pub id: i64,
    pub student_id: i64,
    pub student_username: String,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub is_suspicious: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// A student's own attempt plus the quiz questions it refers to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReport {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub questions: Vec<Question>,
}

/// Aggregate view of all attempts on one quiz.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptsReport {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub attempt_count: usize,
    pub average_percentage: f64,
    pub suspicious_count: usize,
    pub attempts: Vec<StudentAttemptEntry>,
}

impl QuizAttemptsReport {
    pub fn new(quiz_id: i64, quiz_title: String, attempts: Vec<StudentAttemptEntry>) -> Self {
        let attempt_count = attempts.len();
        let average_percentage = if attempt_count > 0 {
            attempts.iter().map(|a| a.percentage).sum::<f64>() / attempt_count as f64
        } else {
            0.0
        };
        let suspicious_count = attempts.iter().filter(|a| a.is_suspicious).count();

        Self {
            quiz_id,
            quiz_title,
            attempt_count,
            average_percentage,
            suspicious_count,
            attempts,
        }
    }
}
