// src/models/analysis.rs

use serde::{Deserialize, Serialize};

use crate::models::quiz::Difficulty;

/// Performance report stored with every attempt.
///
/// The narrative fields come from the AI service; the numbers, the
/// suspicious flag and `question_feedback` are always filled from local data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnalysis {
    pub overall_summary: OverallSummary,
    pub strengths: Vec<Strength>,
    pub improvement_areas: Vec<ImprovementArea>,
    pub question_feedback: Vec<QuestionFeedback>,
    pub proctoring_status: ProctoringStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strength {
    pub topic: String,
    /// Qualitative label such as "Excellent" or "Good".
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementArea {
    pub topic: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub question_id: String,
    pub question_text: String,
    /// `None` when the student left the question blank.
    pub selected_option_text: Option<String>,
    pub correct_option_text: Option<String>,
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctoringStatus {
    pub is_suspicious: bool,
    pub summary: String,
}
