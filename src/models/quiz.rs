// src/models/quiz.rs

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Difficulty label attached to every generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    #[validate(length(min = 1, max = 50))]
    pub id: String,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

/// A multiple-choice question embedded in a quiz.
/// Stored as part of the quiz's `questions` JSONB column; not addressable on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique within the owning quiz.
    #[validate(length(min = 1, max = 50))]
    pub id: String,

    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,

    /// Exactly four options.
    #[validate(length(equal = 4))]
    #[validate(nested)]
    pub options: Vec<QuizOption>,

    /// Id of the one correct option.
    #[validate(length(min = 1, max = 50))]
    pub correct_answer_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    pub difficulty: Difficulty,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub topic: String,
}

/// Treats an explicit `null` like a missing string field.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Question {
    pub fn option_text(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.text.as_str())
    }

    pub fn correct_option_text(&self) -> Option<&str> {
        self.option_text(&self.correct_answer_id)
    }

    /// True when `correct_answer_id` names exactly one of the options.
    pub fn has_valid_answer_key(&self) -> bool {
        self.options
            .iter()
            .filter(|o| o.id == self.correct_answer_id)
            .count()
            == 1
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,

    /// Short human-facing code students use to open the quiz.
    pub quiz_code: String,

    /// Owning teacher (users.id).
    pub teacher_id: i64,

    pub title: String,
    pub instructions: String,
    pub subject: Option<String>,
    pub topic: Option<String>,

    pub published: bool,

    pub questions: Json<Vec<Question>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Quiz {
    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Everything needed to insert a quiz; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub quiz_code: String,
    pub teacher_id: i64,
    pub title: String,
    pub instructions: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub published: bool,
    pub questions: Vec<Question>,
}

/// Row shape for a teacher's quiz list.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub quiz_code: String,
    pub title: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub published: bool,
    pub question_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            quiz_code: quiz.quiz_code.clone(),
            title: quiz.title.clone(),
            subject: quiz.subject.clone(),
            topic: quiz.topic.clone(),
            published: quiz.published,
            question_count: quiz.questions.len() as i64,
            created_at: quiz.created_at,
        }
    }
}

/// DTO for sending a question to a student (excludes answer key and explanation).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub question_text: String,
    pub options: Vec<QuizOption>,
    pub difficulty: Difficulty,
    pub topic: String,
}

/// Student-facing projection of a quiz.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: i64,
    pub quiz_code: String,
    pub title: String,
    pub instructions: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            quiz_code: quiz.quiz_code.clone(),
            title: quiz.title.clone(),
            instructions: quiz.instructions.clone(),
            subject: quiz.subject.clone(),
            topic: quiz.topic.clone(),
            questions: quiz
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id.clone(),
                    question_text: q.question_text.clone(),
                    options: q.options.clone(),
                    difficulty: q.difficulty,
                    topic: q.topic.clone(),
                })
                .collect(),
        }
    }
}

/// DTO for generating a quiz from an uploaded PDF.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    /// Base64 PDF, optionally prefixed with a `data:` URL header.
    #[validate(length(min = 1, message = "A PDF file is required."))]
    pub pdf_base64: String,
    pub num_questions: Option<i64>,
    #[validate(length(max = 100))]
    pub subject: Option<String>,
    #[validate(length(max = 200))]
    pub topic: Option<String>,
}
