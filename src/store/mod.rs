// src/store/mod.rs

//! Persistence seam.
//!
//! Handlers and services talk to these traits; `PgStorage` is the
//! production implementation. Uniqueness (usernames, quiz codes, one
//! attempt per student and quiz) is enforced by the storage layer and
//! reported as `StoreError::Duplicate`.

use async_trait::async_trait;

use crate::models::{
    attempt::{AttemptSummary, NewAttempt, QuizAttempt, StudentAttemptEntry},
    quiz::{NewQuiz, Quiz, QuizSummary},
    user::{Role, User},
};

pub mod postgres;

pub use postgres::PgStorage;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Holds what was duplicated.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Fails with `Duplicate("quiz code")` when the code is taken.
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError>;

    async fn find_published_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError>;

    async fn find_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>, StoreError>;

    /// Newest first.
    async fn list_quizzes_by_teacher(&self, teacher_id: i64) -> Result<Vec<QuizSummary>, StoreError>;
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Fails with `Duplicate("quiz attempt")` when the student already has
    /// an attempt for this quiz.
    async fn create_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt, StoreError>;

    async fn find_attempt_by_student_and_quiz(
        &self,
        student_id: i64,
        quiz_id: i64,
    ) -> Result<Option<QuizAttempt>, StoreError>;

    /// Returns `None` both for unknown ids and for attempts owned by someone else.
    async fn find_attempt_for_student(
        &self,
        attempt_id: i64,
        student_id: i64,
    ) -> Result<Option<QuizAttempt>, StoreError>;

    /// Newest first.
    async fn list_attempts_by_student(&self, student_id: i64)
    -> Result<Vec<AttemptSummary>, StoreError>;

    /// Newest first.
    async fn list_attempts_for_quiz(&self, quiz_id: i64)
    -> Result<Vec<StudentAttemptEntry>, StoreError>;
}

/// Everything the application needs from persistence.
pub trait Storage: UserStore + QuizStore + AttemptStore {}

impl<T> Storage for T where T: UserStore + QuizStore + AttemptStore {}
