// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use super::{AttemptStore, QuizStore, StoreError, UserStore};
use crate::models::{
    attempt::{AttemptSummary, NewAttempt, QuizAttempt, StudentAttemptEntry},
    quiz::{NewQuiz, Quiz, QuizSummary},
    user::{Role, User},
};

const QUIZ_COLUMNS: &str = "id, quiz_code, teacher_id, title, instructions, subject, topic, \
     published, questions, created_at, updated_at";

const ATTEMPT_COLUMNS: &str = "id, student_id, quiz_id, quiz_title, quiz_subject, quiz_topic, \
     answers, score, total_questions, percentage, submitted_at, analysis, proctoring_events, \
     is_suspicious";

/// PostgreSQL-backed storage.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation to `StoreError::Duplicate`.
fn unique_or_database(err: sqlx::Error, what: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStorage {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_or_database(e, "username"))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl QuizStore for PgStorage {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO quizzes
                (quiz_code, teacher_id, title, instructions, subject, topic, published, questions)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {QUIZ_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Quiz>(&sql)
            .bind(&quiz.quiz_code)
            .bind(quiz.teacher_id)
            .bind(&quiz.title)
            .bind(&quiz.instructions)
            .bind(&quiz.subject)
            .bind(&quiz.topic)
            .bind(quiz.published)
            .bind(Json(&quiz.questions))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or_database(e, "quiz code"))
    }

    async fn find_published_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE quiz_code = $1 AND published");

        let quiz = sqlx::query_as::<_, Quiz>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quiz)
    }

    async fn find_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>, StoreError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1");

        let quiz = sqlx::query_as::<_, Quiz>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quiz)
    }

    async fn list_quizzes_by_teacher(&self, teacher_id: i64) -> Result<Vec<QuizSummary>, StoreError> {
        let quizzes = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT
                id, quiz_code, title, subject, topic, published,
                jsonb_array_length(questions)::BIGINT AS question_count,
                created_at
            FROM quizzes
            WHERE teacher_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }
}

#[async_trait]
impl AttemptStore for PgStorage {
    async fn create_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO quiz_attempts
                (student_id, quiz_id, quiz_title, quiz_subject, quiz_topic, answers, score,
                 total_questions, percentage, analysis, proctoring_events, is_suspicious)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        );

        // The unique (student_id, quiz_id) index makes concurrent double
        // submissions resolve to exactly one row.
        sqlx::query_as::<_, QuizAttempt>(&sql)
            .bind(attempt.student_id)
            .bind(attempt.quiz_id)
            .bind(&attempt.quiz_title)
            .bind(&attempt.quiz_subject)
            .bind(&attempt.quiz_topic)
            .bind(Json(&attempt.answers))
            .bind(attempt.score)
            .bind(attempt.total_questions)
            .bind(attempt.percentage)
            .bind(Json(&attempt.analysis))
            .bind(Json(&attempt.proctoring_events))
            .bind(attempt.is_suspicious)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or_database(e, "quiz attempt"))
    }

    async fn find_attempt_by_student_and_quiz(
        &self,
        student_id: i64,
        quiz_id: i64,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2"
        );

        let attempt = sqlx::query_as::<_, QuizAttempt>(&sql)
            .bind(student_id)
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attempt)
    }

    async fn find_attempt_for_student(
        &self,
        attempt_id: i64,
        student_id: i64,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let sql =
            format!("SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1 AND student_id = $2");

        let attempt = sqlx::query_as::<_, QuizAttempt>(&sql)
            .bind(attempt_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attempt)
    }

    async fn list_attempts_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<AttemptSummary>, StoreError> {
        let attempts = sqlx::query_as::<_, AttemptSummary>(
            r#"
            SELECT
                id, quiz_id, quiz_title, quiz_subject, quiz_topic, score,
                total_questions, percentage, is_suspicious, submitted_at
            FROM quiz_attempts
            WHERE student_id = $1
            ORDER BY submitted_at DESC, id DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn list_attempts_for_quiz(
        &self,
        quiz_id: i64,
    ) -> Result<Vec<StudentAttemptEntry>, StoreError> {
        let attempts = sqlx::query_as::<_, StudentAttemptEntry>(
            r#"
            SELECT
                a.id, a.student_id, u.username AS student_username, a.score,
                a.total_questions, a.percentage, a.is_suspicious, a.submitted_at
            FROM quiz_attempts a
            JOIN users u ON u.id = a.student_id
            WHERE a.quiz_id = $1
            ORDER BY a.submitted_at DESC, a.id DESC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }
}
