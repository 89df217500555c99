// src/services/quizzes.rs

use rand::Rng;

use crate::{
    models::{
        attempt::QuizAttemptsReport,
        quiz::{GenerateQuizRequest, NewQuiz, PublicQuiz, Quiz, QuizSummary},
    },
    services::{
        extractor::{self, ExtractionError},
        generator::{self, GenerationError},
        llm::LlmClient,
    },
    store::{AttemptStore, QuizStore, StoreError},
};

/// Characters used in quiz codes; 0/O and 1/I are left out.
const QUIZ_CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const QUIZ_CODE_LEN: usize = 8;
const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("quiz not found")]
    NotFound,

    #[error("quiz already attempted by this student")]
    AlreadyAttempted,

    #[error("could not allocate a unique quiz code")]
    CodeSpaceExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn generate_quiz_code() -> String {
    let mut rng = rand::rng();
    (0..QUIZ_CODE_LEN)
        .map(|_| QUIZ_CODE_CHARSET[rng.random_range(0..QUIZ_CODE_CHARSET.len())] as char)
        .collect()
}

/// Extracts the PDF, generates questions and stores the quiz for `teacher_id`.
///
/// Nothing is persisted unless every step succeeds.
pub async fn create_quiz_from_pdf<S>(
    store: &S,
    llm: &dyn LlmClient,
    teacher_id: i64,
    request: GenerateQuizRequest,
) -> Result<Quiz, QuizError>
where
    S: QuizStore + ?Sized,
{
    let question_count = generator::resolve_question_count(request.num_questions);
    let text = extractor::extract_from_base64(request.pdf_base64).await?;
    tracing::info!(teacher_id, text_len = text.len(), question_count, "Extracted PDF text");

    let generated =
        generator::generate_quiz(llm, &text, question_count, request.topic.as_deref()).await?;

    let draft = NewQuiz {
        quiz_code: String::new(),
        teacher_id,
        title: generated.quiz_title,
        instructions: generated.quiz_instructions,
        subject: request.subject,
        topic: request.topic,
        published: true,
        questions: generated.questions,
    };

    insert_with_fresh_code(store, draft).await
}

/// Stores `draft` under a newly generated code, retrying on code collisions.
async fn insert_with_fresh_code<S>(store: &S, draft: NewQuiz) -> Result<Quiz, QuizError>
where
    S: QuizStore + ?Sized,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let new_quiz = NewQuiz {
            quiz_code: generate_quiz_code(),
            ..draft.clone()
        };

        match store.create_quiz(new_quiz).await {
            Ok(quiz) => {
                tracing::info!(quiz_id = quiz.id, quiz_code = %quiz.quiz_code, "Quiz created");
                return Ok(quiz);
            }
            Err(StoreError::Duplicate(_)) => {
                tracing::warn!("Quiz code collision, generating a new code");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(QuizError::CodeSpaceExhausted)
}

/// Answer-free view of a published quiz for a student who has not taken it yet.
pub async fn fetch_quiz_for_student<S>(
    store: &S,
    student_id: i64,
    code: &str,
) -> Result<PublicQuiz, QuizError>
where
    S: QuizStore + AttemptStore + ?Sized,
{
    let code = code.trim().to_ascii_uppercase();
    let quiz = store
        .find_published_quiz_by_code(&code)
        .await?
        .ok_or(QuizError::NotFound)?;

    if store
        .find_attempt_by_student_and_quiz(student_id, quiz.id)
        .await?
        .is_some()
    {
        return Err(QuizError::AlreadyAttempted);
    }

    Ok(PublicQuiz::from(&quiz))
}

pub async fn list_teacher_quizzes<S>(store: &S, teacher_id: i64) -> Result<Vec<QuizSummary>, QuizError>
where
    S: QuizStore + ?Sized,
{
    Ok(store.list_quizzes_by_teacher(teacher_id).await?)
}

/// A quiz with its answer key, only for the teacher who owns it.
pub async fn get_teacher_quiz<S>(store: &S, teacher_id: i64, quiz_id: i64) -> Result<Quiz, QuizError>
where
    S: QuizStore + ?Sized,
{
    store
        .find_quiz_by_id(quiz_id)
        .await?
        .filter(|q| q.teacher_id == teacher_id)
        .ok_or(QuizError::NotFound)
}

pub async fn quiz_attempts_report<S>(
    store: &S,
    teacher_id: i64,
    quiz_id: i64,
) -> Result<QuizAttemptsReport, QuizError>
where
    S: QuizStore + AttemptStore + ?Sized,
{
    let quiz = get_teacher_quiz(store, teacher_id, quiz_id).await?;
    let attempts = store.list_attempts_for_quiz(quiz.id).await?;
    Ok(QuizAttemptsReport::new(quiz.id, quiz.title, attempts))
}
