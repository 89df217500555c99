// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use eduforce::{
    config::{Config, GeminiConfig},
    models::{
        attempt::{AttemptSummary, NewAttempt, QuizAttempt, StudentAttemptEntry},
        quiz::{NewQuiz, Quiz, QuizSummary},
        user::{Role, User},
    },
    routes,
    services::llm::{GenerationOptions, LlmClient, LlmError},
    state::AppState,
    store::{AttemptStore, QuizStore, StoreError, UserStore},
};
use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use sqlx::types::Json;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    quizzes: Vec<Quiz>,
    attempts: Vec<QuizAttempt>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory `Storage` with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn attempt_count(&self) -> usize {
        self.tables.lock().unwrap().attempts.len()
    }

    pub fn set_published(&self, quiz_id: i64, published: bool) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(quiz) = tables.quizzes.iter_mut().find(|q| q.id == quiz_id) {
            quiz.published = published;
        }
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Duplicate("username"));
        }
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            password: password_hash.to_string(),
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl QuizStore for MemoryStorage {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.quizzes.iter().any(|q| q.quiz_code == quiz.quiz_code) {
            return Err(StoreError::Duplicate("quiz code"));
        }
        let now = Utc::now();
        let stored = Quiz {
            id: tables.next_id(),
            quiz_code: quiz.quiz_code,
            teacher_id: quiz.teacher_id,
            title: quiz.title,
            instructions: quiz.instructions,
            subject: quiz.subject,
            topic: quiz.topic,
            published: quiz.published,
            questions: Json(quiz.questions),
            created_at: now,
            updated_at: now,
        };
        tables.quizzes.push(stored.clone());
        Ok(stored)
    }

    async fn find_published_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .quizzes
            .iter()
            .find(|q| q.quiz_code == code && q.published)
            .cloned())
    }

    async fn find_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn list_quizzes_by_teacher(&self, teacher_id: i64) -> Result<Vec<QuizSummary>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .quizzes
            .iter()
            .rev()
            .filter(|q| q.teacher_id == teacher_id)
            .map(QuizSummary::from)
            .collect())
    }
}

#[async_trait]
impl AttemptStore for MemoryStorage {
    async fn create_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .attempts
            .iter()
            .any(|a| a.student_id == attempt.student_id && a.quiz_id == attempt.quiz_id)
        {
            return Err(StoreError::Duplicate("quiz attempt"));
        }
        let stored = QuizAttempt {
            id: tables.next_id(),
            student_id: attempt.student_id,
            quiz_id: attempt.quiz_id,
            quiz_title: attempt.quiz_title,
            quiz_subject: attempt.quiz_subject,
            quiz_topic: attempt.quiz_topic,
            answers: Json(attempt.answers),
            score: attempt.score,
            total_questions: attempt.total_questions,
            percentage: attempt.percentage,
            submitted_at: Utc::now(),
            analysis: Json(attempt.analysis),
            proctoring_events: Json(attempt.proctoring_events),
            is_suspicious: attempt.is_suspicious,
        };
        tables.attempts.push(stored.clone());
        Ok(stored)
    }

    async fn find_attempt_by_student_and_quiz(
        &self,
        student_id: i64,
        quiz_id: i64,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attempts
            .iter()
            .find(|a| a.student_id == student_id && a.quiz_id == quiz_id)
            .cloned())
    }

    async fn find_attempt_for_student(
        &self,
        attempt_id: i64,
        student_id: i64,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attempts
            .iter()
            .find(|a| a.id == attempt_id && a.student_id == student_id)
            .cloned())
    }

    async fn list_attempts_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<AttemptSummary>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attempts
            .iter()
            .rev()
            .filter(|a| a.student_id == student_id)
            .map(AttemptSummary::from)
            .collect())
    }

    async fn list_attempts_for_quiz(
        &self,
        quiz_id: i64,
    ) -> Result<Vec<StudentAttemptEntry>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attempts
            .iter()
            .rev()
            .filter(|a| a.quiz_id == quiz_id)
            .map(|a| StudentAttemptEntry {
                id: a.id,
                student_id: a.student_id,
                student_username: tables
                    .users
                    .iter()
                    .find(|u| u.id == a.student_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                score: a.score,
                total_questions: a.total_questions,
                percentage: a.percentage,
                is_suspicious: a.is_suspicious,
                submitted_at: a.submitted_at,
            })
            .collect())
    }
}

/// Answers quiz-generation prompts and analysis prompts with fixed payloads.
pub struct FakeLlm {
    pub quiz_response: String,
    pub analysis_response: String,
    pub calls: AtomicUsize,
}

impl FakeLlm {
    pub fn new(quiz_response: String, analysis_response: String) -> Self {
        Self {
            quiz_response,
            analysis_response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("multiple-choice quiz") {
            Ok(self.quiz_response.clone())
        } else {
            Ok(self.analysis_response.clone())
        }
    }
}

/// Four-question quiz where the correct options are b, a, c, d.
pub fn quiz_response() -> String {
    let questions: Vec<serde_json::Value> = [("q1", "b"), ("q2", "a"), ("q3", "c"), ("q4", "d")]
        .iter()
        .map(|(id, correct)| {
            serde_json::json!({
                "id": id,
                "questionText": format!("Question {}", id),
                "options": [
                    { "id": "a", "text": "Alpha" },
                    { "id": "b", "text": "Bravo" },
                    { "id": "c", "text": "Charlie" },
                    { "id": "d", "text": "Delta" }
                ],
                "correctAnswerId": correct,
                "explanation": "Because the material says so.",
                "difficulty": "Medium",
                "topic": "Photosynthesis"
            })
        })
        .collect();

    format!(
        "```json\n{}\n```",
        serde_json::json!({
            "quizTitle": "Photosynthesis Basics",
            "quizInstructions": "Choose one answer per question.",
            "questions": questions
        })
    )
}

pub fn analysis_response() -> String {
    r#"{
  "overallSummary": { "score": 0, "totalQuestions": 0, "percentage": 0, "message": "Good effort overall." },
  "strengths": [ { "topic": "Photosynthesis", "rating": "Good" } ],
  "improvementAreas": [ { "topic": "Light reactions", "suggestion": "Review the chapter summary." }, ],
  "questionFeedback": [ { "questionId": "q1", "questionText": "invented by the model", "isCorrect": true } ],
  "proctoringStatus": { "isSuspicious": false, "summary": "No concerns." }
}"#
    .to_string()
}

/// A one-page PDF containing `text`.
pub fn sample_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        max_body_bytes: 10 * 1024 * 1024,
        gemini: GeminiConfig {
            api_key: "unused".to_string(),
            model: "test-model".to_string(),
            base_url: url::Url::parse("http://127.0.0.1:9/").unwrap(),
            timeout_secs: 1,
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStorage>,
    pub llm: Arc<FakeLlm>,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port with in-memory storage and a fake AI client.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(FakeLlm::new(quiz_response(), analysis_response())).await
}

pub async fn spawn_app_with(llm: FakeLlm) -> TestApp {
    let store = Arc::new(MemoryStorage::default());
    let llm = Arc::new(llm);

    let state = AppState {
        store: store.clone(),
        llm: llm.clone(),
        config: test_config(),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        llm,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a user with a unique name and returns a bearer token.
    pub async fn token_for(&self, role: &str) -> String {
        let username = format!("{}_{}", &role[..1], &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "role": role
            }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);

        let login: serde_json::Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        login["token"].as_str().expect("Token not found").to_string()
    }

    /// Generates a quiz as `teacher_token` and returns the response body.
    pub async fn create_quiz(&self, teacher_token: &str) -> serde_json::Value {
        use base64::Engine;
        let pdf = base64::engine::general_purpose::STANDARD.encode(sample_pdf("Plants make sugar from light."));

        let response = self
            .client
            .post(self.url("/api/quizzes"))
            .bearer_auth(teacher_token)
            .json(&serde_json::json!({
                "pdfBase64": format!("data:application/pdf;base64,{}", pdf),
                "numQuestions": 4,
                "subject": "Biology",
                "topic": "Photosynthesis"
            }))
            .send()
            .await
            .expect("Generate failed");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }
}
