// src/config.rs

use std::env;

use dotenvy::dotenv;
use url::Url;

/// Smallest number of questions a generated quiz may ask for.
pub const MIN_QUESTION_COUNT: u32 = 1;
/// Largest number of questions a generated quiz may ask for.
pub const MAX_QUESTION_COUNT: u32 = 25;
/// Used when the teacher does not send `numQuestions`.
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Upper bound for request bodies; PDFs arrive Base64-encoded inside JSON.
    pub max_body_bytes: usize,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60 * 60 * 24);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let max_body_bytes = env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(25 * 1024 * 1024);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            max_body_bytes,
            gemini: GeminiConfig::from_env(),
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .expect("GEMINI_API_KEY must be set");

        let model = env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        let base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .expect("GEMINI_BASE_URL must be a valid URL");

        let timeout_secs = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        Self {
            api_key,
            model,
            base_url,
            timeout_secs,
        }
    }
}
