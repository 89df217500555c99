// src/services/llm.rs

//! Text-generation client.
//!
//! The quiz generator and the attempt analyzer only need
//! `generate(prompt, options) -> text`; `GeminiClient` is the
//! production implementation, constructed once at startup and shared
//! through `AppState`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GeminiConfig;

/// Per-call tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the model for `application/json` output.
    pub json_response: bool,
}

impl GenerationOptions {
    pub fn json(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
            json_response: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request to the model failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("invalid model endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiRequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_text(self) -> Result<String, LlmError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    endpoint: Url,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = config
            .base_url
            .join(&format!("models/{}:generateContent", config.model))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiRequestPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
                response_mime_type: options.json_response.then_some("application/json"),
            },
        };

        tracing::debug!(endpoint = %self.endpoint, prompt_len = prompt.len(), "Calling Gemini");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = status.as_u16(), "Gemini API request failed: {}", body);
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GeminiResponse = response.json().await?;
        body.into_text()
    }
}
