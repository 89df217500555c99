// src/services/model_output.rs

//! Cleanup and parsing of JSON written by a language model.
//!
//! Model output is untrusted: it may be wrapped in Markdown fences, carry
//! trailing commas, or miss fields. Everything goes through
//! `parse_model_json`, which cleans the text, deserializes it into the
//! expected type and runs that type's `validator` rules.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;
use validator::Validate;

/// A fence wrapping the whole reply. Greedy so fences inside strings survive.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A```[A-Za-z]*[ \t]*\r?\n?(.*)```\z").expect("valid code fence regex")
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma regex"));

/// Which repairs to apply before parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cleanup {
    /// Drop commas that directly precede `}` or `]`.
    pub trailing_commas: bool,
}

impl Cleanup {
    pub fn fences_only() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            trailing_commas: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelOutputError {
    #[error("model output is empty")]
    Empty,

    #[error("model output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model output failed validation: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Returns the body of a fence that wraps the whole reply, or the trimmed
/// input when the reply is not fenced.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Not string-aware: a `,]` inside a string value is rewritten too, so this
/// only runs on text that failed to parse as-is.
pub fn strip_trailing_commas(text: &str) -> Cow<'_, str> {
    TRAILING_COMMA.replace_all(text, "$1")
}

/// Cleans, deserializes and validates a model response.
pub fn parse_model_json<T>(raw: &str, cleanup: Cleanup) -> Result<T, ModelOutputError>
where
    T: DeserializeOwned + Validate,
{
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(ModelOutputError::Empty);
    }

    let value: T = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if cleanup.trailing_commas => serde_json::from_str(&strip_trailing_commas(body))?,
        Err(e) => return Err(e.into()),
    };
    value.validate()?;
    Ok(value)
}
