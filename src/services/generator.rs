// src/services/generator.rs

use std::collections::HashSet;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    config::{DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT, MIN_QUESTION_COUNT},
    models::quiz::{Question, null_as_empty},
    services::{
        llm::{GenerationOptions, LlmClient, LlmError},
        model_output::{Cleanup, ModelOutputError, parse_model_json},
    },
};

/// Source text beyond this many characters is not sent to the model.
const MAX_SOURCE_CHARS: usize = 60_000;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("quiz generation failed: {0}")]
    GenerationFailed(#[from] LlmError),

    #[error("quiz generation returned unusable output: {0}")]
    MalformedGenerationOutput(#[from] ModelOutputError),
}

/// Quiz as returned by the model, after validation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuiz {
    #[validate(length(min = 1, max = 300))]
    pub quiz_title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub quiz_instructions: String,

    #[validate(length(min = 1))]
    #[validate(nested)]
    #[validate(custom(function = validate_answer_keys))]
    pub questions: Vec<Question>,
}

/// Question ids must be unique, option ids must be unique within a question,
/// and every answer key must name one of the options.
fn validate_answer_keys(questions: &[Question]) -> Result<(), ValidationError> {
    let mut question_ids = HashSet::new();

    for question in questions {
        if !question_ids.insert(question.id.as_str()) {
            return Err(ValidationError::new("duplicate_question_id")
                .with_message(format!("question id '{}' is repeated", question.id).into()));
        }

        let option_ids: HashSet<&str> = question.options.iter().map(|o| o.id.as_str()).collect();
        if option_ids.len() != question.options.len() {
            return Err(ValidationError::new("duplicate_option_id")
                .with_message(format!("question '{}' repeats an option id", question.id).into()));
        }

        if !question.has_valid_answer_key() {
            return Err(ValidationError::new("answer_key_mismatch").with_message(
                format!(
                    "question '{}' names '{}' as correct, which is not one of its options",
                    question.id, question.correct_answer_id
                )
                .into(),
            ));
        }
    }

    Ok(())
}

/// Missing counts use the default; everything else is clamped into range.
pub fn resolve_question_count(requested: Option<i64>) -> u32 {
    match requested {
        None => DEFAULT_QUESTION_COUNT,
        Some(n) => n.clamp(MIN_QUESTION_COUNT as i64, MAX_QUESTION_COUNT as i64) as u32,
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn build_prompt(source_text: &str, question_count: u32, topic: Option<&str>) -> String {
    let focus = match topic {
        Some(topic) if !topic.trim().is_empty() => {
            format!("Focus the questions on this topic where the material allows: {}.\n", topic.trim())
        }
        _ => String::new(),
    };

    format!(
        r#"You are an experienced teacher writing a multiple-choice quiz from course material.
Generate exactly {question_count} questions based only on the material below.
{focus}
Rules:
- Every question has exactly 4 options with ids "a", "b", "c" and "d".
- "correctAnswerId" must be the id of the single correct option. Vary its position.
- "difficulty" is one of "Easy", "Medium" or "Hard".
- "topic" is a short label for the concept the question tests.
- "explanation" briefly says why the correct option is right.
- Question ids are "q1", "q2", ... in order.

Respond with JSON only, in exactly this shape:
{{
  "quizTitle": "string",
  "quizInstructions": "string",
  "questions": [
    {{
      "id": "q1",
      "questionText": "string",
      "options": [
        {{ "id": "a", "text": "string" }},
        {{ "id": "b", "text": "string" }},
        {{ "id": "c", "text": "string" }},
        {{ "id": "d", "text": "string" }}
      ],
      "correctAnswerId": "a",
      "explanation": "string",
      "difficulty": "Easy",
      "topic": "string"
    }}
  ]
}}

Material:
"""
{source_text}
"""
"#
    )
}

/// Asks the model for a quiz over `source_text` and validates the result.
pub async fn generate_quiz(
    llm: &dyn LlmClient,
    source_text: &str,
    question_count: u32,
    topic: Option<&str>,
) -> Result<GeneratedQuiz, GenerationError> {
    let source = truncate_chars(source_text, MAX_SOURCE_CHARS);
    if source.len() < source_text.len() {
        tracing::warn!(
            original_len = source_text.len(),
            "Source text truncated to {} characters for generation",
            MAX_SOURCE_CHARS
        );
    }

    let prompt = build_prompt(source, question_count, topic);
    let raw = llm
        .generate(&prompt, &GenerationOptions::json(0.7, 8192))
        .await?;

    let quiz: GeneratedQuiz = parse_model_json(&raw, Cleanup::fences_only()).map_err(|e| {
        tracing::warn!(error = %e, raw_output = %raw, "Discarding malformed quiz generation output");
        e
    })?;

    if quiz.questions.len() != question_count as usize {
        tracing::warn!(
            requested = question_count,
            received = quiz.questions.len(),
            "Model returned a different number of questions than requested"
        );
    }

    Ok(quiz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::ScriptedLlm;

    fn quiz_json(correct: &str) -> String {
        serde_json::json!({
            "quizTitle": "Cell Biology",
            "quizInstructions": "Choose the best answer.",
            "questions": [
                {
                    "id": "q1",
                    "questionText": "What is the powerhouse of the cell?",
                    "options": [
                        { "id": "a", "text": "Nucleus" },
                        { "id": "b", "text": "Mitochondria" },
                        { "id": "c", "text": "Ribosome" },
                        { "id": "d", "text": "Golgi apparatus" }
                    ],
                    "correctAnswerId": correct,
                    "explanation": "Mitochondria produce ATP.",
                    "difficulty": "Easy",
                    "topic": "Organelles"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn question_count_policy() {
        assert_eq!(resolve_question_count(None), DEFAULT_QUESTION_COUNT);
        assert_eq!(resolve_question_count(Some(0)), 1);
        assert_eq!(resolve_question_count(Some(-3)), 1);
        assert_eq!(resolve_question_count(Some(10)), 10);
        assert_eq!(resolve_question_count(Some(99)), 25);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn prompt_embeds_count_topic_and_material() {
        let prompt = build_prompt("Cells divide by mitosis.", 7, Some("Cell cycle"));
        assert!(prompt.contains("exactly 7 questions"));
        assert!(prompt.contains("Cell cycle"));
        assert!(prompt.contains("Cells divide by mitosis."));
        assert!(prompt.contains("\"correctAnswerId\""));
    }

    #[tokio::test]
    async fn parses_fenced_model_output() {
        let llm = ScriptedLlm::new(vec![Ok(format!("```json\n{}\n```", quiz_json("b")))]);

        let quiz = generate_quiz(&llm, "Mitochondria produce ATP.", 1, None)
            .await
            .unwrap();

        assert_eq!(quiz.quiz_title, "Cell Biology");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].correct_answer_id, "b");
        assert!(llm.prompts()[0].contains("Mitochondria produce ATP."));
    }

    #[tokio::test]
    async fn null_topic_and_instructions_do_not_fail_generation() {
        let mut value: serde_json::Value = serde_json::from_str(&quiz_json("b")).unwrap();
        value["quizInstructions"] = serde_json::Value::Null;
        value["questions"][0]["topic"] = serde_json::Value::Null;
        let llm = ScriptedLlm::new(vec![Ok(value.to_string())]);

        let quiz = generate_quiz(&llm, "text", 1, None).await.unwrap();
        assert_eq!(quiz.quiz_instructions, "");
        assert_eq!(quiz.questions[0].topic, "");
    }

    #[tokio::test]
    async fn count_mismatch_is_not_an_error() {
        let llm = ScriptedLlm::new(vec![Ok(quiz_json("b"))]);
        let quiz = generate_quiz(&llm, "text", 5, None).await.unwrap();
        assert_eq!(quiz.questions.len(), 1);
    }

    #[tokio::test]
    async fn answer_key_outside_options_is_rejected() {
        let llm = ScriptedLlm::new(vec![Ok(quiz_json("e"))]);
        let result = generate_quiz(&llm, "text", 1, None).await;
        assert!(matches!(
            result,
            Err(GenerationError::MalformedGenerationOutput(ModelOutputError::Invalid(_)))
        ));
    }

    #[tokio::test]
    async fn three_options_are_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&quiz_json("a")).unwrap();
        value["questions"][0]["options"].as_array_mut().unwrap().pop();
        let llm = ScriptedLlm::new(vec![Ok(value.to_string())]);

        let result = generate_quiz(&llm, "text", 1, None).await;
        assert!(matches!(result, Err(GenerationError::MalformedGenerationOutput(_))));
    }

    #[tokio::test]
    async fn non_json_output_is_malformed() {
        let llm = ScriptedLlm::new(vec![Ok("Sorry, I cannot help with that.".to_string())]);
        let result = generate_quiz(&llm, "text", 1, None).await;
        assert!(matches!(
            result,
            Err(GenerationError::MalformedGenerationOutput(ModelOutputError::Json(_)))
        ));
    }

    #[tokio::test]
    async fn upstream_errors_are_generation_failures() {
        let llm = ScriptedLlm::new(vec![Err("quota exceeded".to_string())]);
        let result = generate_quiz(&llm, "text", 1, None).await;
        assert!(matches!(result, Err(GenerationError::GenerationFailed(_))));
    }
}
