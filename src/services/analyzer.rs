// src/services/analyzer.rs

use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    models::{
        analysis::{
            AttemptAnalysis, ImprovementArea, OverallSummary, ProctoringStatus, QuestionFeedback,
            Strength,
        },
        attempt::{ProctoringEvent, ProctoringEventType},
        quiz::Question,
    },
    services::{
        grader::GradedAttempt,
        llm::{GenerationOptions, LlmClient, LlmError},
        model_output::{Cleanup, ModelOutputError, parse_model_json},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("attempt analysis failed: {0}")]
    AnalysisFailed(#[from] LlmError),

    #[error("attempt analysis returned unusable output: {0}")]
    MalformedAnalysisOutput(#[from] ModelOutputError),
}

/// Everything the analyzer looks at for one attempt.
pub struct AnalysisInput<'a> {
    pub questions: &'a [Question],
    pub graded: &'a GradedAttempt,
    pub is_suspicious: bool,
    pub proctoring_events: &'a [ProctoringEvent],
}

/// The narrative part of the model's answer. Any `questionFeedback` the
/// model writes is not read.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ModelAnalysis {
    #[validate(nested)]
    overall_summary: ModelSummary,
    #[serde(default)]
    strengths: Vec<Strength>,
    #[serde(default)]
    improvement_areas: Vec<ImprovementArea>,
    #[serde(default)]
    proctoring_status: Option<ModelProctoringStatus>,
}

#[derive(Debug, Deserialize, Validate)]
struct ModelSummary {
    #[validate(length(min = 1))]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ModelProctoringStatus {
    #[serde(default)]
    summary: String,
}

/// Per-question feedback computed from the quiz and the graded answers.
pub fn build_question_feedback(questions: &[Question], graded: &GradedAttempt) -> Vec<QuestionFeedback> {
    graded
        .answers
        .iter()
        .map(|answer| {
            let question = questions.iter().find(|q| q.id == answer.question_id);
            let selected_option_text = match (question, answer.selected_option_id.as_deref()) {
                (Some(q), Some(selected)) => q.option_text(selected).map(str::to_string),
                _ => None,
            };

            QuestionFeedback {
                question_id: answer.question_id.clone(),
                question_text: question
                    .map(|q| q.question_text.clone())
                    .unwrap_or_else(|| "Question not found in this quiz".to_string()),
                selected_option_text,
                correct_option_text: question
                    .and_then(|q| q.correct_option_text())
                    .map(str::to_string),
                is_correct: answer.is_correct,
                explanation: question.and_then(|q| q.explanation.clone()),
                topic: question.map(|q| q.topic.clone()),
                difficulty: question.map(|q| q.difficulty),
            }
        })
        .collect()
}

/// Plain-text summary of the proctoring signals, used when the model gives none.
pub fn describe_proctoring(is_suspicious: bool, events: &[ProctoringEvent]) -> String {
    let mut counts: Vec<(ProctoringEventType, usize)> = Vec::new();
    for event in events {
        match counts.iter_mut().find(|(kind, _)| *kind == event.event_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((event.event_type, 1)),
        }
    }

    let mut summary = if counts.is_empty() {
        "No proctoring events were recorded.".to_string()
    } else {
        let parts: Vec<String> = counts
            .iter()
            .map(|(kind, count)| format!("{} x {}", count, kind.label()))
            .collect();
        format!("{} proctoring event(s) recorded: {}.", events.len(), parts.join(", "))
    };

    if is_suspicious {
        summary.push_str(" The attempt was flagged as suspicious.");
    }
    summary
}

fn build_prompt(input: &AnalysisInput<'_>) -> String {
    let questions: Vec<serde_json::Value> = input
        .questions
        .iter()
        .map(|q| {
            let answer = input.graded.answers.iter().find(|a| a.question_id == q.id);
            json!({
                "id": q.id,
                "questionText": q.question_text,
                "options": q.options,
                "correctAnswerId": q.correct_answer_id,
                "explanation": q.explanation,
                "difficulty": q.difficulty,
                "topic": q.topic,
                "studentAnswerId": answer.and_then(|a| a.selected_option_id.clone()),
                "isCorrect": answer.map(|a| a.is_correct).unwrap_or(false),
            })
        })
        .collect();

    let context = json!({
        "score": input.graded.score,
        "totalQuestions": input.graded.total_questions,
        "percentage": input.graded.percentage,
        "questions": questions,
        "isSuspicious": input.is_suspicious,
        "proctoringEvents": input.proctoring_events,
    });
    let context = serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string());

    format!(
        r#"You are a supportive tutor reviewing a student's quiz attempt.
Use the attempt data below to write a short performance analysis.

Attempt data:
{context}

Respond with JSON only, in exactly this shape:
{{
  "overallSummary": {{
    "score": {score},
    "totalQuestions": {total},
    "percentage": {percentage:.1},
    "message": "2-3 sentences on overall performance"
  }},
  "strengths": [ {{ "topic": "string", "rating": "Excellent | Good | Fair" }} ],
  "improvementAreas": [ {{ "topic": "string", "suggestion": "concrete study advice" }} ],
  "proctoringStatus": {{
    "isSuspicious": {suspicious},
    "summary": "one sentence on the integrity signals"
  }}
}}
"#,
        score = input.graded.score,
        total = input.graded.total_questions,
        percentage = input.graded.percentage,
        suspicious = input.is_suspicious,
    )
}

/// Produces the stored analysis for a graded attempt.
///
/// Only the narrative comes from the model. Numbers, the suspicious flag and
/// the per-question feedback are filled in locally.
pub async fn analyze_attempt(
    llm: &dyn LlmClient,
    input: AnalysisInput<'_>,
) -> Result<AttemptAnalysis, AnalysisError> {
    let prompt = build_prompt(&input);
    let raw = llm
        .generate(&prompt, &GenerationOptions::json(0.4, 4096))
        .await?;

    let parsed: ModelAnalysis = parse_model_json(&raw, Cleanup::lenient()).map_err(|e| {
        tracing::warn!(error = %e, raw_output = %raw, "Discarding malformed attempt analysis output");
        e
    })?;

    let proctoring_summary = parsed
        .proctoring_status
        .map(|s| s.summary)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| describe_proctoring(input.is_suspicious, input.proctoring_events));

    Ok(AttemptAnalysis {
        overall_summary: OverallSummary {
            score: input.graded.score,
            total_questions: input.graded.total_questions,
            percentage: input.graded.percentage,
            message: parsed.overall_summary.message,
        },
        strengths: parsed.strengths,
        improvement_areas: parsed.improvement_areas,
        question_feedback: build_question_feedback(input.questions, input.graded),
        proctoring_status: ProctoringStatus {
            is_suspicious: input.is_suspicious,
            summary: proctoring_summary,
        },
    })
}
