// src/services/grader.rs

use std::collections::HashMap;

use crate::models::{
    attempt::{AnsweredQuestion, SubmittedAnswer},
    quiz::Question,
};

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAttempt {
    /// One entry per submitted answer, in submission order.
    pub answers: Vec<AnsweredQuestion>,
    pub score: i32,
    /// Number of questions in the quiz.
    pub total_questions: i32,
    pub percentage: f64,
}

/// Grades `submitted` against the quiz's answer key.
///
/// An answer whose question id is not in the quiz counts as incorrect.
/// Unanswered questions (`selected_option_id == None`) are incorrect.
pub fn grade(questions: &[Question], submitted: &[SubmittedAnswer]) -> GradedAttempt {
    let answer_key: HashMap<&str, &str> = questions
        .iter()
        .map(|q| (q.id.as_str(), q.correct_answer_id.as_str()))
        .collect();

    let mut score = 0;
    let answers: Vec<AnsweredQuestion> = submitted
        .iter()
        .map(|answer| {
            let is_correct = match (
                answer_key.get(answer.question_id.as_str()),
                answer.selected_option_id.as_deref(),
            ) {
                (Some(correct), Some(selected)) => *correct == selected,
                _ => false,
            };
            if is_correct {
                score += 1;
            }
            AnsweredQuestion {
                question_id: answer.question_id.clone(),
                selected_option_id: answer.selected_option_id.clone(),
                is_correct,
            }
        })
        .collect();

    let total_questions = questions.len() as i32;

    GradedAttempt {
        answers,
        score,
        total_questions,
        percentage: percentage(score, total_questions),
    }
}

pub fn percentage(score: i32, total: i32) -> f64 {
    if total > 0 {
        (score as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{Difficulty, QuizOption};

    fn question(id: &str, correct: &str) -> Question {
        Question {
            id: id.to_string(),
            question_text: format!("Question {}", id),
            options: ["A", "B", "C", "D"]
                .iter()
                .map(|o| QuizOption {
                    id: o.to_string(),
                    text: format!("Option {}", o),
                })
                .collect(),
            correct_answer_id: correct.to_string(),
            explanation: None,
            difficulty: Difficulty::Medium,
            topic: "General".to_string(),
        }
    }

    fn answer(question_id: &str, selected: Option<&str>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: question_id.to_string(),
            selected_option_id: selected.map(str::to_string),
        }
    }

    #[test]
    fn three_correct_and_one_blank_is_seventy_five_percent() {
        let questions = vec![
            question("Q1", "B"),
            question("Q2", "A"),
            question("Q3", "C"),
            question("Q4", "D"),
        ];
        let submitted = vec![
            answer("Q1", Some("B")),
            answer("Q2", Some("A")),
            answer("Q3", Some("C")),
            answer("Q4", None),
        ];

        let graded = grade(&questions, &submitted);
        assert_eq!(graded.score, 3);
        assert_eq!(graded.total_questions, 4);
        assert_eq!(graded.percentage, 75.0);
        assert!(!graded.answers[3].is_correct);
    }

    #[test]
    fn unknown_question_id_is_incorrect_not_rejected() {
        let questions = vec![question("Q1", "B")];
        let submitted = vec![answer("Q1", Some("B")), answer("Q99", Some("B"))];

        let graded = grade(&questions, &submitted);
        assert_eq!(graded.answers.len(), 2);
        assert!(graded.answers[0].is_correct);
        assert!(!graded.answers[1].is_correct);
        assert_eq!(graded.score, 1);
    }

    #[test]
    fn output_follows_submission_order() {
        let questions = vec![question("Q1", "A"), question("Q2", "B")];
        let submitted = vec![answer("Q2", Some("B")), answer("Q1", Some("C"))];

        let graded = grade(&questions, &submitted);
        let ids: Vec<&str> = graded.answers.iter().map(|a| a.question_id.as_str()).collect();
        assert_eq!(ids, vec!["Q2", "Q1"]);
        assert!(graded.answers[0].is_correct);
        assert!(!graded.answers[1].is_correct);
    }

    #[test]
    fn empty_quiz_scores_zero_percent() {
        let graded = grade(&[], &[answer("Q1", Some("A"))]);
        assert_eq!(graded.score, 0);
        assert_eq!(graded.percentage, 0.0);
    }

    #[test]
    fn grading_is_deterministic() {
        let questions = vec![question("Q1", "A"), question("Q2", "B")];
        let submitted = vec![answer("Q1", Some("A")), answer("Q2", Some("C"))];
        assert_eq!(grade(&questions, &submitted), grade(&questions, &submitted));
    }
}
