// src/services/mod.rs

pub mod analyzer;
pub mod attempts;
pub mod extractor;
pub mod generator;
pub mod grader;
pub mod llm;
pub mod model_output;
pub mod quizzes;
