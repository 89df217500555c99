// src/handlers/mod.rs

pub mod attempts;
pub mod auth;
pub mod quizzes;
