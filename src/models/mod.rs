// src/models/mod.rs

pub mod analysis;
pub mod attempt;
pub mod quiz;
pub mod user;
