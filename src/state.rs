// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, services::llm::LlmClient, store::Storage};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub llm: Arc<dyn LlmClient>,
    pub config: Config,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
