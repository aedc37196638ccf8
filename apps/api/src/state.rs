use std::sync::Arc;

use sqlx::PgPool;

use crate::llm_client::{CompletionSource, LlmClient};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Streaming chat backend. Default: the same `LlmClient`.
    pub completions: Arc<dyn CompletionSource>,
}
