pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::resume::handlers::{self as resume, MAX_UPLOAD_BYTES};
use crate::roadmap::handlers as roadmaps;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat API
        .route("/api/v1/chat", post(chat::handle_chat))
        // Roadmap API
        .route("/api/v1/roadmaps/extract", post(roadmaps::handle_extract))
        .route(
            "/api/v1/roadmaps",
            post(roadmaps::handle_save).get(roadmaps::handle_list),
        )
        .route(
            "/api/v1/roadmaps/:id",
            get(roadmaps::handle_get).delete(roadmaps::handle_delete),
        )
        // Resume API
        .route(
            "/api/v1/resume/analyze",
            post(resume::handle_analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}
