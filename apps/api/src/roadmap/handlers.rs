use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::roadmap::SavedRoadmapRow;
use crate::roadmap::extractor::{extract_roadmap, Extraction};
use crate::roadmap::models::RoadmapData;
use crate::roadmap::storage::{delete_roadmap, get_roadmap, list_roadmaps, save_roadmap};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    pub goal: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<RoadmapData>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRoadmapRequest {
    pub user_id: Uuid,
    pub roadmap: RoadmapData,
}

/// POST /api/v1/roadmaps/extract
pub async fn handle_extract(Json(req): Json<ExtractRequest>) -> Json<ExtractResponse> {
    let response = match extract_roadmap(&req.text, &req.goal) {
        Extraction::Found(roadmap) => ExtractResponse {
            found: true,
            roadmap: Some(roadmap),
        },
        Extraction::NotFound => ExtractResponse {
            found: false,
            roadmap: None,
        },
    };
    Json(response)
}

/// POST /api/v1/roadmaps
pub async fn handle_save(
    State(state): State<AppState>,
    Json(req): Json<SaveRoadmapRequest>,
) -> Result<(StatusCode, Json<SavedRoadmapRow>), AppError> {
    if req.roadmap.title.trim().is_empty() {
        return Err(AppError::Validation("roadmap title cannot be empty".to_string()));
    }
    let row = save_roadmap(&state.db, req.user_id, &req.roadmap).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/roadmaps
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<SavedRoadmapRow>>, AppError> {
    Ok(Json(list_roadmaps(&state.db, params.user_id).await?))
}

/// GET /api/v1/roadmaps/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<RoadmapData>, AppError> {
    let row = get_roadmap(&state.db, params.user_id, id).await?;
    Ok(Json(row.into()))
}

/// DELETE /api/v1/roadmaps/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    delete_roadmap(&state.db, params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
