//! Saved roadmap persistence. Every query is scoped to the owning user.

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::roadmap::SavedRoadmapRow;
use crate::roadmap::models::RoadmapData;

/// Stores `roadmap` verbatim for `user_id` and returns the new row.
pub async fn save_roadmap(
    pool: &PgPool,
    user_id: Uuid,
    roadmap: &RoadmapData,
) -> Result<SavedRoadmapRow, AppError> {
    let row = sqlx::query_as::<_, SavedRoadmapRow>(
        r#"
        INSERT INTO saved_roadmaps (user_id, title, subtitle, skills, tools, phases)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&roadmap.title)
    .bind(&roadmap.subtitle)
    .bind(Json(&roadmap.skills))
    .bind(Json(&roadmap.tools))
    .bind(Json(&roadmap.phases))
    .fetch_one(pool)
    .await?;

    info!("Saved roadmap {} for user {}", row.id, user_id);
    Ok(row)
}

/// Lists a user's saved roadmaps, newest first.
pub async fn list_roadmaps(pool: &PgPool, user_id: Uuid) -> Result<Vec<SavedRoadmapRow>, AppError> {
    let rows = sqlx::query_as::<_, SavedRoadmapRow>(
        "SELECT * FROM saved_roadmaps WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_roadmap(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<SavedRoadmapRow, AppError> {
    sqlx::query_as::<_, SavedRoadmapRow>(
        "SELECT * FROM saved_roadmaps WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Roadmap {id} not found")))
}

pub async fn delete_roadmap(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM saved_roadmaps WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Roadmap {id} not found")));
    }

    info!("Deleted roadmap {id} for user {user_id}");
    Ok(())
}
