use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::roadmap::models::{Phase, RoadmapData};

/// A row of `saved_roadmaps`.
///
/// Expected shape: `id uuid primary key default gen_random_uuid(), user_id uuid not null,
/// title text not null, subtitle text, skills jsonb not null, tools jsonb not null,
/// phases jsonb not null, created_at timestamptz not null default now(),
/// updated_at timestamptz not null default now()`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedRoadmapRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub skills: Json<Vec<String>>,
    pub tools: Json<Vec<String>>,
    pub phases: Json<Vec<Phase>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SavedRoadmapRow> for RoadmapData {
    fn from(row: SavedRoadmapRow) -> Self {
        RoadmapData {
            title: row.title,
            subtitle: row.subtitle,
            skills: row.skills.0,
            tools: row.tools.0,
            phases: row.phases.0,
        }
    }
}
