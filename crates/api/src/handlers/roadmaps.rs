use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use db::models::{NewRoadmap, RoadmapRow};
use db::repository::roadmaps as roadmap_repo;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::db_status;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoadmapDto {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub job_role: String,
    pub skill_level: String,
    #[serde(default)]
    pub company: Option<String>,
    /// Step array or the full generation envelope.
    pub roadmap: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RoadmapRow>>, StatusCode> {
    roadmap_repo::list_roadmaps(&state.pool, query.user_id)
        .await
        .map(Json)
        .map_err(db_status)
}

pub async fn get(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RoadmapRow>, StatusCode> {
    roadmap_repo::get_roadmap(&state.pool, id)
        .await
        .map(Json)
        .map_err(db_status)
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoadmapDto>,
) -> Result<(StatusCode, Json<RoadmapRow>), StatusCode> {
    if payload.job_role.trim().is_empty() || payload.skill_level.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Only normalised steps are ever stored.
    let parsed = engine::schema::parse_roadmap_value(payload.roadmap).map_err(|e| {
        warn!("rejected roadmap: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    let steps = serde_json::to_value(&parsed.steps).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let new = NewRoadmap {
        user_id: payload.user_id,
        job_role: payload.job_role,
        skill_level: payload.skill_level,
        company: payload.company.filter(|c| !c.trim().is_empty()),
        steps,
    };

    let row = roadmap_repo::create_roadmap(&state.pool, new)
        .await
        .map_err(db_status)?;
    info!("created roadmap {} with {} steps", row.id, parsed.steps.len());
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn delete(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, StatusCode> {
    match roadmap_repo::delete_roadmap(&state.pool, id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(db_status(e)),
    }
}
