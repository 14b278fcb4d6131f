//! Tracking endpoints: the rendered graph, status and positions.
//!
//! Status and position bodies are full-map replacements, the same payloads an
//! in-process session hands to its persistence writer, and go through the
//! same [`store::RoadmapStore`] contract.  Advancing a single step is a
//! read-modify-write and runs under a row lock instead.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use db::models::{json_or_default, StatusLockRow};
use db::repository::roadmaps as roadmap_repo;
use engine::layout::LayoutConfig;
use engine::{status, RoadmapGraph, RoadmapStep};
use serde::Serialize;
use store::{NodePositions, RoadmapState, StepStatus, StepStatusMap};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::{db_status, store_status};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    pub step_id: String,
    pub status: StepStatus,
    pub progress: u8,
}

/// Build the graph for stored steps and tracking state.
///
/// Also returns the initialised status map when steps were missing from it,
/// so the caller can write it back.
fn render(
    steps: &[RoadmapStep],
    state: &RoadmapState,
    layout: &LayoutConfig,
) -> (RoadmapGraph, Option<StepStatusMap>) {
    let (status_map, added) =
        status::initialize_missing(&state.status, steps.iter().map(|s| s.id.as_str()));
    let graph = engine::assemble_graph(steps, &state.positions, &status_map, layout);
    (graph, (added > 0).then_some(status_map))
}

#[instrument(skip(state))]
pub async fn graph(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RoadmapGraph>, StatusCode> {
    let row = roadmap_repo::get_roadmap(&state.pool, id).await.map_err(db_status)?;
    let steps: Vec<RoadmapStep> = serde_json::from_value(row.steps).map_err(|e| {
        error!("roadmap {} has malformed steps: {}", id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let tracking = state.store.load_state(id).await.map_err(store_status)?;

    let (graph, initialised) = render(&steps, &tracking, &state.layout);
    if let Some(status_map) = initialised {
        debug!("writing back {} initialised statuses", status_map.len());
        state
            .store
            .save_status(id, &status_map)
            .await
            .map_err(store_status)?;
    }

    Ok(Json(graph))
}

pub async fn put_status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(status_map): Json<StepStatusMap>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .save_status(id, &status_map)
        .await
        .map_err(store_status)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_positions(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(positions): Json<NodePositions>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .save_positions(id, &positions)
        .await
        .map_err(store_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn advance(
    Path((id, step_id)): Path<(Uuid, String)>,
    State(state): State<AppState>,
) -> Result<Json<AdvanceResponse>, StatusCode> {
    roadmap_repo::modify_step_status(&state.pool, id, |row| advance_locked(row, &step_id))
        .await
        .map_err(db_status)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Advance `step_id` against the locked row.
///
/// `None` if the roadmap has no such step; the row is then left alone.
fn advance_locked(
    row: StatusLockRow,
    step_id: &str,
) -> Result<Option<(serde_json::Value, AdvanceResponse)>, serde_json::Error> {
    let steps: Vec<RoadmapStep> = serde_json::from_value(row.steps)?;
    let stored: StepStatusMap = json_or_default(row.step_status)?;

    if !steps.iter().any(|s| s.id == step_id) {
        return Ok(None);
    }

    let ids = || steps.iter().map(|s| s.id.as_str());
    let (initialised, _) = status::initialize_missing(&stored, ids());
    let updated = status::advance(&initialised, step_id);

    let response = AdvanceResponse {
        step_id: step_id.to_owned(),
        status: status::status_of(&updated, step_id),
        progress: status::progress(&updated, ids()),
    };
    Ok(Some((serde_json::to_value(&updated)?, response)))
}
