//! Postgres-backed [`RoadmapStore`].
//!
//! Tracking columns are JSONB objects.  A `null` column reads as an empty
//! map; any other shape that does not decode is reported as malformed.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use store::{NodePositions, RoadmapState, RoadmapStore, StepStatusMap, StoreError};
use tracing::instrument;
use uuid::Uuid;

use crate::{models::json_or_default, repository::roadmaps, DbError, DbPool};

#[derive(Clone)]
pub struct PgRoadmapStore {
    pool: DbPool,
}

impl PgRoadmapStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoadmapStore for PgRoadmapStore {
    #[instrument(skip(self))]
    async fn load_state(&self, roadmap_id: Uuid) -> Result<RoadmapState, StoreError> {
        let row = roadmaps::get_tracking(&self.pool, roadmap_id)
            .await
            .map_err(|e| to_store_error(roadmap_id, e))?;

        Ok(RoadmapState {
            positions: decode_column("node_positions", row.node_positions)?,
            status: decode_column("step_status", row.step_status)?,
        })
    }

    #[instrument(skip(self, status), fields(entries = status.len()))]
    async fn save_status(&self, roadmap_id: Uuid, status: &StepStatusMap) -> Result<(), StoreError> {
        let value = encode_column(status)?;
        roadmaps::update_step_status(&self.pool, roadmap_id, value)
            .await
            .map_err(|e| to_store_error(roadmap_id, e))
    }

    #[instrument(skip(self, positions), fields(entries = positions.len()))]
    async fn save_positions(
        &self,
        roadmap_id: Uuid,
        positions: &NodePositions,
    ) -> Result<(), StoreError> {
        let value = encode_column(positions)?;
        roadmaps::update_node_positions(&self.pool, roadmap_id, value)
            .await
            .map_err(|e| to_store_error(roadmap_id, e))
    }
}

fn to_store_error(roadmap_id: Uuid, e: DbError) -> StoreError {
    match e {
        DbError::NotFound => StoreError::NotFound(roadmap_id),
        DbError::Json(e) => StoreError::Malformed(e.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

fn decode_column<T>(column: &str, value: serde_json::Value) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    json_or_default(value).map_err(|e| StoreError::Malformed(format!("{}: {}", column, e)))
}

fn encode_column<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store::{Position, StepStatus};

    #[test]
    fn null_columns_decode_as_empty_maps() {
        let positions: NodePositions = decode_column("node_positions", json!(null)).unwrap();
        let status: StepStatusMap = decode_column("step_status", json!(null)).unwrap();
        assert!(positions.is_empty());
        assert!(status.is_empty());
    }

    #[test]
    fn columns_decode_into_typed_maps() {
        let positions: NodePositions =
            decode_column("node_positions", json!({"0": {"x": 10.0, "y": 20.5}})).unwrap();
        assert_eq!(positions.get("0"), Some(&Position::new(10.0, 20.5)));

        let status: StepStatusMap =
            decode_column("step_status", json!({"0": "in-progress", "1": "completed"})).unwrap();
        assert_eq!(status.get("0"), Some(&StepStatus::InProgress));
        assert_eq!(status.get("1"), Some(&StepStatus::Completed));
    }

    #[test]
    fn unknown_status_value_is_malformed() {
        let err = decode_column::<StepStatusMap>("step_status", json!({"0": "done"})).unwrap_err();
        match err {
            StoreError::Malformed(msg) => assert!(msg.starts_with("step_status")),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn status_map_encodes_with_kebab_case_values() {
        let mut status = StepStatusMap::new();
        status.insert("2".into(), StepStatus::InProgress);
        assert_eq!(encode_column(&status).unwrap(), json!({"2": "in-progress"}));
    }

    #[test]
    fn not_found_keeps_the_roadmap_id() {
        let id = Uuid::new_v4();
        assert!(matches!(to_store_error(id, DbError::NotFound), StoreError::NotFound(got) if got == id));
        assert!(matches!(
            to_store_error(id, DbError::Sqlx(sqlx::Error::PoolTimedOut)),
            StoreError::Backend(_)
        ));

        let bad_json = serde_json::from_str::<StepStatusMap>("[").unwrap_err();
        assert!(matches!(to_store_error(id, DbError::from(bad_json)), StoreError::Malformed(_)));
    }
}
