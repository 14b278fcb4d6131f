//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models and carry no domain behaviour.
//! Domain types live in the `engine` crate.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// roadmaps
// ---------------------------------------------------------------------------

/// A persisted roadmap row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadmapRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub job_role: String,
    pub skill_level: String,
    pub company: Option<String>,
    /// Validated step list, as produced by the engine's input schema.
    pub steps: serde_json::Value,
    /// Node id → `{x, y}`.
    pub node_positions: serde_json::Value,
    /// Node id → `"pending" | "in-progress" | "completed"`.
    pub step_status: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Just the tracked columns of a roadmap.
#[derive(Debug, Clone, FromRow)]
pub struct TrackingRow {
    pub node_positions: serde_json::Value,
    pub step_status: serde_json::Value,
}

/// Steps and status of a roadmap, read under a row lock.
#[derive(Debug, Clone, FromRow)]
pub struct StatusLockRow {
    pub steps: serde_json::Value,
    pub step_status: serde_json::Value,
}

/// Values needed to insert a new roadmap.
#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub user_id: Option<Uuid>,
    pub job_role: String,
    pub skill_level: String,
    pub company: Option<String>,
    pub steps: serde_json::Value,
}

/// Decode a JSONB column, reading SQL `null` as the empty value.
pub fn json_or_default<T>(value: serde_json::Value) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        Ok(T::default())
    } else {
        serde_json::from_value(value)
    }
}
