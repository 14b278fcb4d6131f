//! The `RoadmapStore` trait: what the graph engine needs from its environment.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{NodePositions, RoadmapState, StepStatusMap, StoreError};

/// Durable storage for the tracked fields of a saved roadmap.
///
/// Both save operations are idempotent full-map replacements keyed by the
/// roadmap id.  Implementations must never merge the incoming map with the
/// stored one.
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    /// Fetch the persisted positions and status map of a roadmap.
    async fn load_state(&self, roadmap_id: Uuid) -> Result<RoadmapState, StoreError>;

    /// Replace the stored status map with `status`.
    async fn save_status(&self, roadmap_id: Uuid, status: &StepStatusMap) -> Result<(), StoreError>;

    /// Replace the stored node positions with `positions`.
    async fn save_positions(
        &self,
        roadmap_id: Uuid,
        positions: &NodePositions,
    ) -> Result<(), StoreError>;
}
