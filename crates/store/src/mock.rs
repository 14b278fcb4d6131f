//! `MemoryStore`: an in-memory test double for `RoadmapStore`.
//!
//! Useful in unit and integration tests where a real database is either
//! unavailable or irrelevant.  Every write is recorded in call order so tests
//! can assert on the exact payloads the engine dispatched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{NodePositions, RoadmapState, RoadmapStore, StepStatusMap, StoreError};

/// Behaviour injected into `MemoryStore` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Serve loads from memory and accept every write.
    Healthy,
    /// Fail every load with a backend error; writes still succeed.
    FailLoads(String),
    /// Fail every write with a backend error; loads still succeed.
    FailWrites(String),
}

/// One write received by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedWrite {
    Status(Uuid, StepStatusMap),
    Positions(Uuid, NodePositions),
}

/// A store that keeps roadmap state in a map and records every call it receives.
#[derive(Clone)]
pub struct MemoryStore {
    behaviour: MockBehaviour,
    roadmaps: Arc<Mutex<HashMap<Uuid, RoadmapState>>>,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
    loads: Arc<Mutex<Vec<Uuid>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    /// Create an empty store that accepts everything.
    pub fn new() -> Self {
        Self::with_behaviour(MockBehaviour::Healthy)
    }

    /// Create an empty store whose loads always fail.
    pub fn failing_loads(msg: impl Into<String>) -> Self {
        Self::with_behaviour(MockBehaviour::FailLoads(msg.into()))
    }

    /// Create an empty store whose writes always fail.
    pub fn failing_writes(msg: impl Into<String>) -> Self {
        Self::with_behaviour(MockBehaviour::FailWrites(msg.into()))
    }

    fn with_behaviour(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            roadmaps: Arc::new(Mutex::new(HashMap::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
            loads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seed the stored state for a roadmap.
    pub fn insert(&self, roadmap_id: Uuid, state: RoadmapState) {
        lock(&self.roadmaps).insert(roadmap_id, state);
    }

    /// Current stored state of a roadmap, if any.
    pub fn state(&self, roadmap_id: Uuid) -> Option<RoadmapState> {
        lock(&self.roadmaps).get(&roadmap_id).cloned()
    }

    /// All writes received so far, in call order.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        lock(&self.writes).clone()
    }

    /// Only the status payloads, in call order.
    pub fn status_writes(&self) -> Vec<StepStatusMap> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                RecordedWrite::Status(_, status) => Some(status),
                RecordedWrite::Positions(..) => None,
            })
            .collect()
    }

    /// Only the positions payloads, in call order.
    pub fn position_writes(&self) -> Vec<NodePositions> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                RecordedWrite::Positions(_, positions) => Some(positions),
                RecordedWrite::Status(..) => None,
            })
            .collect()
    }

    /// Number of times `load_state` has been called.
    pub fn load_count(&self) -> usize {
        lock(&self.loads).len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoadmapStore for MemoryStore {
    async fn load_state(&self, roadmap_id: Uuid) -> Result<RoadmapState, StoreError> {
        lock(&self.loads).push(roadmap_id);

        if let MockBehaviour::FailLoads(msg) = &self.behaviour {
            return Err(StoreError::Backend(msg.clone()));
        }

        lock(&self.roadmaps)
            .get(&roadmap_id)
            .cloned()
            .ok_or(StoreError::NotFound(roadmap_id))
    }

    async fn save_status(&self, roadmap_id: Uuid, status: &StepStatusMap) -> Result<(), StoreError> {
        lock(&self.writes).push(RecordedWrite::Status(roadmap_id, status.clone()));

        if let MockBehaviour::FailWrites(msg) = &self.behaviour {
            return Err(StoreError::Backend(msg.clone()));
        }

        lock(&self.roadmaps).entry(roadmap_id).or_default().status = status.clone();
        Ok(())
    }

    async fn save_positions(
        &self,
        roadmap_id: Uuid,
        positions: &NodePositions,
    ) -> Result<(), StoreError> {
        lock(&self.writes).push(RecordedWrite::Positions(roadmap_id, positions.clone()));

        if let MockBehaviour::FailWrites(msg) = &self.behaviour {
            return Err(StoreError::Backend(msg.clone()));
        }

        lock(&self.roadmaps).entry(roadmap_id).or_default().positions = positions.clone();
        Ok(())
    }
}
