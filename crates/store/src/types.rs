//! Persisted value types shared by the engine and every storage backend.
//!
//! Defined here (in the store crate) so both the engine and the backends can
//! import them without a circular dependency.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Top-left corner of a node in layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a single roadmap step.
///
/// Statuses only move forward through [`StepStatus::advance`], wrapping from
/// `Completed` back to `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl StepStatus {
    /// The next status in the `pending -> in-progress -> completed -> pending` cycle.
    pub fn advance(self) -> Self {
        match self {
            Self::Pending => Self::InProgress,
            Self::InProgress => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending    => write!(f, "pending"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed  => write!(f, "completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted maps
// ---------------------------------------------------------------------------

/// Node id → position.  Partial maps are valid.
pub type NodePositions = BTreeMap<String, Position>;

/// Node id → status.  Missing entries mean `pending`.
pub type StepStatusMap = BTreeMap<String, StepStatus>;

/// Everything a backend returns for one roadmap on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapState {
    #[serde(default)]
    pub positions: NodePositions,
    #[serde(default)]
    pub status: StepStatusMap,
}
