//! Core domain models for the roadmap graph engine.
//!
//! `RoadmapStep` is the validated shape of one milestone as it comes out of
//! [`schema`](crate::schema).  `Node`, `Edge` and `RoadmapGraph` are derived
//! values: they are rebuilt from steps plus the persisted maps and are never
//! stored themselves.

use serde::{Deserialize, Serialize};
use store::{Position, StepStatus};

// ---------------------------------------------------------------------------
// RoadmapStep
// ---------------------------------------------------------------------------

/// Kind of a learning resource attached to a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    #[default]
    Article,
    Course,
    Documentation,
}

/// A link attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
}

/// One milestone in a career roadmap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStep {
    /// Unique within the roadmap.  An empty id is replaced by the step's
    /// input index when the graph is built.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_explanation: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Ids of prerequisite steps.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl RoadmapStep {
    /// Convenience constructor for tests and fixtures.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper to declare prerequisites.
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = ids.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// CapstoneProject
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Suggested final project that may accompany a generated roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapstoneProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Which side of a node box an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Bottom,
}

/// How edges were derived from the step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphMode {
    /// At least one step declared dependencies; edges follow them.
    Dag,
    /// No dependencies anywhere; steps form a single path in input order.
    Linear,
}

/// One visual vertex wrapping a roadmap step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// The step this node was built from, with its id filled in.
    pub step: RoadmapStep,
    pub position: Position,
    pub status: StepStatus,
    /// Fill color for the node body and the minimap.
    pub color: String,
    /// Incoming edges attach here.
    pub target_anchor: Anchor,
    /// Outgoing edges leave from here.
    pub source_anchor: Anchor,
}

/// Rendering hints for an edge, derived from its source node's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeVisual {
    pub animated: bool,
    pub color: String,
}

/// Directed edge from a prerequisite to its dependent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub visual: EdgeVisual,
}

/// Fully derived, render-ready snapshot of a roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapGraph {
    pub mode: GraphMode,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Percentage of steps marked completed, 0..=100.
    pub progress: u8,
}

impl RoadmapGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }
}
