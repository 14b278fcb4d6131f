//! Roadmap session: the single owner of a mounted roadmap's tracking state.
//!
//! `RoadmapSession` is the central coordinator:
//! 1. Loads persisted positions and statuses (falling back to defaults).
//! 2. Builds the graph, initialises missing statuses, and lays it out.
//! 3. Applies user actions (status changes, drags, clicks) to its own state.
//! 4. Hands full-map snapshots of that state to a [`PersistenceWriter`].
//!
//! Every write payload is cloned from the session's own maps at the moment
//! of dispatch, so a write can never carry an outdated view of the roadmap.

use std::sync::Arc;

use store::{NodePositions, Position, RoadmapStore, StepStatus, StepStatusMap};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::graph::build_graph;
use crate::layout::{apply_layout, LayoutConfig, LayoutMode};
use crate::models::{Edge, GraphMode, Node, RoadmapGraph, RoadmapStep};
use crate::status;
use crate::writer::PersistenceWriter;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Host integration
// ---------------------------------------------------------------------------

/// Callbacks a host can register to mirror session activity.
///
/// All methods default to no-ops.
pub trait SessionObserver: Send + Sync {
    fn on_status_change(&self, _step_id: &str, _status: StepStatus) {}
    fn on_positions_change(&self, _positions: &NodePositions) {}
    fn on_node_click(&self, _step: &RoadmapStep) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// What the host knows about the roadmap when mounting it.
#[derive(Debug, Clone, Default)]
pub struct SessionInput {
    pub steps: Vec<RoadmapStep>,
    /// `None` for a roadmap that has not been saved yet.
    pub roadmap_id: Option<Uuid>,
    /// Used when there is no roadmap id or loading fails.
    pub initial_positions: NodePositions,
    /// Used when there is no roadmap id or loading fails.
    pub initial_status: StepStatusMap,
}

impl SessionInput {
    pub fn new(steps: Vec<RoadmapStep>) -> Self {
        Self { steps, ..Self::default() }
    }

    pub fn with_roadmap_id(mut self, roadmap_id: Uuid) -> Self {
        self.roadmap_id = Some(roadmap_id);
        self
    }

    pub fn with_positions(mut self, positions: NodePositions) -> Self {
        self.initial_positions = positions;
        self
    }

    pub fn with_status(mut self, status: StepStatusMap) -> Self {
        self.initial_status = status;
        self
    }
}

/// Tuning knobs for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub layout: LayoutConfig,
}

// ---------------------------------------------------------------------------
// RoadmapSession
// ---------------------------------------------------------------------------

pub struct RoadmapSession {
    roadmap_id: Option<Uuid>,
    config: SessionConfig,
    mode: GraphMode,
    layout_mode: LayoutMode,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    status: StepStatusMap,
    /// Last positions map restored or persisted; empty means "auto-layout".
    positions: NodePositions,
    dragging: Option<String>,
    writer: Option<PersistenceWriter>,
    observer: Arc<dyn SessionObserver>,
}

impl RoadmapSession {
    /// Mount a roadmap.
    ///
    /// Persistence is enabled only when both a roadmap id and a store are
    /// given.  A failed load is logged and treated as "no prior state"; in
    /// that case nothing is written back until the user acts.
    #[instrument(skip_all, fields(roadmap_id = ?input.roadmap_id, steps = input.steps.len()))]
    pub async fn open(
        input: SessionInput,
        store: Option<Arc<dyn RoadmapStore>>,
        observer: Arc<dyn SessionObserver>,
        config: SessionConfig,
    ) -> Self {
        let SessionInput {
            steps,
            roadmap_id,
            initial_positions,
            initial_status,
        } = input;

        let backend = match (roadmap_id, store) {
            (Some(id), Some(store)) => Some((id, store)),
            (Some(id), None) => {
                debug!("no store configured for roadmap {}; tracking in memory only", id);
                None
            }
            (None, _) => {
                debug!("roadmap not saved yet; tracking in memory only");
                None
            }
        };

        let mut loaded = false;
        let (positions, saved_status) = match &backend {
            Some((id, store)) => match store.load_state(*id).await {
                Ok(state) => {
                    loaded = true;
                    info!(
                        "loaded {} positions and {} statuses for roadmap {}",
                        state.positions.len(),
                        state.status.len(),
                        id
                    );
                    (state.positions, state.status)
                }
                Err(e) => {
                    warn!("failed to load state for roadmap {}, starting fresh: {}", id, e);
                    (initial_positions, initial_status)
                }
            },
            None => (initial_positions, initial_status),
        };

        let graph = build_graph(&steps);
        let (status, added) =
            status::initialize_missing(&saved_status, graph.nodes.iter().map(|n| n.id.as_str()));

        let writer = backend.map(|(id, store)| PersistenceWriter::spawn(store, id));

        let mut session = Self {
            roadmap_id,
            config,
            mode: graph.mode,
            layout_mode: LayoutMode::Auto,
            nodes: graph.nodes,
            edges: graph.edges,
            status,
            positions,
            dragging: None,
            writer,
            observer,
        };
        session.relayout();
        session.refresh_visuals();

        if added > 0 && loaded {
            debug!("initialised {} missing statuses; writing back", added);
            session.persist_status();
        }

        session
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn roadmap_id(&self) -> Option<Uuid> {
        self.roadmap_id
    }

    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The authoritative status map, stale entries included.
    pub fn status_map(&self) -> &StepStatusMap {
        &self.status
    }

    pub fn status_of(&self, id: &str) -> StepStatus {
        status::status_of(&self.status, id)
    }

    /// Current position of every node.
    pub fn node_positions(&self) -> NodePositions {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }

    /// Percentage of steps completed.
    pub fn progress(&self) -> u8 {
        status::progress(&self.status, self.nodes.iter().map(|n| n.id.as_str()))
    }

    /// Render-ready snapshot of the whole roadmap.
    pub fn graph(&self) -> RoadmapGraph {
        RoadmapGraph {
            mode: self.mode,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            progress: self.progress(),
        }
    }

    /// Persistence writes dispatched but not yet finished.
    pub fn pending_writes(&self) -> usize {
        self.writer.as_ref().map_or(0, PersistenceWriter::pending)
    }

    /// Whether the "saving" indicator should be shown.
    pub fn is_saving(&self) -> bool {
        self.pending_writes() > 0
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Set the status of one step and persist the whole map.
    ///
    /// # Errors
    /// [`EngineError::UnknownStep`] if `id` is not a node of this roadmap.
    pub fn set_status(&mut self, id: &str, new_status: StepStatus) -> Result<(), EngineError> {
        let index = self.index_of(id)?;

        self.status = status::set_status(&self.status, id, new_status);

        let node = &mut self.nodes[index];
        node.status = new_status;
        node.color = status::node_color(new_status).to_owned();
        status::refresh_edges(&mut self.edges, &self.status);

        debug!("step '{}' is now {}", id, new_status);
        self.observer.on_status_change(id, new_status);
        self.persist_status();
        Ok(())
    }

    /// Move a step to the next status in the cycle and return it.
    pub fn advance(&mut self, id: &str) -> Result<StepStatus, EngineError> {
        let next = self.status_of(id).advance();
        self.set_status(id, next)?;
        Ok(next)
    }

    /// Move a node during a drag.  Nothing is persisted until [`end_drag`](Self::end_drag).
    pub fn drag(&mut self, id: &str, position: Position) -> Result<(), EngineError> {
        let index = self.index_of(id)?;
        self.nodes[index].position = position;
        self.dragging = Some(id.to_owned());
        Ok(())
    }

    /// Finish the current drag and persist every node's position.
    ///
    /// Returns `false` when no drag was in progress.
    pub fn end_drag(&mut self) -> bool {
        let Some(id) = self.dragging.take() else {
            return false;
        };

        self.positions = self.node_positions();
        self.layout_mode = LayoutMode::Restored;
        debug!("drag of '{}' ended; saving {} positions", id, self.positions.len());

        self.observer.on_positions_change(&self.positions);
        match &self.writer {
            Some(writer) => writer.save_positions(self.positions.clone()),
            None => debug!("roadmap not saved yet; keeping positions in session only"),
        }
        true
    }

    /// Look up the step behind a clicked node and notify the observer.
    pub fn click(&self, id: &str) -> Result<&RoadmapStep, EngineError> {
        let step = &self.nodes[self.index_of(id)?].step;
        self.observer.on_node_click(step);
        Ok(step)
    }

    /// Swap in a new step list, keeping statuses and saved positions.
    ///
    /// Newly introduced steps start `pending`; entries for removed steps are kept.
    pub fn replace_steps(&mut self, steps: &[RoadmapStep]) {
        let graph = build_graph(steps);
        let (status, added) =
            status::initialize_missing(&self.status, graph.nodes.iter().map(|n| n.id.as_str()));

        self.mode = graph.mode;
        self.nodes = graph.nodes;
        self.edges = graph.edges;
        self.status = status;
        self.dragging = None;
        self.relayout();
        self.refresh_visuals();

        if added > 0 {
            self.persist_status();
        }
    }

    /// Stop issuing writes and wait for queued ones to finish.
    pub async fn shutdown(self) {
        if let Some(writer) = self.writer {
            writer.close().await;
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn index_of(&self, id: &str) -> Result<usize, EngineError> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| EngineError::UnknownStep(id.to_owned()))
    }

    fn relayout(&mut self) {
        self.layout_mode =
            apply_layout(&mut self.nodes, &self.edges, &self.positions, &self.config.layout);
    }

    fn refresh_visuals(&mut self) {
        status::apply_to_nodes(&mut self.nodes, &self.status);
        status::refresh_edges(&mut self.edges, &self.status);
    }

    fn persist_status(&self) {
        match &self.writer {
            Some(writer) => writer.save_status(self.status.clone()),
            None => debug!("roadmap not saved yet; keeping status in session only"),
        }
    }
}
