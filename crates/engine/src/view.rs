//! One-shot assembly of a render-ready [`RoadmapGraph`].
//!
//! Used wherever there is no long-lived session: HTTP handlers and the CLI.

use store::{NodePositions, StepStatusMap};

use crate::graph::build_graph;
use crate::layout::{apply_layout, LayoutConfig};
use crate::models::{RoadmapGraph, RoadmapStep};
use crate::status;

/// Build, lay out and colour the graph for `steps` given the persisted maps.
pub fn assemble_graph(
    steps: &[RoadmapStep],
    positions: &NodePositions,
    status_map: &StepStatusMap,
    config: &LayoutConfig,
) -> RoadmapGraph {
    let mut graph = build_graph(steps);
    apply_layout(&mut graph.nodes, &graph.edges, positions, config);
    status::apply_to_nodes(&mut graph.nodes, status_map);
    status::refresh_edges(&mut graph.edges, status_map);

    let progress = status::progress(status_map, graph.nodes.iter().map(|n| n.id.as_str()));

    RoadmapGraph {
        mode: graph.mode,
        nodes: graph.nodes,
        edges: graph.edges,
        progress,
    }
}
