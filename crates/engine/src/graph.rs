//! Step graph builder: derive nodes and edges from an ordered step list.
//!
//! Mode selection:
//! 1. If any step declares a non-empty `dependencies` list the graph is built
//!    in DAG mode: one edge `dep -> step` per dependency that names an
//!    existing step.  Dangling ids are dropped silently.
//! 2. Otherwise consecutive steps are chained into a single path.
//!
//! No cycle detection happens here; the layout engine copes with cycles.

use std::collections::HashSet;

use store::{Position, StepStatus};
use tracing::{debug, warn};

use crate::models::{Anchor, Edge, GraphMode, Node, RoadmapStep};
use crate::status;

/// Nodes and edges derived from a step list, before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct StepGraph {
    pub mode: GraphMode,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Build the graph for `steps`, one node per step in input order.
///
/// Steps with an empty id are given their input index as id.  A step whose
/// id is already taken is skipped with a warning; [`normalize_steps`] output
/// never contains such steps.  Every node starts `pending` at the origin;
/// every edge starts with the pending visual.
///
/// [`normalize_steps`]: crate::schema::normalize_steps
pub fn build_graph(steps: &[RoadmapStep]) -> StepGraph {
    let mut seen: HashSet<String> = HashSet::new();
    let nodes: Vec<Node> = steps
        .iter()
        .enumerate()
        .filter_map(|(index, step)| {
            let mut step = step.clone();
            if step.id.trim().is_empty() {
                step.id = index.to_string();
            }
            if !seen.insert(step.id.clone()) {
                warn!("skipping step {} ('{}'): id '{}' is already taken", index, step.title, step.id);
                return None;
            }
            Some(Node {
                id: step.id.clone(),
                step,
                position: Position::default(),
                status: StepStatus::Pending,
                color: status::node_color(StepStatus::Pending).to_owned(),
                target_anchor: Anchor::Top,
                source_anchor: Anchor::Bottom,
            })
        })
        .collect();

    let dag_mode = nodes.iter().any(|n| !n.step.dependencies.is_empty());

    let edges = if dag_mode {
        dependency_edges(&nodes)
    } else {
        nodes
            .windows(2)
            .map(|pair| make_edge(&pair[0].id, &pair[1].id))
            .collect()
    };

    StepGraph {
        mode: if dag_mode { GraphMode::Dag } else { GraphMode::Linear },
        nodes,
        edges,
    }
}

fn dependency_edges(nodes: &[Node]) -> Vec<Edge> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut emitted: HashSet<(&str, &str)> = HashSet::new();
    let mut edges = Vec::new();

    for node in nodes {
        for dep in &node.step.dependencies {
            if !ids.contains(dep.as_str()) {
                debug!("dropping dangling dependency '{}' of step '{}'", dep, node.id);
                continue;
            }
            if emitted.insert((dep.as_str(), node.id.as_str())) {
                edges.push(make_edge(dep, &node.id));
            }
        }
    }

    edges
}

fn make_edge(source: &str, target: &str) -> Edge {
    Edge {
        id: format!("e{source}-{target}"),
        source: source.to_owned(),
        target: target.to_owned(),
        visual: status::edge_visual(StepStatus::Pending),
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn edge_pairs(graph: &StepGraph) -> Vec<(&str, &str)> {
        graph
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect()
    }

    #[test]
    fn steps_without_dependencies_form_a_path() {
        let steps: Vec<RoadmapStep> = (0..5)
            .map(|i| RoadmapStep::new(i.to_string(), format!("step {i}")))
            .collect();

        let graph = build_graph(&steps);
        assert_eq!(graph.mode, GraphMode::Linear);
        assert_eq!(graph.edges.len(), 4);
        assert_eq!(
            edge_pairs(&graph),
            vec![("0", "1"), ("1", "2"), ("2", "3"), ("3", "4")]
        );
        assert_eq!(graph.edges[0].id, "e0-1");
    }

    #[test]
    fn single_step_has_no_edges() {
        let graph = build_graph(&[RoadmapStep::new("solo", "Solo")]);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn empty_input_gives_empty_graph() {
        let graph = build_graph(&[]);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn dependencies_switch_to_dag_mode() {
        let steps = vec![
            RoadmapStep::new("0", "A"),
            RoadmapStep::new("1", "B").depends_on(["0"]),
            RoadmapStep::new("2", "C").depends_on(["0"]),
        ];

        let graph = build_graph(&steps);
        assert_eq!(graph.mode, GraphMode::Dag);
        assert_eq!(edge_pairs(&graph), vec![("0", "1"), ("0", "2")]);
    }

    #[test]
    fn one_declared_dependency_disables_linear_chaining() {
        // Only "2" declares anything, so "0" and "1" stay unconnected.
        let steps = vec![
            RoadmapStep::new("0", "A"),
            RoadmapStep::new("1", "B"),
            RoadmapStep::new("2", "C").depends_on(["0"]),
        ];

        let graph = build_graph(&steps);
        assert_eq!(edge_pairs(&graph), vec![("0", "2")]);
    }

    #[test]
    fn dangling_dependency_is_dropped() {
        let steps = vec![
            RoadmapStep::new("a", "A"),
            RoadmapStep::new("b", "B").depends_on(["a", "ghost"]),
        ];

        let graph = build_graph(&steps);
        assert_eq!(edge_pairs(&graph), vec![("a", "b")]);
    }

    #[test]
    fn repeated_dependency_yields_one_edge() {
        let steps = vec![
            RoadmapStep::new("a", "A"),
            RoadmapStep::new("b", "B").depends_on(["a", "a"]),
        ];
        assert_eq!(build_graph(&steps).edges.len(), 1);
    }

    #[test]
    fn missing_ids_fall_back_to_input_index() {
        let steps = vec![RoadmapStep::new("", "A"), RoadmapStep::new("", "B")];

        let graph = build_graph(&steps);
        assert_eq!(graph.nodes[0].id, "0");
        assert_eq!(graph.nodes[1].id, "1");
        assert_eq!(graph.nodes[1].step.id, "1");
        assert_eq!(edge_pairs(&graph), vec![("0", "1")]);
    }

    #[test]
    fn fallback_id_colliding_with_explicit_id_is_skipped() {
        let steps = vec![
            RoadmapStep::new("1", "Explicit"),
            RoadmapStep::new("", "Falls back to 1"),
            RoadmapStep::new("2", "C"),
        ];

        let graph = build_graph(&steps);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(graph.nodes[0].step.title, "Explicit");
        assert_eq!(edge_pairs(&graph), vec![("1", "2")]);
    }

    #[test]
    fn self_dependency_is_drawn_as_a_loop() {
        let steps = vec![
            RoadmapStep::new("a", "A"),
            RoadmapStep::new("b", "B").depends_on(["b"]),
        ];

        let graph = build_graph(&steps);
        assert_eq!(graph.mode, GraphMode::Dag);
        assert_eq!(edge_pairs(&graph), vec![("b", "b")]);
    }

    #[test]
    fn nodes_keep_input_order_and_their_step() {
        let steps = vec![
            RoadmapStep::new("z", "Last alphabetically"),
            RoadmapStep::new("a", "First alphabetically"),
        ];

        let graph = build_graph(&steps);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(graph.nodes[0].step.title, "Last alphabetically");
        assert!(graph.nodes.iter().all(|n| n.status == StepStatus::Pending));
        assert!(graph.nodes.iter().all(|n| n.target_anchor == Anchor::Top));
        assert!(graph.nodes.iter().all(|n| n.source_anchor == Anchor::Bottom));
    }

    #[test]
    fn cyclic_dependencies_pass_through() {
        let steps = vec![
            RoadmapStep::new("a", "A").depends_on(["b"]),
            RoadmapStep::new("b", "B").depends_on(["a"]),
        ];
        assert_eq!(edge_pairs(&build_graph(&steps)), vec![("b", "a"), ("a", "b")]);
    }
}
