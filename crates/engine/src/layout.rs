//! Layout engine: assign top-left coordinates to every node.
//!
//! Two paths:
//! 1. **Restore**: if any saved position exists, every node takes its saved
//!    position or the origin when it has none.  Auto-layout does not run.
//! 2. **Auto**: hierarchical top-to-bottom layout in three phases:
//!    - rank = longest path from a root (Kahn's algorithm; cycles are broken
//!      by releasing the lowest-index stuck node and ignoring its remaining
//!      incoming edges),
//!    - ordering within each rank by iterated barycenter sweeps,
//!    - coordinates on a grid with every rank centered horizontally.
//!
//! Output is fully deterministic for a given input.

use std::collections::{HashMap, VecDeque};

use store::{NodePositions, Position};
use tracing::debug;

use crate::models::{Edge, Node};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Spacing knobs for auto-layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Width of a node box.
    pub node_width: f64,
    /// Height of a node box.
    pub node_height: f64,
    /// Vertical gap between consecutive ranks.
    pub rank_separation: f64,
    /// Horizontal gap between nodes in the same rank.
    pub node_separation: f64,
    /// Upper bound on down+up barycenter sweep pairs.
    pub max_sweeps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 250.0,
            node_height: 80.0,
            rank_separation: 80.0,
            node_separation: 50.0,
            max_sweeps: 8,
        }
    }
}

/// Which path [`apply_layout`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Restored,
    Auto,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Position every node, from `saved` when it is non-empty, otherwise by auto-layout.
pub fn apply_layout(
    nodes: &mut [Node],
    edges: &[Edge],
    saved: &NodePositions,
    config: &LayoutConfig,
) -> LayoutMode {
    if !saved.is_empty() {
        for node in nodes.iter_mut() {
            node.position = saved.get(&node.id).copied().unwrap_or_default();
        }
        debug!("restored {} saved positions for {} nodes", saved.len(), nodes.len());
        return LayoutMode::Restored;
    }

    let positions = auto_layout(nodes, edges, config);
    for (node, position) in nodes.iter_mut().zip(positions) {
        node.position = position;
    }
    LayoutMode::Auto
}

/// Compute auto-layout positions, returned in node order.
pub fn auto_layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Vec<Position> {
    let graph = IndexGraph::new(nodes, edges);
    let ranks = graph.ranks();
    let mut layers = build_layers(&ranks);
    minimize_crossings(&mut layers, &graph, &ranks, config.max_sweeps);
    assign_coordinates(&layers, graph.len(), config)
}

/// Rank of each node (longest path from a root), in node order.
pub fn compute_ranks(nodes: &[Node], edges: &[Edge]) -> Vec<usize> {
    IndexGraph::new(nodes, edges).ranks()
}

// ---------------------------------------------------------------------------
// Index graph
// ---------------------------------------------------------------------------

/// Adjacency lists over node indices.  Edges naming unknown ids and
/// self-loops are skipped.
struct IndexGraph {
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
}

impl IndexGraph {
    fn new(nodes: &[Node], edges: &[Edge]) -> Self {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut succ = vec![Vec::new(); nodes.len()];
        let mut pred = vec![Vec::new(); nodes.len()];

        for edge in edges {
            if let (Some(&s), Some(&t)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
                if s == t {
                    continue;
                }
                succ[s].push(t);
                pred[t].push(s);
            }
        }

        Self { succ, pred }
    }

    fn len(&self) -> usize {
        self.succ.len()
    }

    // ── Phase 1: ranks ───────────────────────────────────────────────

    fn ranks(&self) -> Vec<usize> {
        let n = self.len();
        let mut in_degree: Vec<usize> = self.pred.iter().map(Vec::len).collect();
        let mut rank = vec![0usize; n];
        let mut queued = vec![false; n];
        let mut done = vec![false; n];
        let mut finished = 0;

        let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
        for &v in &queue {
            queued[v] = true;
        }

        while finished < n {
            let Some(u) = queue.pop_front().or_else(|| {
                // Everything left sits on a cycle; release the earliest node.
                let stuck = (0..n).find(|&v| !queued[v])?;
                debug!("cycle detected; releasing node #{} with {} unresolved inputs", stuck, in_degree[stuck]);
                queued[stuck] = true;
                Some(stuck)
            }) else {
                break;
            };

            done[u] = true;
            finished += 1;

            for &v in &self.succ[u] {
                if done[v] {
                    // Back edge into an already placed node.
                    continue;
                }
                rank[v] = rank[v].max(rank[u] + 1);
                in_degree[v] = in_degree[v].saturating_sub(1);
                if in_degree[v] == 0 && !queued[v] {
                    queued[v] = true;
                    queue.push_back(v);
                }
            }
        }

        rank
    }
}

// ── Phase 2: ordering within ranks ──────────────────────────────────

fn build_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().map_or(0, |max| max + 1);
    let mut layers = vec![Vec::new(); depth];
    for (v, &r) in ranks.iter().enumerate() {
        layers[r].push(v);
    }
    layers
}

/// Reorder `layers[r]` by the mean position of each node's neighbours in
/// `layers[reference]`.  Nodes without such neighbours keep their slot.
fn sweep_layer(
    layers: &mut [Vec<usize>],
    r: usize,
    reference: usize,
    neighbours: &[Vec<usize>],
    ranks: &[usize],
) {
    let slot: HashMap<usize, usize> = layers[reference]
        .iter()
        .enumerate()
        .map(|(i, &v)| (v, i))
        .collect();

    let mut scored: Vec<(usize, f64, usize)> = layers[r]
        .iter()
        .enumerate()
        .map(|(current, &v)| {
            let (sum, count) = neighbours[v]
                .iter()
                .filter(|&&w| ranks[w] == reference)
                .filter_map(|w| slot.get(w))
                .fold((0.0, 0usize), |(sum, count), &i| (sum + i as f64, count + 1));
            let score = if count == 0 { current as f64 } else { sum / count as f64 };
            (v, score, current)
        })
        .collect();

    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)));
    layers[r] = scored.into_iter().map(|(v, _, _)| v).collect();
}

/// Crossings between two adjacent layers, counted pairwise.
fn layer_crossings(upper: &[usize], lower: &[usize], graph: &IndexGraph) -> usize {
    let lower_slot: HashMap<usize, usize> = lower.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let lower_slot = &lower_slot;

    let segments: Vec<(usize, usize)> = upper
        .iter()
        .enumerate()
        .flat_map(move |(i, &u)| {
            graph.succ[u]
                .iter()
                .filter_map(move |v| lower_slot.get(v))
                .map(move |&j| (i, j))
        })
        .collect();

    let mut crossings = 0;
    for (k, &(a1, b1)) in segments.iter().enumerate() {
        for &(a2, b2) in &segments[k + 1..] {
            if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

fn total_crossings(layers: &[Vec<usize>], graph: &IndexGraph) -> usize {
    layers
        .windows(2)
        .map(|pair| layer_crossings(&pair[0], &pair[1], graph))
        .sum()
}

/// Iterated barycenter heuristic, keeping the best ordering seen.
fn minimize_crossings(
    layers: &mut Vec<Vec<usize>>,
    graph: &IndexGraph,
    ranks: &[usize],
    max_sweeps: usize,
) {
    if layers.len() < 2 {
        return;
    }

    let mut best = total_crossings(layers, graph);
    let mut best_layers = layers.clone();

    for _ in 0..max_sweeps {
        if best == 0 {
            break;
        }

        for r in 1..layers.len() {
            sweep_layer(layers, r, r - 1, &graph.pred, ranks);
        }
        for r in (0..layers.len() - 1).rev() {
            sweep_layer(layers, r, r + 1, &graph.succ, ranks);
        }

        let crossings = total_crossings(layers, graph);
        if crossings < best {
            best = crossings;
            best_layers = layers.clone();
        } else {
            break;
        }
    }

    *layers = best_layers;
}

// ── Phase 3: coordinates ────────────────────────────────────────────

fn assign_coordinates(layers: &[Vec<usize>], n: usize, config: &LayoutConfig) -> Vec<Position> {
    let column = config.node_width + config.node_separation;
    let row = config.node_height + config.rank_separation;

    let width_of = |count: usize| {
        if count == 0 {
            0.0
        } else {
            count as f64 * config.node_width + (count - 1) as f64 * config.node_separation
        }
    };
    let widest = layers.iter().map(|l| width_of(l.len())).fold(0.0_f64, f64::max);

    let mut positions = vec![Position::default(); n];
    for (r, layer) in layers.iter().enumerate() {
        let offset = (widest - width_of(layer.len())) / 2.0;
        for (i, &v) in layer.iter().enumerate() {
            positions[v] = Position::new(offset + i as f64 * column, r as f64 * row);
        }
    }
    positions
}
