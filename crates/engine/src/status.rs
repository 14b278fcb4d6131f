//! Status tracking: pure functions over the per-step status map.
//!
//! Every operation returns a fresh map instead of mutating in place, and the
//! derived visuals (node colors, edge animation, progress) are recomputed
//! from the whole map rather than patched incrementally.

use store::{StepStatus, StepStatusMap};

use crate::models::{Edge, EdgeVisual, Node};

const PENDING_NODE_COLOR: &str = "#64748b";
const IN_PROGRESS_NODE_COLOR: &str = "#f59e0b";
const COMPLETED_COLOR: &str = "#10b981";
const PENDING_EDGE_COLOR: &str = "#60a5fa";

/// Status of `id`, defaulting to `pending` when the map has no entry.
pub fn status_of(map: &StepStatusMap, id: &str) -> StepStatus {
    map.get(id).copied().unwrap_or_default()
}

/// Return a copy of `map` with `id` set to `status`.  Other keys are untouched.
pub fn set_status(map: &StepStatusMap, id: &str, status: StepStatus) -> StepStatusMap {
    let mut next = map.clone();
    next.insert(id.to_owned(), status);
    next
}

/// Return a copy of `map` with `id` moved one step along the status cycle.
pub fn advance(map: &StepStatusMap, id: &str) -> StepStatusMap {
    set_status(map, id, status_of(map, id).advance())
}

/// Add a `pending` entry for every id the map does not know yet.
///
/// Existing entries, including stale ones for ids no longer present, are
/// kept.  Returns the new map and how many entries were added.
pub fn initialize_missing<'a, I>(map: &StepStatusMap, ids: I) -> (StepStatusMap, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut next = map.clone();
    let mut added = 0;
    for id in ids {
        if !next.contains_key(id) {
            next.insert(id.to_owned(), StepStatus::Pending);
            added += 1;
        }
    }
    (next, added)
}

/// Percentage of `ids` whose status is `completed`, rounded to the nearest integer.
///
/// Stale map entries are ignored; an empty roadmap is 0% done.
pub fn progress<'a, I>(map: &StepStatusMap, ids: I) -> u8
where
    I: IntoIterator<Item = &'a str>,
{
    let (total, completed) = ids.into_iter().fold((0usize, 0usize), |(total, done), id| {
        let done = if status_of(map, id).is_completed() { done + 1 } else { done };
        (total + 1, done)
    });

    if total == 0 {
        return 0;
    }
    ((completed as f64 * 100.0) / total as f64).round() as u8
}

/// Fill color of a node (and its minimap marker) for the given status.
pub fn node_color(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => PENDING_NODE_COLOR,
        StepStatus::InProgress => IN_PROGRESS_NODE_COLOR,
        StepStatus::Completed => COMPLETED_COLOR,
    }
}

/// Visual of an edge whose source node has `source_status`.
pub fn edge_visual(source_status: StepStatus) -> EdgeVisual {
    if source_status.is_completed() {
        EdgeVisual { animated: false, color: COMPLETED_COLOR.to_owned() }
    } else {
        EdgeVisual { animated: true, color: PENDING_EDGE_COLOR.to_owned() }
    }
}

/// Copy statuses from `map` onto every node and refresh its color.
pub fn apply_to_nodes(nodes: &mut [Node], map: &StepStatusMap) {
    for node in nodes {
        node.status = status_of(map, &node.id);
        node.color = node_color(node.status).to_owned();
    }
}

/// Recompute the visual of every edge from its source node's status.
pub fn refresh_edges(edges: &mut [Edge], map: &StepStatusMap) {
    for edge in edges {
        edge.visual = edge_visual(status_of(map, &edge.source));
    }
}
