//! Layer traversal and multi-layer KNN search.
//!
//! Two routines walk a single layer: a greedy single-best descent used on the
//! upper layers (the ef = 1 case) and a bounded beam search used at the
//! connect and query layers. [`knn_search`] composes them: greedy from the
//! entry point's level down to layer 1, then one beam search at layer 0.
//!
//! The beam search supports an optional predicate: rejected nodes still steer
//! navigation but never enter the result set.

use crate::hnsw::graph::HnswGraph;
use crate::hnsw::heap::{with_scratch, SearchScratch};

/// Greedy single-best walk at `level`.
///
/// Moves to the first neighbor strictly closer to the query than the current
/// position and restarts; terminates at a local minimum. O(deg · hops).
pub fn greedy_search(graph: &HnswGraph, query: &[f32], entry: u32, level: usize) -> u32 {
    let dist = graph.config.distance.as_ref();
    let mut current = entry;
    let mut best = dist(query, graph.vector(current));

    loop {
        let mut improved = false;
        for &neighbor in graph.neighbor_list(current, level) {
            let d = dist(query, graph.vector(neighbor));
            if d < best {
                best = d;
                current = neighbor;
                improved = true;
                break; // first improvement restarts the scan
            }
        }
        if !improved {
            return current;
        }
    }
}

/// Bounded beam search at `level`.
///
/// Expands candidates closest-first while any candidate is closer than the
/// furthest of the best-so-far set, which is capped at `ef`. Returns the
/// survivors in ascending distance order; the worst case is just `{entry}`.
pub fn search_layer<F: Fn(u32) -> bool>(
    graph: &HnswGraph,
    query: &[f32],
    entry: u32,
    ef: usize,
    level: usize,
    scratch: &mut SearchScratch,
    filter: &F,
) -> Vec<(f32, u32)> {
    let dist = graph.config.distance.as_ref();
    let SearchScratch {
        visited,
        candidates,
        nearest,
    } = scratch;
    visited.begin(graph.len());
    candidates.reset();
    nearest.reset();

    let entry_dist = dist(query, graph.vector(entry));
    visited.mark(entry);
    candidates.push(entry_dist, entry);
    // Cached furthest-of-nearest; avoids a heap peek per admission check.
    let mut worst = f32::MAX;
    if filter(entry) {
        nearest.push(entry_dist, entry);
        worst = entry_dist;
    }

    while let Some((c_dist, c_id)) = candidates.peek() {
        // The closest unexpanded candidate is already further than the
        // furthest kept result: every remaining candidate is too.
        if c_dist > worst {
            break;
        }
        let _ = candidates.pop();

        let neighbor_ids = graph.neighbor_list(c_id, level);
        for i in 0..neighbor_ids.len() {
            if i + 1 < neighbor_ids.len() {
                graph.prefetch_vector(neighbor_ids[i + 1]);
            }
            let e = neighbor_ids[i];
            if !visited.mark(e) {
                continue;
            }
            let d = dist(query, graph.vector(e));
            if nearest.len() < ef || d < worst {
                candidates.push(d, e);
                if filter(e) {
                    nearest.push(d, e);
                    if nearest.len() > ef {
                        nearest.pop();
                    }
                    worst = nearest.peek().map_or(f32::MAX, |(w, _)| w);
                }
            }
        }
    }

    nearest.drain_ascending()
}

/// Multi-layer KNN search: greedy descent from the entry point's level down
/// to layer 1, then a beam search at layer 0 with width `max(ef, k)`.
///
/// Returns up to `k` `(distance, id)` pairs in ascending distance order,
/// empty iff the graph is empty. The filter applies at layer 0 only; upper
/// layers are pure navigation.
pub fn knn_search<F: Fn(u32) -> bool>(
    graph: &HnswGraph,
    query: &[f32],
    k: usize,
    ef: usize,
    filter: &F,
) -> Vec<(f32, u32)> {
    let Some(entry) = graph.entry_point() else {
        return Vec::new();
    };
    let ef = ef.max(k);

    let mut current = entry;
    for level in (1..=graph.level_of(entry)).rev() {
        current = greedy_search(graph, query, current, level);
    }

    let mut results =
        with_scratch(|scratch| search_layer(graph, query, current, ef, 0, scratch, filter));
    results.truncate(k);
    results
}
