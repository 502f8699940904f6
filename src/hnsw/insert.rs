//! HNSW insertion.
//!
//! Two phases after the level draw: a greedy descent from the entry point's
//! level down to the new node's level + 1, then a per-layer beam search that
//! supplies the new node's neighbors from `min(L, l)` down to 0. Links are
//! bidirectional; a back-link that pushes a neighbor over its cap triggers a
//! re-rank of that neighbor's list, keeping the cap closest. Pruned edges are
//! not mirrored on the discarded endpoint; later pruning passes restore
//! symmetry lazily.

use ordered_float::OrderedFloat;

use crate::error::{Error, Result};
use crate::hnsw::graph::HnswGraph;
use crate::hnsw::heap::with_scratch;
use crate::hnsw::search::{greedy_search, search_layer};

impl HnswGraph {
    /// Inserts one vector under the caller's write lock.
    ///
    /// Ids are assigned densely in insertion order, so `id` must equal
    /// [`len`](Self::len) at the time of the call. All validation happens
    /// before any mutation; the mutation path cannot fail, so an error leaves
    /// the graph untouched.
    pub fn insert(&mut self, vector: &[f32], id: u32) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::EmptyVector);
        }
        if let Some(dim) = self.dimension() {
            if vector.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
        }
        let next = self.len() as u32;
        if id < next {
            return Err(Error::DuplicateId(id));
        }
        if id > next {
            return Err(Error::NonContiguousId { id, expected: next });
        }

        let level = self.random_level();
        let first = self.is_empty();
        self.append_node(vector, level);

        if first {
            self.set_entry_point(id);
            return Ok(());
        }

        let entry = self
            .entry_point()
            .expect("non-empty graph has an entry point");
        let top = self.level_of(entry);

        // Phase 1: descend greedily to just above the new node's level.
        let mut ep = entry;
        for lc in ((level + 1)..=top).rev() {
            ep = greedy_search(self, vector, ep, lc);
        }

        // Phase 2: connect at each layer from min(L, l) down to 0.
        let ef = self.config.ef_construction;
        with_scratch(|scratch| {
            for lc in (0..=level.min(top)).rev() {
                let found = search_layer(self, vector, ep, ef, lc, scratch, &|_| true);

                let cap = if lc == 0 {
                    self.config.m_max0
                } else {
                    self.config.m_max
                };

                // Closest-first selection, capped at the layer limit.
                let selected: Vec<u32> = found.iter().take(cap).map(|&(_, nid)| nid).collect();
                for &neighbor in &selected {
                    self.link_back(neighbor, id, lc, cap);
                }
                self.set_neighbor_list(id, lc, selected);

                // The closest member of W seeds the next lower layer.
                if let Some(&(_, nearest)) = found.first() {
                    ep = nearest;
                }
            }
        });

        if level > top {
            self.set_entry_point(id);
        }
        Ok(())
    }

    /// Appends `new_neighbor` to `node`'s list at `layer`; if the list now
    /// exceeds `cap`, re-ranks it by distance from `node` and keeps the `cap`
    /// closest. The discarded endpoints keep their edge to `node`.
    fn link_back(&mut self, node: u32, new_neighbor: u32, layer: usize, cap: usize) {
        self.push_neighbor(node, layer, new_neighbor);
        if self.neighbor_list(node, layer).len() <= cap {
            return;
        }

        let dist = self.config.distance.clone();
        let dist = dist.as_ref();
        let current = self.take_neighbor_list(node, layer);
        let mut ranked: Vec<(f32, u32)> = current
            .into_iter()
            .map(|c| (dist(self.vector(node), self.vector(c)), c))
            .collect();
        ranked.sort_unstable_by_key(|&(d, c)| (OrderedFloat(d), c));
        ranked.truncate(cap);
        self.set_neighbor_list(node, layer, ranked.into_iter().map(|(_, c)| c).collect());
    }
}
