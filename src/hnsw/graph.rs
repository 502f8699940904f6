//! HNSW graph storage and configuration.
//!
//! [`Config`] defines the tuning parameters (M, the per-layer caps, beam
//! width, level cap, distance function). [`HnswGraph`] stores the graph
//! itself using a Struct-of-Arrays layout for cache efficiency: one
//! contiguous `f32` vector arena plus parallel arrays for neighbor lists and
//! layer assignments. Neighbor lists hold node ids, so the store is the arena
//! and edges never form reference cycles.

use crate::config;
use crate::error::{Error, Result};
use crate::hnsw::distance::{euclidean_sq, DistanceFn};
use std::fmt;
use std::sync::Arc;

/// Uniform source for the level draw. Stateful generators are allowed; the
/// graph only invokes it under the caller's write lock.
pub type RandomSource = Box<dyn FnMut() -> f64 + Send + Sync>;

/// Configuration parameters for an HNSW index.
///
/// Controls the trade-off between build speed, search speed, recall, and
/// memory usage.
#[derive(Clone)]
pub struct Config {
    /// Number of established connections per node during construction.
    pub m: usize,
    /// Cap on connections per node for layers above zero.
    pub m_max: usize,
    /// Cap on connections per node at layer 0.
    pub m_max0: usize,
    /// Beam width while connecting a new node.
    pub ef_construction: usize,
    /// Cap on any node's top level.
    pub max_level: usize,
    /// Distance function: symmetric, non-negative, lower is closer.
    pub distance: DistanceFn,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            m: config::DEFAULT_M,
            m_max: config::DEFAULT_M_MAX,
            m_max0: config::DEFAULT_M_MAX0,
            ef_construction: config::DEFAULT_EF_CONSTRUCTION,
            max_level: config::DEFAULT_MAX_LEVEL,
            distance: Arc::new(euclidean_sq),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("m", &self.m)
            .field("m_max", &self.m_max)
            .field("m_max0", &self.m_max0)
            .field("ef_construction", &self.ef_construction)
            .field("max_level", &self.max_level)
            .field("distance", &"<fn>")
            .finish()
    }
}

impl Config {
    /// Validates every field, returning [`Error::ConfigInvalid`] on the first
    /// violation.
    pub fn validate(&self) -> Result<()> {
        if self.m == 0 {
            return Err(Error::ConfigInvalid("m must be positive".into()));
        }
        if self.m_max == 0 {
            return Err(Error::ConfigInvalid("m_max must be positive".into()));
        }
        if self.m_max0 == 0 {
            return Err(Error::ConfigInvalid("m_max0 must be positive".into()));
        }
        if self.ef_construction == 0 {
            return Err(Error::ConfigInvalid(
                "ef_construction must be positive".into(),
            ));
        }
        if self.max_level == 0 {
            return Err(Error::ConfigInvalid("max_level must be positive".into()));
        }
        if self.max_level > config::MAX_LEVEL_LIMIT {
            return Err(Error::ConfigInvalid(format!(
                "max_level must not exceed {}",
                config::MAX_LEVEL_LIMIT
            )));
        }
        Ok(())
    }
}

/// HNSW graph using Struct-of-Arrays layout.
///
/// Append-only: nodes are never deleted, and a node's id, vector, and level
/// never change after insertion. Only neighbor lists are mutated, and only
/// through `&mut self` (the [`Index`](crate::Index) handle serializes those
/// calls behind its write lock).
pub struct HnswGraph {
    pub(crate) config: Config,
    /// Level-distribution normalizer, `1 / ln(M)`.
    ml: f64,
    /// Vector arena: node `i` occupies `[i * dim, (i + 1) * dim)`.
    vectors: Vec<f32>,
    /// `neighbors[node][layer]` holds the neighbor ids of `node` at `layer`.
    neighbors: Vec<Vec<Vec<u32>>>,
    /// Top layer of each node.
    levels: Vec<u8>,
    /// Established by the first insert; all later vectors must match.
    dimension: Option<usize>,
    /// Highest-level node, earliest insertion on ties.
    entry_point: Option<u32>,
    rand_fn: RandomSource,
}

/// Portable software prefetch hint (L1 cache, read).
/// No-op on unsupported platforms.
#[inline(always)]
fn prefetch_read(ptr: *const u8) {
    #[cfg(target_arch = "aarch64")]
    unsafe {
        std::arch::asm!(
            "prfm pldl1keep, [{ptr}]",
            ptr = in(reg) ptr,
            options(nostack, preserves_flags)
        );
    }
    #[cfg(target_arch = "x86_64")]
    unsafe {
        std::arch::x86_64::_mm_prefetch(ptr as *const i8, std::arch::x86_64::_MM_HINT_T0);
    }
    #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
    let _ = ptr;
}

impl HnswGraph {
    /// Creates an empty graph after validating the configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let ml = 1.0 / (config.m as f64).ln();
        Ok(Self {
            config,
            ml,
            vectors: Vec::new(),
            neighbors: Vec::new(),
            levels: Vec::new(),
            dimension: None,
            entry_point: None,
            rand_fn: Box::new(rand::random::<f64>),
        })
    }

    /// Number of nodes in the store.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns `true` if the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Dimension established by the first insert, `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Id of the entry point: the highest-level node, earliest on ties.
    pub fn entry_point(&self) -> Option<u32> {
        self.entry_point
    }

    /// Top layer of the given node.
    #[inline]
    pub fn level_of(&self, id: u32) -> usize {
        self.levels[id as usize] as usize
    }

    /// The stored vector of the given node. O(1) slice into the arena.
    #[inline]
    pub fn vector(&self, id: u32) -> &[f32] {
        let dim = self.dimension.expect("non-empty store has a dimension");
        let start = id as usize * dim;
        &self.vectors[start..start + dim]
    }

    /// Neighbor ids of `id` at `layer`; empty above the node's top layer.
    #[inline]
    pub fn neighbor_list(&self, id: u32, layer: usize) -> &[u32] {
        let lists = &self.neighbors[id as usize];
        if layer < lists.len() {
            &lists[layer]
        } else {
            &[]
        }
    }

    /// Draws the level for a new node: `min(⌊−ln(u) · mL⌋, max_level)` with
    /// `u` from the injected uniform source. The exponential decay keeps the
    /// expected per-level population shrinking by a factor of `M` per layer.
    pub fn random_level(&mut self) -> usize {
        let u = (self.rand_fn)();
        // A zero draw maps to an unbounded level; the cast saturates and the
        // min() clamps it, so the degenerate draw still yields max_level.
        let level = (-u.ln() * self.ml).floor() as usize;
        level.min(self.config.max_level)
    }

    /// Replaces the uniform source used by [`random_level`](Self::random_level).
    pub fn set_random_source(&mut self, source: RandomSource) {
        self.rand_fn = source;
    }

    /// Appends a node with empty neighbor lists for layers `0..=level`.
    /// The first append establishes the index dimension.
    pub(crate) fn append_node(&mut self, vector: &[f32], level: usize) {
        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }
        debug_assert_eq!(self.dimension, Some(vector.len()));

        self.vectors.extend_from_slice(vector);
        let mut layer_lists = Vec::with_capacity(level + 1);
        for _ in 0..=level {
            layer_lists.push(Vec::new());
        }
        self.neighbors.push(layer_lists);
        self.levels.push(level as u8);
    }

    pub(crate) fn set_entry_point(&mut self, id: u32) {
        self.entry_point = Some(id);
    }

    pub(crate) fn set_neighbor_list(&mut self, id: u32, layer: usize, list: Vec<u32>) {
        self.neighbors[id as usize][layer] = list;
    }

    pub(crate) fn push_neighbor(&mut self, id: u32, layer: usize, neighbor: u32) {
        self.neighbors[id as usize][layer].push(neighbor);
    }

    pub(crate) fn take_neighbor_list(&mut self, id: u32, layer: usize) -> Vec<u32> {
        std::mem::take(&mut self.neighbors[id as usize][layer])
    }

    /// Prefetch a node's vector data into L1 cache.
    /// Pulls a second cache line for vectors longer than 16 floats.
    #[inline(always)]
    pub fn prefetch_vector(&self, id: u32) {
        let Some(dim) = self.dimension else { return };
        let start = id as usize * dim;
        if start < self.vectors.len() {
            let ptr = unsafe { self.vectors.as_ptr().add(start) as *const u8 };
            prefetch_read(ptr);
            if dim > 16 {
                prefetch_read(unsafe { ptr.add(64) });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.m, 16);
        assert_eq!(cfg.m_max, 32);
        assert_eq!(cfg.m_max0, 64);
        assert_eq!(cfg.ef_construction, 200);
        assert_eq!(cfg.max_level, 16);
    }

    #[test]
    fn test_config_rejects_zero_fields() {
        for field in ["m", "m_max", "m_max0", "ef_construction", "max_level"] {
            let mut cfg = Config::default();
            match field {
                "m" => cfg.m = 0,
                "m_max" => cfg.m_max = 0,
                "m_max0" => cfg.m_max0 = 0,
                "ef_construction" => cfg.ef_construction = 0,
                "max_level" => cfg.max_level = 0,
                _ => unreachable!(),
            }
            let err = cfg.validate().unwrap_err();
            assert!(
                matches!(err, Error::ConfigInvalid(ref msg) if msg.starts_with(field)),
                "{field}: {err}"
            );
        }
    }

    #[test]
    fn test_config_rejects_oversized_max_level() {
        let cfg = Config {
            max_level: 256,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn test_new_graph_rejects_invalid_config() {
        let cfg = Config {
            m: 0,
            ..Config::default()
        };
        assert!(HnswGraph::new(cfg).is_err());
    }

    #[test]
    fn test_new_graph_is_empty() {
        let g = HnswGraph::new(Config::default()).unwrap();
        assert!(g.is_empty());
        assert_eq!(g.len(), 0);
        assert!(g.dimension().is_none());
        assert!(g.entry_point().is_none());
    }

    #[test]
    fn test_append_node_establishes_dimension() {
        let mut g = HnswGraph::new(Config::default()).unwrap();
        g.append_node(&[1.0, 2.0, 3.0], 2);
        assert_eq!(g.dimension(), Some(3));
        assert_eq!(g.len(), 1);
        assert_eq!(g.level_of(0), 2);
        assert_eq!(g.vector(0), &[1.0, 2.0, 3.0]);
        // Empty neighbor lists for layers 0..=2, empty slice above.
        for layer in 0..=2 {
            assert!(g.neighbor_list(0, layer).is_empty());
        }
        assert!(g.neighbor_list(0, 7).is_empty());
    }

    #[test]
    fn test_vector_slicing_across_arena() {
        let mut g = HnswGraph::new(Config::default()).unwrap();
        g.append_node(&[1.0, 2.0], 0);
        g.append_node(&[3.0, 4.0], 0);
        g.append_node(&[5.0, 6.0], 1);
        assert_eq!(g.vector(0), &[1.0, 2.0]);
        assert_eq!(g.vector(1), &[3.0, 4.0]);
        assert_eq!(g.vector(2), &[5.0, 6.0]);
    }

    #[test]
    fn test_random_level_respects_cap() {
        let mut g = HnswGraph::new(Config::default()).unwrap();
        for _ in 0..1000 {
            assert!(g.random_level() <= g.config.max_level);
        }
    }

    #[test]
    fn test_random_level_formula() {
        let mut g = HnswGraph::new(Config::default()).unwrap();
        // u = exp(-(l + 0.5) / mL) lands in the middle of level l's bucket.
        let ml = 1.0 / 16f64.ln();
        for want in [0usize, 1, 3, 7] {
            let u = (-(want as f64 + 0.5) / ml).exp();
            g.set_random_source(Box::new(move || u));
            assert_eq!(g.random_level(), want);
        }
    }

    #[test]
    fn test_random_level_degenerate_draw_clamps() {
        let mut g = HnswGraph::new(Config::default()).unwrap();
        g.set_random_source(Box::new(|| 0.0));
        assert_eq!(g.random_level(), g.config.max_level);
    }

    #[test]
    fn test_prefetch_no_panic() {
        let mut g = HnswGraph::new(Config::default()).unwrap();
        g.prefetch_vector(0); // empty store: no-op
        let v: Vec<f32> = (0..32).map(|i| i as f32).collect();
        g.append_node(&v, 0);
        g.prefetch_vector(0);
    }
}
