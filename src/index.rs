//! Thread-safe index handle and the search result record.
//!
//! [`Index`] wraps the graph in `Arc<RwLock<_>>`: cloning a handle is cheap
//! and shares the same index. Insertion holds the write lock for its full
//! duration; queries hold read locks, so concurrent queries run in parallel
//! and every query observes either the full pre-insert or full post-insert
//! state, never an intermediate one.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hnsw::graph::{Config, HnswGraph};
use crate::hnsw::search;

/// A single search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Caller-assigned id of the matched node.
    pub id: u32,
    /// Copy of the stored vector.
    pub vector: Vec<f32>,
    /// Distance to the query, as computed by the index's distance function.
    /// For the default squared Euclidean metric, take the square root to get
    /// the true Euclidean distance.
    pub distance: f32,
}

/// Shared handle to an HNSW index.
#[derive(Clone)]
pub struct Index {
    graph: Arc<RwLock<HnswGraph>>,
}

impl Index {
    /// Creates an empty index after validating the configuration.
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            graph: Arc::new(RwLock::new(HnswGraph::new(config)?)),
        })
    }

    /// Creates an empty index with the default configuration
    /// (M = 16, ef_construction = 200, squared Euclidean).
    pub fn with_defaults() -> Self {
        Self::new(Config::default()).expect("default configuration is valid")
    }

    /// Inserts one vector with a caller-assigned id.
    ///
    /// The first insert fixes the index dimension; ids are assigned densely
    /// in insertion order (0, 1, 2, …).
    pub fn insert(&self, vector: &[f32], id: u32) -> Result<()> {
        self.graph.write().insert(vector, id)
    }

    /// Returns up to `k` approximate nearest neighbors of `query`, closest
    /// first. `ef` is the beam width at layer 0 and is raised to `k` when
    /// smaller; larger values trade latency for recall.
    ///
    /// The result is empty iff the index is empty.
    pub fn knn_search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<Neighbor>> {
        self.knn_search_filtered(query, k, ef, |_| true)
    }

    /// [`knn_search`](Self::knn_search) with a predicate over node ids.
    /// Rejected nodes still steer graph navigation but never appear in the
    /// result, so the beam is not starved around filtered regions.
    pub fn knn_search_filtered<F>(
        &self,
        query: &[f32],
        k: usize,
        ef: usize,
        filter: F,
    ) -> Result<Vec<Neighbor>>
    where
        F: Fn(u32) -> bool,
    {
        if query.is_empty() {
            return Err(Error::EmptyVector);
        }
        if k == 0 {
            return Err(Error::InvalidK);
        }

        let graph = self.graph.read();
        if graph.is_empty() {
            return Ok(Vec::new());
        }
        let dim = graph
            .dimension()
            .expect("non-empty index has a dimension");
        if query.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }

        let hits = search::knn_search(&graph, query, k, ef, &filter);
        Ok(hits
            .into_iter()
            .map(|(distance, id)| Neighbor {
                id,
                vector: graph.vector(id).to_vec(),
                distance,
            })
            .collect())
    }

    /// Replaces the uniform source behind the level draw. Intended for
    /// deterministic tests; the source is only invoked under the write lock.
    pub fn set_random_source<F>(&self, source: F)
    where
        F: FnMut() -> f64 + Send + Sync + 'static,
    {
        self.graph.write().set_random_source(Box::new(source));
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.graph.read().len()
    }

    /// Returns `true` if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.graph.read().is_empty()
    }

    /// Dimension established by the first insert, `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.graph.read().dimension()
    }

    /// Id of the current entry point (the highest-level node, earliest
    /// insertion on ties), `None` while empty.
    pub fn entry_point(&self) -> Option<u32> {
        self.graph.read().entry_point()
    }

    /// Top layer of the given node, `None` if the id is out of range.
    pub fn level(&self, id: u32) -> Option<usize> {
        let graph = self.graph.read();
        if (id as usize) < graph.len() {
            Some(graph.level_of(id))
        } else {
            None
        }
    }

    /// Copy of the node's neighbor ids at `layer`; `None` if the id is out
    /// of range or `layer` exceeds the node's top layer.
    pub fn neighbors(&self, id: u32, layer: usize) -> Option<Vec<u32>> {
        let graph = self.graph.read();
        if (id as usize) >= graph.len() || layer > graph.level_of(id) {
            return None;
        }
        Some(graph.neighbor_list(id, layer).to_vec())
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::with_defaults()
    }
}
