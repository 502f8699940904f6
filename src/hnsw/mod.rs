//! Hierarchical Navigable Small World (HNSW) graph engine.
//!
//! The graph is a stack of navigable small-world layers: layer 0 holds every
//! node, each higher layer holds an exponentially thinning subset that acts as
//! a shortcut network. Insertion descends greedily through the upper layers,
//! then connects the new node bottom-up with a bounded beam search; queries
//! follow the same descent and finish with a beam search at layer 0.
//!
//! Storage uses a Struct-of-Arrays layout for cache-friendly traversal: all
//! vector data lives in one contiguous arena, with parallel arrays for
//! neighbor lists and layer assignments. Neighbor lists hold `u32` node ids,
//! never references, so following an edge is an array indexing.

/// Distance contract and the default squared Euclidean metric.
pub mod distance;
/// Graph storage, configuration, and the random level draw.
pub mod graph;
/// Binary heaps over `(distance, id)` pairs and the per-thread scratch pool.
pub mod heap;
/// Insertion: two-phase descent, bidirectional linking, re-rank pruning.
pub mod insert;
/// Traversal: greedy single-best walk, bounded beam search, multi-layer KNN.
pub mod search;
/// Epoch-stamped visited set for duplicate suppression during traversal.
pub mod visited;

pub use distance::{euclidean_sq, DistanceFn};
pub use graph::{Config, HnswGraph};
pub use search::knn_search;
