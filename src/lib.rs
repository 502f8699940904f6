//! # smallworld
//!
//! Embeddable in-memory Hierarchical Navigable Small World (HNSW) index for
//! approximate nearest neighbor search over fixed-dimension `f32` vectors.
//!
//! The index is append-only: points are inserted one at a time under a write
//! lock and queried concurrently under read locks. Distances are computed by a
//! caller-provided function (squared Euclidean by default); results carry the
//! caller id, the stored vector, and the distance as computed.
//!
//! ```
//! use smallworld::Index;
//!
//! let index = Index::with_defaults();
//! index.insert(&[1.0, 2.0], 0).unwrap();
//! index.insert(&[4.0, 6.0], 1).unwrap();
//! let hits = index.knn_search(&[1.0, 2.1], 1, 10).unwrap();
//! assert_eq!(hits[0].id, 0);
//! ```

/// Default tuning constants: connectivity targets, beam widths, level caps.
pub mod config;
/// Error taxonomy for configuration, insertion, and search.
pub mod error;
/// HNSW graph engine: storage, traversal, insertion, and the distance contract.
pub mod hnsw;
/// Thread-safe index handle and the search result record.
pub mod index;

pub use error::{Error, Result};
pub use hnsw::distance::{euclidean_sq, DistanceFn};
pub use hnsw::graph::{Config, HnswGraph};
pub use index::{Index, Neighbor};
